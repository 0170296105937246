//! Settings resolution: environment variables first, with HashiCorp Vault filling the gaps.

use std::{collections::HashMap, env, path::PathBuf};

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, info};

use crate::vault::VaultError;

/// Snapshot of environment-style key/value pairs.
pub type EnvMap = HashMap<String, String>;

/// Port the HTTPS UI listens on when `UI_PORT` is not set.
pub const DEFAULT_UI_PORT: u16 = 8443;

const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
const CACHE_URL: &str = "CACHE_URL";

/// Failures raised while resolving [`Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither the environment nor Vault provided an OpenRouter key.
    #[error("OPENROUTER_API_KEY is not set in environment or Vault")]
    MissingApiKey,
    /// `UI_PORT` could not be parsed as a TCP port.
    #[error("invalid UI_PORT value `{value}`")]
    InvalidPort { value: String },
    /// Reading secrets from Vault failed.
    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Key for the OpenRouter API.
    pub openrouter_api_key: String,
    /// Redis URL, when a shared cache is configured.
    pub cache_url: Option<String>,
    /// Key the UI expects from clients.
    pub ui_api_key: Option<String>,
    /// PEM certificate served by the UI.
    pub ui_tls_cert: Option<PathBuf>,
    /// PEM private key matching `ui_tls_cert`.
    pub ui_tls_key: Option<PathBuf>,
    /// Directory for router checkpoints.
    pub router_checkpoint_dir: Option<PathBuf>,
    /// Bucket for router checkpoints; takes precedence over the directory when set.
    pub checkpoint_s3_bucket: Option<String>,
    /// Key prefix inside `checkpoint_s3_bucket`.
    pub checkpoint_s3_prefix: Option<String>,
    /// HTTPS port of the UI.
    pub ui_port: u16,
}

/// Explicit values that take precedence over anything found in the environment or Vault.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// OpenRouter key.
    pub api_key: Option<String>,
    /// Redis URL.
    pub cache_url: Option<String>,
}

/// Source of secrets merged underneath the environment.
pub trait SecretLoader: Send + Sync {
    /// Fetch secrets using the connection details found in `env`.
    fn load<'a>(&'a self, env: &'a EnvMap) -> BoxFuture<'a, Result<EnvMap, ConfigError>>;
}

/// Loader that never yields secrets; used when Vault is intentionally bypassed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecrets;

impl SecretLoader for NoSecrets {
    fn load<'a>(&'a self, _env: &'a EnvMap) -> BoxFuture<'a, Result<EnvMap, ConfigError>> {
        Box::pin(async { Ok(EnvMap::new()) })
    }
}

/// Capture the process environment, dropping empty values.
pub fn env_snapshot() -> EnvMap {
    env::vars().filter(|(_, value)| !value.is_empty()).collect()
}

/// Build a Redis URL from its individual parts when `CACHE_URL` is not provided.
///
/// A password is mandatory; without one no URL is produced.
pub fn build_cache_url(source: &EnvMap) -> Option<String> {
    if let Some(url) = non_empty(source, CACHE_URL) {
        return Some(url.to_owned());
    }

    let password = non_empty(source, "REDIS_PASSWORD")?;
    let username = non_empty(source, "REDIS_USERNAME").unwrap_or("default");
    let host = non_empty(source, "REDIS_HOST").unwrap_or("cache");
    let port = non_empty(source, "REDIS_PORT").unwrap_or("6379");
    let db = non_empty(source, "REDIS_DB").unwrap_or("0");

    Some(format!("redis://{username}:{password}@{host}:{port}/{db}"))
}

/// Resolve [`Settings`] from `env`, overlaying Vault secrets underneath it.
///
/// Precedence, highest first: `overrides`, `env`, secrets returned by `loader`.
pub async fn load_settings(
    overrides: SettingsOverrides,
    env: &EnvMap,
    loader: &dyn SecretLoader,
) -> Result<Settings, ConfigError> {
    let mut source: EnvMap = env
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if let Some(api_key) = overrides.api_key {
        source.insert(OPENROUTER_API_KEY.into(), api_key);
    }
    if let Some(cache_url) = overrides.cache_url {
        source.insert(CACHE_URL.into(), cache_url);
    }

    let secrets = loader.load(&source).await?;
    if !secrets.is_empty() {
        info!(count = secrets.len(), "loaded secrets from Vault");
    }

    let mut merged = secrets;
    merged.extend(source);

    let openrouter_api_key = non_empty(&merged, OPENROUTER_API_KEY)
        .ok_or(ConfigError::MissingApiKey)?
        .to_owned();
    let cache_url = build_cache_url(&merged);
    let ui_api_key = non_empty(&merged, "UI_API_KEY")
        .or_else(|| non_empty(&merged, "API_KEY"))
        .map(str::to_owned);
    let ui_port = match non_empty(&merged, "UI_PORT") {
        Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidPort {
            value: value.to_owned(),
        })?,
        None => DEFAULT_UI_PORT,
    };

    debug!(cache = cache_url.is_some(), "settings resolved");

    Ok(Settings {
        openrouter_api_key,
        cache_url,
        ui_api_key,
        ui_tls_cert: non_empty(&merged, "UI_TLS_CERT").map(PathBuf::from),
        ui_tls_key: non_empty(&merged, "UI_TLS_KEY").map(PathBuf::from),
        router_checkpoint_dir: non_empty(&merged, "ROUTER_CHECKPOINT_DIR").map(PathBuf::from),
        checkpoint_s3_bucket: non_empty(&merged, "CHECKPOINT_S3_BUCKET").map(str::to_owned),
        checkpoint_s3_prefix: non_empty(&merged, "CHECKPOINT_S3_PREFIX").map(str::to_owned),
        ui_port,
    })
}

fn non_empty<'a>(source: &'a EnvMap, key: &str) -> Option<&'a str> {
    source
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
