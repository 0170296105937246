//! Wiring shared by the binaries: settings, the Dragon and router checkpoint storage.

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;
use tracing::info;

use crate::{
    cache::CacheError,
    config::{self, ConfigError, Settings, SettingsOverrides},
    dragon::Dragon,
    openrouter::{OpenRouterClient, OpenRouterError},
    router::{CheckpointStorage, LocalFileStorage, StorageError},
    vault,
};

/// Directory used for router checkpoints when `ROUTER_CHECKPOINT_DIR` is unset.
pub const DEFAULT_CHECKPOINT_DIR: &str = ".router-state";

/// Startup failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Settings could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The OpenRouter client could not be built.
    #[error(transparent)]
    OpenRouter(#[from] OpenRouterError),
    /// The shared cache could not be reached.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// The checkpoint directory could not be prepared.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// `CHECKPOINT_S3_BUCKET` is set but the binary was built without S3 support.
    #[error("CHECKPOINT_S3_BUCKET is set but S3 support is disabled; rebuild with the `s3` feature")]
    S3Disabled,
}

/// Resolve settings from the process environment and the feature-selected secret loader.
pub async fn load_settings_from_env(
    overrides: SettingsOverrides,
) -> Result<Settings, BootstrapError> {
    let env = config::env_snapshot();
    let loader = vault::default_secret_loader();
    Ok(config::load_settings(overrides, &env, loader.as_ref()).await?)
}

/// Build the [`Dragon`], attaching the shared cache when one is configured.
pub async fn build_dragon(settings: &Settings) -> Result<Dragon, BootstrapError> {
    let client = OpenRouterClient::new(settings.openrouter_api_key.clone())?;
    let dragon = Dragon::new(Arc::new(client));

    let Some(url) = settings.cache_url.as_deref() else {
        return Ok(dragon);
    };
    connect_cache(dragon, url).await
}

#[cfg(feature = "cache")]
async fn connect_cache(dragon: Dragon, url: &str) -> Result<Dragon, BootstrapError> {
    let cache = crate::cache::redis_cache_from_url(url).await?;
    info!("connected to shared cache");
    Ok(dragon.with_cache(Arc::new(cache)))
}

#[cfg(not(feature = "cache"))]
async fn connect_cache(_dragon: Dragon, _url: &str) -> Result<Dragon, BootstrapError> {
    Err(CacheError::FeatureDisabled.into())
}

/// Pick the checkpoint backend: S3 when a bucket is configured, the local directory otherwise.
pub async fn checkpoint_storage(
    settings: &Settings,
) -> Result<Arc<dyn CheckpointStorage>, BootstrapError> {
    if let Some(bucket) = settings.checkpoint_s3_bucket.as_deref() {
        return s3_storage(bucket, settings.checkpoint_s3_prefix.as_deref().unwrap_or("")).await;
    }

    let dir = settings
        .router_checkpoint_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKPOINT_DIR));
    info!(dir = %dir.display(), "using local router checkpoints");
    Ok(Arc::new(LocalFileStorage::new(dir)?))
}

#[cfg(feature = "s3")]
async fn s3_storage(
    bucket: &str,
    prefix: &str,
) -> Result<Arc<dyn CheckpointStorage>, BootstrapError> {
    info!(bucket, prefix, "using S3 router checkpoints");
    Ok(Arc::new(crate::router::S3Storage::from_env(bucket, prefix).await))
}

#[cfg(not(feature = "s3"))]
async fn s3_storage(
    _bucket: &str,
    _prefix: &str,
) -> Result<Arc<dyn CheckpointStorage>, BootstrapError> {
    Err(BootstrapError::S3Disabled)
}
