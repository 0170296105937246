use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::{ConfigError, EnvMap, SecretLoader};

use super::{
    config::{VaultAuth, VaultConfig},
    error::{VaultError, VaultResult},
};

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Authenticated handle to a Vault server.
#[derive(Clone)]
pub struct VaultClient {
    client: Client,
    addr: Arc<str>,
    token: Arc<str>,
}

#[derive(Serialize)]
struct AppRoleLogin<'a> {
    role_id: &'a str,
    secret_id: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct KvReadResponse {
    #[serde(default)]
    data: Option<KvData>,
}

#[derive(Deserialize)]
struct KvData {
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

impl VaultClient {
    /// Authenticate against Vault, exchanging AppRole credentials for a token when needed.
    pub async fn connect(addr: &str, auth: &VaultAuth) -> VaultResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| VaultError::ClientBuilder { source })?;
        let addr = Arc::<str>::from(addr.trim_end_matches('/'));

        let token = match auth {
            VaultAuth::Token(token) => Arc::<str>::from(token.as_str()),
            VaultAuth::AppRole { role_id, secret_id } => {
                let token = login_approle(&client, &addr, role_id, secret_id).await?;
                info!("authenticated to Vault with AppRole");
                Arc::<str>::from(token)
            }
        };

        Ok(Self {
            client,
            addr,
            token,
        })
    }

    /// Read the latest version of a KV v2 secret, stringifying every value.
    pub async fn read_kv2(&self, mount: &str, path: &str) -> VaultResult<EnvMap> {
        let api_path = format!("v1/{}/data/{}", mount.trim_matches('/'), path.trim_matches('/'));
        let url = format!("{}/{}", self.addr, api_path);

        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, self.token.as_ref())
            .send()
            .await
            .map_err(|source| VaultError::RequestSend {
                path: api_path.clone(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(VaultError::RequestStatus {
                path: api_path,
                status: response.status(),
            });
        }

        let body = response
            .json::<KvReadResponse>()
            .await
            .map_err(|source| VaultError::DecodeResponse {
                path: api_path.clone(),
                source,
            })?;

        let values = body.data.and_then(|data| data.data).unwrap_or_default();
        debug!(path = %api_path, count = values.len(), "read Vault secret");
        Ok(values
            .into_iter()
            .map(|(key, value)| (key, stringify(value)))
            .collect())
    }
}

async fn login_approle(
    client: &Client,
    addr: &str,
    role_id: &str,
    secret_id: &str,
) -> VaultResult<String> {
    let path = "v1/auth/approle/login".to_string();
    let response = client
        .post(format!("{addr}/{path}"))
        .json(&AppRoleLogin { role_id, secret_id })
        .send()
        .await
        .map_err(|source| VaultError::RequestSend {
            path: path.clone(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(VaultError::RequestStatus {
            path,
            status: response.status(),
        });
    }

    response
        .json::<LoginResponse>()
        .await
        .map(|login| login.auth.client_token)
        .map_err(|source| VaultError::DecodeResponse { path, source })
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Read secrets from the Vault instance described by the environment.
///
/// Yields an empty map when `VAULT_ADDR` is not configured.
pub async fn load_vault_secrets(env: &EnvMap) -> VaultResult<EnvMap> {
    let Some(config) = VaultConfig::from_env(env)? else {
        return Ok(EnvMap::new());
    };

    let client = VaultClient::connect(&config.addr, &config.auth).await?;
    client.read_kv2(&config.mount, &config.path).await
}

/// [`SecretLoader`] backed by [`load_vault_secrets`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VaultSecretLoader;

impl SecretLoader for VaultSecretLoader {
    fn load<'a>(&'a self, env: &'a EnvMap) -> BoxFuture<'a, Result<EnvMap, ConfigError>> {
        Box::pin(async move { Ok(load_vault_secrets(env).await?) })
    }
}
