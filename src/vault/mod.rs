//! HashiCorp Vault KV v2 secret loading (token or AppRole authentication).

#[cfg(feature = "vault")]
mod client;
mod config;
mod error;

use futures::future::BoxFuture;

use crate::config::{ConfigError, EnvMap, SecretLoader};

#[cfg(feature = "vault")]
pub use client::{VaultClient, VaultSecretLoader, load_vault_secrets};
pub use config::{VaultAuth, VaultConfig};
pub use error::{VaultError, VaultResult};

/// Loader used in builds without the `vault` feature: refuses to silently ignore `VAULT_ADDR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VaultDisabled;

impl SecretLoader for VaultDisabled {
    fn load<'a>(&'a self, env: &'a EnvMap) -> BoxFuture<'a, Result<EnvMap, ConfigError>> {
        Box::pin(async move {
            if env.get("VAULT_ADDR").is_some_and(|addr| !addr.is_empty()) {
                return Err(VaultError::FeatureDisabled.into());
            }
            Ok(EnvMap::new())
        })
    }
}

/// Secret loader matching the enabled feature set.
pub fn default_secret_loader() -> Box<dyn SecretLoader> {
    #[cfg(feature = "vault")]
    {
        Box::new(VaultSecretLoader)
    }
    #[cfg(not(feature = "vault"))]
    {
        Box::new(VaultDisabled)
    }
}
