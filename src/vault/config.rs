use crate::config::EnvMap;

use super::error::{VaultError, VaultResult};

const DEFAULT_SECRET_PATH: &str = "dragonscales";
const DEFAULT_KV_MOUNT: &str = "secret";

/// How the loader authenticates against Vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultAuth {
    /// Pre-issued client token.
    Token(String),
    /// AppRole credential pair exchanged for a token at login.
    AppRole { role_id: String, secret_id: String },
}

/// Runtime configuration describing where the KV v2 secret lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Server address, e.g. `http://vault:8200`.
    pub addr: String,
    /// Credentials used to obtain a token.
    pub auth: VaultAuth,
    /// KV v2 mount point.
    pub mount: String,
    /// Secret path inside the mount.
    pub path: String,
}

impl VaultConfig {
    /// Build a configuration from environment-style variables.
    ///
    /// Returns `Ok(None)` when `VAULT_ADDR` is absent, meaning Vault is not in use.
    pub fn from_env(env: &EnvMap) -> VaultResult<Option<Self>> {
        let Some(addr) = get(env, "VAULT_ADDR") else {
            return Ok(None);
        };

        let auth = match (
            get(env, "VAULT_TOKEN"),
            get(env, "VAULT_ROLE_ID"),
            get(env, "VAULT_SECRET_ID"),
        ) {
            (Some(token), _, _) => VaultAuth::Token(token.to_owned()),
            (None, Some(role_id), Some(secret_id)) => VaultAuth::AppRole {
                role_id: role_id.to_owned(),
                secret_id: secret_id.to_owned(),
            },
            _ => return Err(VaultError::MissingCredentials),
        };

        Ok(Some(Self {
            addr: addr.trim_end_matches('/').to_owned(),
            auth,
            mount: get(env, "VAULT_KV_MOUNT")
                .unwrap_or(DEFAULT_KV_MOUNT)
                .to_owned(),
            path: get(env, "VAULT_SECRET_PATH")
                .unwrap_or(DEFAULT_SECRET_PATH)
                .to_owned(),
        }))
    }
}

fn get<'a>(env: &'a EnvMap, key: &str) -> Option<&'a str> {
    env.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn absent_addr_disables_vault() {
        assert_eq!(VaultConfig::from_env(&EnvMap::new()).unwrap(), None);
    }

    #[test]
    fn token_wins_over_approle() {
        let config = VaultConfig::from_env(&env(&[
            ("VAULT_ADDR", "http://vault:8200/"),
            ("VAULT_TOKEN", "t"),
            ("VAULT_ROLE_ID", "r"),
            ("VAULT_SECRET_ID", "s"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(config.addr, "http://vault:8200");
        assert_eq!(config.auth, VaultAuth::Token("t".into()));
        assert_eq!(config.mount, "secret");
        assert_eq!(config.path, "dragonscales");
    }

    #[test]
    fn approle_needs_both_ids() {
        let err = VaultConfig::from_env(&env(&[
            ("VAULT_ADDR", "http://vault:8200"),
            ("VAULT_ROLE_ID", "r"),
        ]))
        .unwrap_err();
        assert!(matches!(err, VaultError::MissingCredentials));
    }

    #[test]
    fn custom_mount_and_path() {
        let config = VaultConfig::from_env(&env(&[
            ("VAULT_ADDR", "http://vault:8200"),
            ("VAULT_ROLE_ID", "r"),
            ("VAULT_SECRET_ID", "s"),
            ("VAULT_KV_MOUNT", "kv"),
            ("VAULT_SECRET_PATH", "apps/dragon"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(
            config.auth,
            VaultAuth::AppRole {
                role_id: "r".into(),
                secret_id: "s".into()
            }
        );
        assert_eq!(config.mount, "kv");
        assert_eq!(config.path, "apps/dragon");
    }
}
