//! Error types shared by the Vault secret loader.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`VaultError`] failures.
pub type VaultResult<T> = Result<T, VaultError>;

/// Failures that can occur while reading secrets from Vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// `VAULT_ADDR` is set but no way to authenticate was provided.
    #[error("Vault credentials not provided (VAULT_TOKEN or VAULT_ROLE_ID/VAULT_SECRET_ID)")]
    MissingCredentials,
    /// The binary was built without Vault support.
    #[error("VAULT_ADDR is set but Vault support is disabled; rebuild with the `vault` feature")]
    FeatureDisabled,
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Vault client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent to Vault.
    #[error("failed to send Vault request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Vault answered with an unexpected status code.
    #[error("unexpected Vault response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be decoded.
    #[error("failed to decode Vault response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}
