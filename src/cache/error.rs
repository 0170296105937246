use std::error::Error;

use thiserror::Error;

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Error raised by cache backends regardless of the underlying store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A cache URL was configured but the binary lacks Redis support.
    #[error("a cache URL is configured but Redis support is disabled; rebuild with the `cache` feature")]
    FeatureDisabled,
    /// Connecting to the cache failed.
    #[error("failed to connect to cache: {message}")]
    Connect {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A command against the cache failed.
    #[error("cache command failed for `{key}`")]
    Command {
        key: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The value could not be serialised to JSON.
    #[error("failed to encode cache value for `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    /// Wrap a backend failure for `key`.
    pub fn command(key: &str, source: impl Error + Send + Sync + 'static) -> Self {
        CacheError::Command {
            key: key.to_owned(),
            source: Box::new(source),
        }
    }
}
