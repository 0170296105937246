use std::{
    error::Error,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use futures::future::BoxFuture;
use thiserror::Error;

/// Result alias for checkpoint storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by checkpoint backends regardless of where checkpoints live.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("checkpoint storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Byte-oriented storage for router checkpoints.
pub trait CheckpointStorage: Send + Sync {
    /// Replace the object stored under `key`.
    fn save<'a>(&'a self, key: &'a str, data: Vec<u8>) -> BoxFuture<'a, StorageResult<()>>;
    /// Read the object stored under `key`, `None` when absent.
    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<Option<Vec<u8>>>>;
}

/// Stores checkpoints as files below a base directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
}

impl LocalFileStorage {
    /// Use `base_dir`, creating it when missing.
    pub fn new(base_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir).map_err(|err| {
            StorageError::unavailable(format!("cannot create {}", base_dir.display()), err)
        })?;
        Ok(Self { base_dir })
    }

    /// Directory checkpoints are written to.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl CheckpointStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, data: Vec<u8>) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            let path = self.base_dir.join(key);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|err| {
                    StorageError::unavailable(format!("cannot create {}", parent.display()), err)
                })?;
            }
            tokio::fs::write(&path, data).await.map_err(|err| {
                StorageError::unavailable(format!("cannot write {}", path.display()), err)
            })
        })
    }

    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<Option<Vec<u8>>>> {
        Box::pin(async move {
            let path = self.base_dir.join(key);
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(StorageError::unavailable(
                    format!("cannot read {}", path.display()),
                    err,
                )),
            }
        })
    }
}
