//! Key/value caches used to share the free-model listing between processes.

mod error;
mod memory;
mod redis_cache;

use futures::future::BoxFuture;
use serde_json::Value;

pub use error::{CacheError, CacheResult};
pub use memory::InMemoryCache;
#[cfg(feature = "cache")]
pub use redis_cache::redis_cache_from_url;
pub use redis_cache::{RedisCache, RedisConnection};

/// Minimal cache interface storing JSON values with an optional TTL in seconds.
pub trait CacheBackend: Send + Sync {
    /// Fetch a live value, `None` when missing, expired or undecodable.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<Value>>>;
    /// Store a value; `ttl_seconds = None` keeps it until overwritten.
    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Value,
        ttl_seconds: Option<u64>,
    ) -> BoxFuture<'a, CacheResult<()>>;
}
