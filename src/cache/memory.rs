use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;

use super::{CacheBackend, CacheResult};

struct Entry {
    expires_at: Option<Instant>,
    value: Value,
}

/// Process-local cache with per-key TTL.
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Entry>,
}

impl InMemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.expires_at.is_none_or(|at| at > now) {
                return Some(entry.value.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| entry.expires_at.is_some_and(|at| at <= now));
        None
    }

    /// A TTL too large to represent as an [`Instant`] never expires.
    fn store(&self, key: &str, value: Value, ttl_seconds: Option<u64>) {
        let expires_at =
            ttl_seconds.and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));
        self.entries
            .insert(key.to_owned(), Entry { expires_at, value });
    }
}

impl CacheBackend for InMemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<Value>>> {
        Box::pin(async move { Ok(self.lookup(key)) })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Value,
        ttl_seconds: Option<u64>,
    ) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            self.store(key, value, ttl_seconds);
            Ok(())
        })
    }
}
