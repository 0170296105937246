use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use super::{CacheBackend, CacheError, CacheResult};

/// The handful of Redis commands [`RedisCache`] relies on.
pub trait RedisConnection: Send + Sync {
    /// `GET key`.
    fn get_raw<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<Vec<u8>>>>;
    /// `SET key payload`.
    fn set_raw<'a>(&'a self, key: &'a str, payload: Vec<u8>) -> BoxFuture<'a, CacheResult<()>>;
    /// `SETEX key ttl payload`.
    fn set_raw_ex<'a>(
        &'a self,
        key: &'a str,
        payload: Vec<u8>,
        ttl_seconds: u64,
    ) -> BoxFuture<'a, CacheResult<()>>;
}

/// Redis-backed cache storing values as JSON documents.
pub struct RedisCache<C> {
    connection: C,
}

impl<C: RedisConnection> RedisCache<C> {
    /// Wrap an established connection.
    pub fn new(connection: C) -> Self {
        Self { connection }
    }

    /// Underlying connection handle.
    pub fn connection(&self) -> &C {
        &self.connection
    }
}

impl<C: RedisConnection> CacheBackend for RedisCache<C> {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<Value>>> {
        Box::pin(async move {
            let Some(raw) = self.connection.get_raw(key).await? else {
                return Ok(None);
            };
            match serde_json::from_slice::<Value>(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    debug!(key, error = %err, "ignoring undecodable cache payload");
                    Ok(None)
                }
            }
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: Value,
        ttl_seconds: Option<u64>,
    ) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async move {
            let payload = serde_json::to_vec(&value).map_err(|source| CacheError::Encode {
                key: key.to_owned(),
                source,
            })?;
            match ttl_seconds {
                Some(ttl) if ttl > 0 => self.connection.set_raw_ex(key, payload, ttl).await,
                _ => self.connection.set_raw(key, payload).await,
            }
        })
    }
}

#[cfg(feature = "cache")]
mod connection_manager {
    use futures::future::BoxFuture;
    use redis::{AsyncCommands, aio::ConnectionManager};

    use super::RedisConnection;
    use crate::cache::{CacheError, CacheResult};

    impl RedisConnection for ConnectionManager {
        fn get_raw<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<Vec<u8>>>> {
            let mut conn = self.clone();
            Box::pin(async move {
                conn.get::<_, Option<Vec<u8>>>(key)
                    .await
                    .map_err(|err| CacheError::command(key, err))
            })
        }

        fn set_raw<'a>(
            &'a self,
            key: &'a str,
            payload: Vec<u8>,
        ) -> BoxFuture<'a, CacheResult<()>> {
            let mut conn = self.clone();
            Box::pin(async move {
                conn.set::<_, _, ()>(key, payload)
                    .await
                    .map_err(|err| CacheError::command(key, err))
            })
        }

        fn set_raw_ex<'a>(
            &'a self,
            key: &'a str,
            payload: Vec<u8>,
            ttl_seconds: u64,
        ) -> BoxFuture<'a, CacheResult<()>> {
            let mut conn = self.clone();
            Box::pin(async move {
                conn.set_ex::<_, _, ()>(key, payload, ttl_seconds)
                    .await
                    .map_err(|err| CacheError::command(key, err))
            })
        }
    }
}

/// Connect to Redis and wrap the connection in a [`RedisCache`].
#[cfg(feature = "cache")]
pub async fn redis_cache_from_url(
    url: &str,
) -> CacheResult<RedisCache<redis::aio::ConnectionManager>> {
    let client = redis::Client::open(url).map_err(|source| CacheError::Connect {
        message: "invalid Redis URL".into(),
        source: Box::new(source),
    })?;
    let manager = client
        .get_connection_manager()
        .await
        .map_err(|source| CacheError::Connect {
            message: "Redis connection failed".into(),
            source: Box::new(source),
        })?;
    Ok(RedisCache::new(manager))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct FakeRedis {
        store: Mutex<HashMap<String, Vec<u8>>>,
        setex_calls: Mutex<Vec<(String, u64)>>,
    }

    impl RedisConnection for FakeRedis {
        fn get_raw<'a>(&'a self, key: &'a str) -> BoxFuture<'a, CacheResult<Option<Vec<u8>>>> {
            Box::pin(async move { Ok(self.store.lock().unwrap().get(key).cloned()) })
        }

        fn set_raw<'a>(
            &'a self,
            key: &'a str,
            payload: Vec<u8>,
        ) -> BoxFuture<'a, CacheResult<()>> {
            Box::pin(async move {
                self.store.lock().unwrap().insert(key.to_owned(), payload);
                Ok(())
            })
        }

        fn set_raw_ex<'a>(
            &'a self,
            key: &'a str,
            payload: Vec<u8>,
            ttl_seconds: u64,
        ) -> BoxFuture<'a, CacheResult<()>> {
            Box::pin(async move {
                self.setex_calls
                    .lock()
                    .unwrap()
                    .push((key.to_owned(), ttl_seconds));
                self.store.lock().unwrap().insert(key.to_owned(), payload);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn stores_json_with_expiry() {
        let cache = RedisCache::new(FakeRedis::default());
        let payload = json!({"a": 1});

        assert_eq!(cache.get("missing").await.unwrap(), None);
        cache.set("key", payload.clone(), Some(10)).await.unwrap();

        assert_eq!(cache.get("key").await.unwrap(), Some(payload));
        assert_eq!(
            cache.connection().setex_calls.lock().unwrap()[0],
            ("key".to_string(), 10)
        );
    }

    #[tokio::test]
    async fn undecodable_payload_reads_as_missing() {
        let cache = RedisCache::new(FakeRedis::default());
        cache
            .connection()
            .store
            .lock()
            .unwrap()
            .insert("bad".into(), b"not-a-json".to_vec());

        assert_eq!(cache.get("bad").await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_or_missing_ttl_uses_plain_set() {
        let cache = RedisCache::new(FakeRedis::default());
        cache.set("plain", json!("value"), None).await.unwrap();
        cache.set("zero", json!("value"), Some(0)).await.unwrap();

        let conn = cache.connection();
        assert!(conn.setex_calls.lock().unwrap().is_empty());
        assert_eq!(
            conn.store.lock().unwrap().get("plain").map(Vec::as_slice),
            Some(br#""value""#.as_slice())
        );
        assert!(conn.store.lock().unwrap().contains_key("zero"));
    }
}
