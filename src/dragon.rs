//! The Dragon keeps the list of free OpenRouter models fresh, backed by an optional shared cache.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    cache::CacheBackend,
    openrouter::{Model, ModelProvider, OpenRouterError},
};

/// How long a fetched listing stays valid.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
/// Key the listing is stored under in the shared cache.
pub const DEFAULT_CACHE_KEY: &str = "dragon:free_models";

/// Time source, swappable so TTL behaviour can be driven deterministically.
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Failures while refreshing the free-model listing.
#[derive(Debug, Error)]
pub enum DragonError {
    /// The provider could not list its models.
    #[error("failed to list models")]
    Provider(#[from] OpenRouterError),
}

struct Snapshot {
    models: Arc<Vec<Model>>,
    refreshed_at: Instant,
}

/// Caches the free model listing with a refresh TTL.
pub struct Dragon {
    provider: Arc<dyn ModelProvider>,
    ttl: Duration,
    cache: Option<Arc<dyn CacheBackend>>,
    cache_key: String,
    snapshot: Mutex<Option<Snapshot>>,
    clock: Clock,
}

impl Dragon {
    /// Dragon with the default TTL and no shared cache.
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            ttl: DEFAULT_TTL,
            cache: None,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            snapshot: Mutex::new(None),
            clock: Arc::new(Instant::now),
        }
    }

    /// Override the refresh TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Share listings through `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn CacheBackend>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the shared cache key.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Provider the listing is fetched from.
    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Shared cache, if any.
    pub fn cache(&self) -> Option<&Arc<dyn CacheBackend>> {
        self.cache.as_ref()
    }

    /// How long a fetched listing is reused.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the free models, fetching them when the cached copy is stale or `force` is set.
    ///
    /// The shared cache is consulted before the in-memory copy; a hit there is adopted as the
    /// new in-memory listing. The snapshot lock is held across the upstream fetch, so concurrent
    /// callers wait for one request instead of each hitting the provider.
    pub async fn refresh_models(&self, force: bool) -> Result<Arc<Vec<Model>>, DragonError> {
        let now = (self.clock)();
        let mut snapshot = self.snapshot.lock().await;

        if !force {
            if let Some(models) = self.cached_models(&mut snapshot, now).await {
                return Ok(models);
            }
        }

        let models = Arc::new(self.fetch_free_models().await?);
        *snapshot = Some(Snapshot {
            models: Arc::clone(&models),
            refreshed_at: now,
        });
        drop(snapshot);

        self.write_cache(&models).await;
        Ok(models)
    }

    async fn fetch_free_models(&self) -> Result<Vec<Model>, DragonError> {
        let models = self.provider.list_models().await?;
        let total = models.len();
        let free: Vec<Model> = models.into_iter().filter(Model::is_free).collect();
        info!(total, free = free.len(), "refreshed free model listing");
        Ok(free)
    }

    async fn cached_models(
        &self,
        snapshot: &mut Option<Snapshot>,
        now: Instant,
    ) -> Option<Arc<Vec<Model>>> {
        if let Some(cache) = &self.cache {
            match cache.get(&self.cache_key).await {
                Ok(Some(value)) => match serde_json::from_value::<Vec<Model>>(value) {
                    Ok(models) => {
                        debug!(key = %self.cache_key, "using shared cache listing");
                        let models = Arc::new(models);
                        *snapshot = Some(Snapshot {
                            models: Arc::clone(&models),
                            refreshed_at: now,
                        });
                        return Some(models);
                    }
                    Err(err) => {
                        warn!(key = %self.cache_key, error = %err, "ignoring malformed cached listing")
                    }
                },
                Ok(None) => {}
                Err(err) => warn!(key = %self.cache_key, error = %err, "cache read failed"),
            }
        }

        snapshot
            .as_ref()
            .filter(|snap| now.saturating_duration_since(snap.refreshed_at) < self.ttl)
            .map(|snap| Arc::clone(&snap.models))
    }

    async fn write_cache(&self, models: &[Model]) {
        let Some(cache) = &self.cache else {
            return;
        };
        let value = match serde_json::to_value(models) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to encode model listing for cache");
                return;
            }
        };
        if let Err(err) = cache
            .set(&self.cache_key, value, Some(self.ttl.as_secs()))
            .await
        {
            warn!(key = %self.cache_key, error = %err, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex as StdMutex,
        atomic::{AtomicUsize, Ordering},
    };

    use futures::future::BoxFuture;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        cache::{CacheResult, InMemoryCache},
        openrouter::OpenRouterResult,
    };

    struct FakeProvider {
        models: Vec<Model>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(models: Vec<Model>) -> Arc<Self> {
            Arc::new(Self {
                models,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ModelProvider for FakeProvider {
        fn list_models(&self) -> BoxFuture<'_, OpenRouterResult<Vec<Model>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let models = self.models.clone();
            Box::pin(async move { Ok(models) })
        }

        fn chat<'a>(
            &'a self,
            _model: &'a str,
            _message: &'a str,
        ) -> BoxFuture<'a, OpenRouterResult<String>> {
            Box::pin(async { Ok(String::new()) })
        }
    }

    #[derive(Default)]
    struct RecordingCache {
        set_calls: StdMutex<Vec<(String, Value, Option<u64>)>>,
    }

    impl CacheBackend for RecordingCache {
        fn get<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, CacheResult<Option<Value>>> {
            Box::pin(async { Ok(None) })
        }

        fn set<'a>(
            &'a self,
            key: &'a str,
            value: Value,
            ttl_seconds: Option<u64>,
        ) -> BoxFuture<'a, CacheResult<()>> {
            self.set_calls
                .lock()
                .unwrap()
                .push((key.to_owned(), value, ttl_seconds));
            Box::pin(async { Ok(()) })
        }
    }

    fn free() -> Model {
        Model::with_id("free/model").priced(json!(0), json!(0))
    }

    fn paid() -> Model {
        Model::with_id("paid/model").priced(json!(0.001), json!(0))
    }

    fn manual_clock(start: Instant) -> (Clock, Arc<StdMutex<Instant>>) {
        let now = Arc::new(StdMutex::new(start));
        let handle = Arc::clone(&now);
        let clock: Clock = Arc::new(move || *handle.lock().unwrap());
        (clock, now)
    }

    #[tokio::test]
    async fn listing_is_reused_within_ttl() {
        let provider = FakeProvider::new(vec![free(), paid()]);
        let start = Instant::now();
        let (clock, now) = manual_clock(start);
        let dragon = Dragon::new(provider.clone())
            .with_ttl(Duration::from_secs(3600))
            .with_clock(clock);

        let first = dragon.refresh_models(false).await.unwrap();
        *now.lock().unwrap() = start + Duration::from_secs(30 * 60);
        let second = dragon.refresh_models(false).await.unwrap();
        *now.lock().unwrap() = start + Duration::from_secs(2 * 3600);
        let third = dragon.refresh_models(false).await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(first.len(), 1);
        assert_eq!(third.len(), 1);
    }

    #[tokio::test]
    async fn force_always_fetches() {
        let provider = FakeProvider::new(vec![free()]);
        let dragon = Dragon::new(provider.clone());

        dragon.refresh_models(false).await.unwrap();
        dragon.refresh_models(true).await.unwrap();

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn shared_cache_is_read_first() {
        let provider = FakeProvider::new(vec![free()]);
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set(DEFAULT_CACHE_KEY, json!([{"id": "cached"}]), Some(3600))
            .await
            .unwrap();
        let dragon = Dragon::new(provider.clone()).with_cache(cache);

        let models = dragon.refresh_models(false).await.unwrap();

        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id.as_deref(), Some("cached"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn fetched_listing_is_written_with_ttl() {
        let provider = FakeProvider::new(vec![free()]);
        let cache = Arc::new(RecordingCache::default());
        let dragon = Dragon::new(provider)
            .with_ttl(Duration::from_secs(5))
            .with_cache(cache.clone());

        let models = dragon.refresh_models(true).await.unwrap();

        assert_eq!(models.as_slice(), &[free()]);
        let calls = cache.set_calls.lock().unwrap();
        assert_eq!(calls[0].0, DEFAULT_CACHE_KEY);
        assert_eq!(calls[0].1, serde_json::to_value(vec![free()]).unwrap());
        assert_eq!(calls[0].2, Some(5));
    }

    #[tokio::test]
    async fn malformed_cache_entry_falls_back_to_provider() {
        let provider = FakeProvider::new(vec![free()]);
        let cache = Arc::new(InMemoryCache::new());
        cache
            .set(DEFAULT_CACHE_KEY, json!({"not": "a list"}), None)
            .await
            .unwrap();
        let dragon = Dragon::new(provider.clone()).with_cache(cache);

        let models = dragon.refresh_models(false).await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(models.len(), 1);
    }

    #[tokio::test]
    async fn unbounded_ttl_is_written_to_memory_cache() {
        let provider = FakeProvider::new(vec![free()]);
        let cache = Arc::new(InMemoryCache::new());
        let dragon = Dragon::new(provider.clone())
            .with_ttl(Duration::MAX)
            .with_cache(cache.clone());

        dragon.refresh_models(true).await.unwrap();

        assert!(cache.get(DEFAULT_CACHE_KEY).await.unwrap().is_some());
        dragon.refresh_models(false).await.unwrap();
        assert_eq!(provider.calls(), 1);
    }
}
