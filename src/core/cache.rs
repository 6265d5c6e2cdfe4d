use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// In-memory cache whose entries live for a fixed TTL.
///
/// Expired entries are dropped lazily when read. `get_or_refresh` lets only
/// one caller at a time recompute a missing value; callers that queue behind
/// it pick up the freshly stored entry instead of recomputing.
#[derive(Clone)]
pub struct Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, CacheEntry<V>>>>,
    refresh: Arc<Mutex<()>>,
    ttl: Duration,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug,
    V: Clone + Send + Sync,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            refresh: Arc::new(Mutex::new(())),
            ttl,
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.lock().await;
        let expired = match cache.get(key) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => {
                debug!("Cache HIT for key: {:?}", key);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!("Cache entry expired for key: {:?}", key);
            cache.remove(key);
        } else {
            debug!("Cache MISS for key: {:?}", key);
        }
        None
    }

    pub async fn put(&self, key: K, value: V) {
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {:?}", key);
        cache.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn remove(&self, key: &K) {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!("Cache REMOVE for key: {:?}", key);
    }

    /// Returns the live value for `key`, or computes, stores and returns a
    /// new one. Concurrent misses share a single computation.
    pub async fn get_or_refresh<F, Fut>(&self, key: K, refresh: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(&key).await {
            return value;
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have refreshed while we waited for the guard
        if let Some(value) = self.get(&key).await {
            return value;
        }

        let value = refresh().await;
        self.put(key, value.clone()).await;
        value
    }
}
