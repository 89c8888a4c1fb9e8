//! Thread-safe LRU used by the filter engine's compiled-program store
//! (spec §4.5). Wraps the `lru` crate's `LruCache` in a `tokio::sync::RwLock`
//! so multiple readers can `get` concurrently while `put` takes an exclusive
//! lock, the same division of labor as `infrastructure/src/cache/memory.rs`'s
//! TTL cache, minus the TTL (this cache evicts by recency, not age).

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::RwLock;

/// Default capacity for the compiled-program cache (spec §4.1).
pub const DEFAULT_CAPACITY: usize = 100;

pub struct ProgramCache<V> {
    inner: RwLock<LruCache<String, V>>,
}

impl<V: Clone> ProgramCache<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Promotes the entry to most-recently-used on hit.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut cache = self.inner.write().await;
        cache.get(key).cloned()
    }

    /// Evicts the least-recently-used entry if capacity would be exceeded.
    pub async fn put(&self, key: String, value: V) {
        let mut cache = self.inner.write().await;
        cache.put(key, value);
    }

    pub async fn clear(&self) {
        let mut cache = self.inner.write().await;
        cache.clear();
    }

    pub async fn size(&self) -> usize {
        let cache = self.inner.read().await;
        cache.len()
    }
}
