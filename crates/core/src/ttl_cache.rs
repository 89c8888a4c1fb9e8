//! A single-entry TTL cache, used by the enrichment pipeline's tag cache
//! (spec §4.2, §5: "a single mapping guarded by a reader/writer lock, with a
//! 5-minute TTL"). Grounded on `infrastructure/src/cache/memory.rs`'s
//! `RwLock<HashMap<..>>` + `Instant`-based expiry, simplified to the single
//! whole-value shape the tag cache actually needs.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

pub struct TtlCache<T: Clone> {
    entry: RwLock<Option<Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    pub async fn get(&self) -> Option<T> {
        let guard = self.entry.read().await;
        guard.as_ref().and_then(|e| {
            if e.expires_at > Instant::now() {
                Some(e.value.clone())
            } else {
                None
            }
        })
    }

    pub async fn set(&self, value: T) {
        let mut guard = self.entry.write().await;
        *guard = Some(Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        });
    }

    /// Returns the cached value if fresh, otherwise computes and caches a
    /// new one via `refresh`.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get().await {
            return Ok(value);
        }
        let value = refresh().await?;
        self.set(value.clone()).await;
        Ok(value)
    }
}
