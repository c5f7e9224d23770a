//! Explicit TTL cache for upstream datasets.
//!
//! Expired entries are kept, not evicted: the provider's failure policy is
//! to serve the last good value when a refresh fails, which requires being
//! able to read past the TTL. Freshness is always judged against a caller
//! supplied `now`, so tests drive expiry with a manual clock.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: std::time::Duration) -> Self {
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(300));
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    /// The cached value if it is younger than the TTL.
    pub async fn get_fresh(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// The cached value regardless of age. Used to serve stale data when a
    /// refresh fails.
    pub async fn get_any(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: K, value: V, now: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { value, fetched_at: now });
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }
}
