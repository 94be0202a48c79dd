//! Time-to-live cache for upstream responses.
//!
//! Upstream data (worksheet rows, market status, price history) is cached
//! per key and treated as a miss once older than the TTL. Stale entries are
//! dropped on lookup; `clear` empties the cache for a forced reload.

use std::hash::Hash;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::trace;

/// Cached value with fetch time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    /// Wall-clock fetch time, for display.
    pub fetched_at: DateTime<Utc>,
    /// Monotonic insertion time, for expiry.
    inserted: Instant,
}

/// Concurrent TTL cache.
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Get a fresh value.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Get a fresh entry, removing it if it has expired.
    pub fn get_entry(&self, key: &K) -> Option<CacheEntry<V>> {
        let entry = self.entries.get(key)?;
        if entry.inserted.elapsed() < self.ttl {
            return Some((*entry).clone());
        }
        drop(entry);
        self.evict_if_stale(key);
        None
    }

    /// Remove the entry only if it is still expired; a value stored
    /// since the lookup is kept.
    fn evict_if_stale(&self, key: &K) -> bool {
        let evicted = self
            .entries
            .remove_if(key, |_, entry| entry.inserted.elapsed() >= self.ttl)
            .is_some();
        if evicted {
            trace!("Evicted expired cache entry");
        }
        evicted
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Utc::now(),
                inserted: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
