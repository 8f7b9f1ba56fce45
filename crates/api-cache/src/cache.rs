//! Keyed value cache stamped with insertion time.

use crate::{is_expired, Sweep, Timestamp};
use chrono::Utc;
use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use std::time::Duration;
use tracing::debug;

/// A cached value and the moment it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Timestamp,
}

impl<V> CacheEntry<V> {
    /// Whether this entry has outlived `ttl` at `now`.
    pub fn is_expired(&self, now: Timestamp, ttl: Duration) -> bool {
        is_expired(self.inserted_at, now, ttl)
    }
}

/// Concurrent key/value cache with bulk TTL expiry.
///
/// Reads never check freshness; stale entries stay visible until the next
/// [`Sweep::sweep`]. Every key is replaced or removed atomically, so readers
/// never observe a partially written entry.
pub struct TtlCache<K, V> {
    name: String,
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache. `name` only appears in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a value.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Look up a value together with its insertion stamp.
    pub fn get_entry<Q>(&self, key: &Q) -> Option<CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store a value stamped with the current time, replacing any previous entry.
    pub fn put(&self, key: K, value: V) {
        self.put_at(key, value, Utc::now());
    }

    /// Store a value with an explicit insertion stamp.
    pub fn put_at(&self, key: K, value: V, inserted_at: Timestamp) {
        self.entries.insert(key, CacheEntry { value, inserted_at });
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }
}

impl<K, V> Sweep for TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    fn sweep(&self, now: Timestamp, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !is_expired(entry.inserted_at, now, ttl));
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            debug!(cache = %self.name, removed, "Swept expired cache entries");
        }
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
