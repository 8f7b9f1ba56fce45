//! One-hop alias indirection from alternate identifiers to canonical keys.

use crate::{is_expired, Sweep, Timestamp};
use chrono::Utc;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
struct AliasEntry<K> {
    canonical: K,
    inserted_at: Timestamp,
}

/// Many-to-one map from alias keys to canonical keys.
///
/// Targets are never themselves alias keys, so [`AliasIndex::resolve`]
/// always completes in a single hop. Callers normalise keys (case folding
/// etc.) before both registering and resolving.
///
/// Registrations are serialised; lookups never take the writer lock.
pub struct AliasIndex<K> {
    name: String,
    entries: DashMap<K, AliasEntry<K>>,
    writer: Mutex<()>,
}

impl<K> AliasIndex<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
            writer: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Map `key` to its canonical key, or return it unchanged.
    pub fn resolve(&self, key: &K) -> K {
        self.entries
            .get(key)
            .map(|entry| entry.canonical.clone())
            .unwrap_or_else(|| key.clone())
    }

    /// Whether `key` is registered as an alias.
    pub fn is_alias(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Point `alias` at `canonical`, stamped with the current time.
    ///
    /// Returns `false` when the registration collapses to a self-loop and
    /// nothing was stored.
    pub fn register(&self, alias: K, canonical: K) -> bool {
        self.register_at(alias, canonical, Utc::now())
    }

    /// Point `alias` at `canonical` with an explicit stamp.
    ///
    /// If `canonical` is itself an alias, its target is stored instead. Any
    /// alias that previously targeted `alias` is re-pointed at the new
    /// target, keeping every chain one hop long.
    pub fn register_at(&self, alias: K, canonical: K, inserted_at: Timestamp) -> bool {
        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        let target = self.resolve(&canonical);
        if alias == target {
            return false;
        }

        self.entries.insert(
            alias.clone(),
            AliasEntry {
                canonical: target.clone(),
                inserted_at,
            },
        );

        for mut entry in self.entries.iter_mut() {
            if entry.canonical == alias {
                entry.canonical = target.clone();
            }
        }

        true
    }

    pub fn remove(&self, alias: &K) -> Option<K> {
        self.entries.remove(alias).map(|(_, entry)| entry.canonical)
    }
}

impl<K> Sweep for AliasIndex<K>
where
    K: Eq + Hash + Send + Sync,
{
    fn sweep(&self, now: Timestamp, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !is_expired(entry.inserted_at, now, ttl));
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            debug!(index = %self.name, removed, "Swept expired aliases");
        }
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
