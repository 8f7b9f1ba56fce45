//! Cached, alias-aware resolution of upstream entities.

use crate::error::FetchError;
use api_cache::{AliasIndex, CacheSweeper, TtlCache};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// A freshly fetched record and the identifiers it was discovered under.
#[derive(Debug, Clone)]
pub struct Resolved<R> {
    /// Key the record is cached under.
    pub canonical_key: String,
    /// Alternate identifiers found in the response (hostnames, custom URLs).
    pub aliases: Vec<String>,
    pub record: R,
}

impl<R> Resolved<R> {
    pub fn new(canonical_key: impl Into<String>, record: R) -> Self {
        Self {
            canonical_key: canonical_key.into(),
            aliases: Vec::new(),
            record,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Upstream lookup for one domain.
#[async_trait]
pub trait EntitySource: Send + Sync {
    type Record: Clone + Send + Sync + 'static;

    /// Short domain name for logs and cache names.
    fn domain(&self) -> &'static str;

    /// Normalise a lookup identifier. Applied before alias resolution and
    /// to every alias before it is registered.
    fn normalize(&self, lookup: &str) -> String {
        lookup.trim().to_string()
    }

    /// Fetch the record for `key` from upstream.
    async fn fetch(&self, key: &str) -> Result<Resolved<Self::Record>, FetchError>;
}

/// TTLs for a resolver's cache and alias index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub alias_ttl: Duration,
}

impl CachePolicy {
    /// Aliases live twice as long as records by default.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            alias_ttl: ttl * 2,
        }
    }

    pub fn with_alias_factor(ttl: Duration, factor: u32) -> Self {
        Self {
            ttl,
            alias_ttl: ttl * factor,
        }
    }
}

/// Resolves lookups through an alias index and a TTL cache, fetching on miss.
///
/// Concurrent misses for the same key are not coalesced: each performs its
/// own fetch and the last write wins.
pub struct EntityResolver<S: EntitySource> {
    source: S,
    cache: Arc<TtlCache<String, S::Record>>,
    aliases: Arc<AliasIndex<String>>,
    policy: CachePolicy,
}

impl<S: EntitySource> EntityResolver<S> {
    /// Create a resolver with its own alias index.
    pub fn new(source: S, policy: CachePolicy) -> Self {
        let aliases = Arc::new(AliasIndex::new(format!("{}-aliases", source.domain())));
        Self::with_aliases(source, aliases, policy)
    }

    /// Create a resolver sharing an alias index with resolvers over the same key space.
    pub fn with_aliases(source: S, aliases: Arc<AliasIndex<String>>, policy: CachePolicy) -> Self {
        Self {
            cache: Arc::new(TtlCache::new(source.domain())),
            source,
            aliases,
            policy,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn cache(&self) -> &Arc<TtlCache<String, S::Record>> {
        &self.cache
    }

    pub fn aliases(&self) -> &Arc<AliasIndex<String>> {
        &self.aliases
    }

    /// Canonical key a lookup currently maps to.
    pub fn canonical_key(&self, lookup: &str) -> String {
        self.aliases.resolve(&self.source.normalize(lookup))
    }

    /// Cached record for a lookup, without fetching.
    pub fn cached(&self, lookup: &str) -> Option<S::Record> {
        self.cache.get(self.canonical_key(lookup).as_str())
    }

    /// Resolve a lookup to its record.
    #[instrument(skip(self), fields(domain = self.source.domain()))]
    pub async fn resolve(&self, lookup: &str) -> Result<S::Record, FetchError> {
        let normalized = self.source.normalize(lookup);
        let key = self.aliases.resolve(&normalized);

        if let Some(record) = self.cache.get(key.as_str()) {
            debug!(%key, "Cache hit");
            return Ok(record);
        }

        debug!(%key, "Cache miss, fetching upstream");
        let Resolved {
            canonical_key,
            aliases,
            record,
        } = self.source.fetch(&key).await?;

        // Canonical keys are never aliases themselves.
        self.aliases.remove(&canonical_key);
        self.cache.put(canonical_key.clone(), record.clone());

        let discovered = aliases.iter().map(|alias| self.source.normalize(alias));
        for alias in std::iter::once(normalized).chain(discovered) {
            self.aliases.register(alias, canonical_key.clone());
        }

        debug!(%canonical_key, "Cached upstream record");
        Ok(record)
    }

    /// Register this resolver's cache and alias index with a sweeper.
    pub fn register_sweeps(&self, sweeper: &mut CacheSweeper) {
        self.register_cache_sweep(sweeper);
        sweeper.register(
            self.aliases.name().to_string(),
            self.aliases.clone(),
            self.policy.alias_ttl,
        );
    }

    /// Register only the record cache, for resolvers sharing an alias index.
    pub fn register_cache_sweep(&self, sweeper: &mut CacheSweeper) {
        sweeper.register(self.source.domain(), self.cache.clone(), self.policy.ttl);
    }
}
