//! Cache layer definitions, key shape, and hit/miss metrics.

use std::fmt;

/// The named cache layers defined by the multi-layer cache (§4.1).
///
/// Each layer carries its own key prefix, base TTL, and jitter policy so that a
/// single Redis-backed store can safely multiplex unrelated concerns without
/// collisions or TTL stampedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheLayer {
    /// Hybrid retrieval results for a `(tenant, query descriptor)` pair.
    SearchResults,
    /// LLM rerank scores for a `(tenant, rerank descriptor)` pair.
    RerankScores,
    /// Specialty/taxonomy lookups, effectively static within a day.
    SpecialtyLookup,
    /// Query embedding vectors.
    Embedding,
}

impl CacheLayer {
    /// The key-space prefix segment for this layer.
    #[inline]
    pub const fn prefix(&self) -> &'static str {
        match self {
            CacheLayer::SearchResults => "search",
            CacheLayer::RerankScores => "rerank",
            CacheLayer::SpecialtyLookup => "specialty",
            CacheLayer::Embedding => "embedding",
        }
    }

    /// The base TTL, in seconds, before jitter is applied.
    #[inline]
    pub const fn base_ttl_secs(&self) -> u64 {
        match self {
            CacheLayer::SearchResults => crate::constants::TTL_SEARCH_RESULTS_SECS,
            CacheLayer::RerankScores => crate::constants::TTL_RERANK_SCORES_SECS,
            CacheLayer::SpecialtyLookup => crate::constants::TTL_SPECIALTY_LOOKUP_SECS,
            CacheLayer::Embedding => crate::constants::TTL_EMBEDDING_SECS,
        }
    }

    /// Whether this layer's TTL should be jittered (`SpecialtyLookup` is not,
    /// since it is already effectively static and stampede risk is low).
    #[inline]
    pub const fn use_jitter(&self) -> bool {
        !matches!(self, CacheLayer::SpecialtyLookup)
    }
}

impl fmt::Display for CacheLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Builds a cache key of the shape `"<prefix>:<layerPrefix>:<tenantId>:<identifier>"`.
///
/// `prefix` is a deployment-wide namespace (so multiple environments can share a
/// Redis instance without key collisions); `tenant_id` and `identifier` are
/// caller-supplied and are not further hashed here — callers that need a fixed-
/// width identifier should hash it themselves (see [`crate::hashing`]) before
/// calling this.
pub fn build_cache_key(prefix: &str, layer: CacheLayer, tenant_id: &str, identifier: &str) -> String {
    format!("{prefix}:{}:{tenant_id}:{identifier}", layer.prefix())
}

/// Running hit/miss/set/delete counters for a cache instance.
///
/// Cloned snapshots are cheap; the live counters live behind atomics in
/// [`crate::cache::LayeredCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
}

impl CacheStats {
    /// Fraction of `get` calls that were hits, in `[0.0, 1.0]`. Returns `0.0`
    /// when no lookups have been recorded yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cache_key_shape() {
        let key = build_cache_key("talent", CacheLayer::SearchResults, "tenant-1", "abc123");
        assert_eq!(key, "talent:search:tenant-1:abc123");
    }

    #[test]
    fn test_specialty_lookup_has_no_jitter() {
        assert!(!CacheLayer::SpecialtyLookup.use_jitter());
        assert!(CacheLayer::SearchResults.use_jitter());
        assert!(CacheLayer::RerankScores.use_jitter());
        assert!(CacheLayer::Embedding.use_jitter());
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_computed() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            sets: 4,
            deletes: 0,
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
