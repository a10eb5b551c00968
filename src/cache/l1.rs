//! In-process optimization layer in front of the Redis-backed cache.
//!
//! This is pure acceleration: every entry here also exists (or will exist) in
//! the backend, and losing the contents of this cache (process restart,
//! eviction) changes nothing but latency. It stores the same serialized bytes
//! the backend stores, keyed by the same cache key, so a hit here never needs
//! a second deserialization pass against a different representation.

use std::sync::Arc;

use moka::sync::Cache;

/// In-memory cache of serialized cache values, keyed by the layered cache's
/// string key.
pub struct L1Cache {
    entries: Cache<String, Arc<[u8]>>,
}

impl L1Cache {
    /// Creates a cache with the default capacity
    /// ([`crate::constants::DEFAULT_L1_CAPACITY`]).
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(crate::constants::DEFAULT_L1_CAPACITY)
    }

    /// Creates a cache with a max entry capacity (LRU/LFU-hybrid eviction via moka).
    #[inline]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Looks up a previously-stored value by its cache key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        self.entries.get(key)
    }

    /// Inserts a value under a cache key. L1 does not track per-entry TTLs
    /// beyond capacity-based eviction — staleness relative to the backend's
    /// TTL is bounded by how often the process restarts and how hot the key
    /// is, which for these cache layers is an acceptable tradeoff.
    #[inline]
    pub fn insert(&self, key: String, value: Arc<[u8]>) {
        self.entries.insert(key, value);
    }

    /// Removes an entry by key.
    #[inline]
    pub fn remove(&self, key: &str) {
        self.entries.invalidate(key);
    }

    /// Removes every entry under a tenant's namespace. Used when a tenant's
    /// layer is explicitly invalidated so the in-process layer doesn't keep
    /// serving stale data after a backend-level `invalidateTenantLayer`.
    pub fn remove_prefix(&self, prefix: &str) {
        let stale: Vec<String> = self
            .entries
            .iter()
            .map(|(k, _)| (*k).clone())
            .filter(|k| k.starts_with(prefix))
            .collect();
        for key in stale {
            self.entries.invalidate(&key);
        }
    }

    /// Returns the number of cached entries.
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Returns `true` if the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    /// Clears all entries.
    #[inline]
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl Default for L1Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for L1Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("L1Cache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
