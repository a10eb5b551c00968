//! The multi-layer, tenant-isolated cache (§4.1).
//!
//! [`LayeredCache`] is the single public entry point: it owns TTL jitter, key
//! shaping, the in-process [`l1::L1Cache`] acceleration layer, request
//! coalescing, and hit/miss/set/delete metrics. Callers never talk to a
//! [`backend::CacheBackend`] directly.

pub mod backend;
mod error;
pub mod l1;
pub mod types;


pub use backend::{CacheBackend, NoopBackend, RedisBackend};
pub use error::CacheError;
pub use types::{CacheLayer, CacheStats, build_cache_key};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Notify;

use l1::L1Cache;

type InFlight = Arc<Notify>;

/// The multi-layer cache.
///
/// Generic over the backend so tests and the `mock` feature can plug in
/// [`NoopBackend`] (or a mock) without touching production wiring.
pub struct LayeredCache<B: CacheBackend> {
    backend: B,
    l1: L1Cache,
    key_prefix: String,
    in_flight: Mutex<HashMap<String, InFlight>>,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    ttl_override_secs: Option<u64>,
}

impl<B: CacheBackend> LayeredCache<B> {
    /// Creates a new layered cache.
    ///
    /// `key_prefix` namespaces the whole deployment (see
    /// [`build_cache_key`]); `l1_capacity` bounds the in-process layer.
    pub fn new(backend: B, key_prefix: impl Into<String>, l1_capacity: u64) -> Self {
        Self {
            backend,
            l1: L1Cache::with_capacity(l1_capacity),
            key_prefix: key_prefix.into(),
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            ttl_override_secs: None,
        }
    }

    /// Overrides every cache layer's base TTL uniformly (`RERANK_CACHE_TTL_SECONDS`,
    /// §6a); per-layer jitter policy still applies on top of the override.
    /// `None` (the default) leaves each layer's own [`CacheLayer::base_ttl_secs`].
    pub fn with_ttl_override_secs(mut self, ttl_override_secs: Option<u64>) -> Self {
        self.ttl_override_secs = ttl_override_secs;
        self
    }

    /// Fetches and deserializes a value at `(layer, tenant_id, identifier)`.
    ///
    /// Any backend or deserialization error is treated as a miss — cache
    /// failures must never surface to request handling.
    pub async fn get<T: DeserializeOwned>(
        &self,
        layer: CacheLayer,
        tenant_id: &str,
        identifier: &str,
    ) -> Option<T> {
        let key = self.key(layer, tenant_id, identifier);

        if let Some(bytes) = self.l1.get(&key) {
            return match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "cache l1 deserialize failed, treating as miss");
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            };
        }

        match self.backend.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    self.l1.insert(key, Arc::from(bytes));
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "cache deserialize failed, treating as miss");
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "cache backend read failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Serializes and stores a value at `(layer, tenant_id, identifier)` with
    /// the layer's jittered TTL. Errors are logged and dropped.
    pub async fn set<T: Serialize>(
        &self,
        layer: CacheLayer,
        tenant_id: &str,
        identifier: &str,
        value: &T,
    ) {
        let key = self.key(layer, tenant_id, identifier);

        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "cache serialize failed, dropping write");
                return;
            }
        };

        let base_ttl_secs = self.ttl_override_secs.unwrap_or_else(|| layer.base_ttl_secs());
        let ttl = jittered_ttl(base_ttl_secs, layer.use_jitter());

        self.l1.insert(key.clone(), Arc::from(bytes.clone()));

        if let Err(e) = self.backend.set(&key, bytes, ttl).await {
            tracing::warn!(error = %e, key = %key, "cache backend write failed, dropping");
            return;
        }
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    /// Deletes the entry at `(layer, tenant_id, identifier)` from both layers.
    pub async fn delete(&self, layer: CacheLayer, tenant_id: &str, identifier: &str) {
        let key = self.key(layer, tenant_id, identifier);
        self.l1.remove(&key);
        if let Err(e) = self.backend.delete(&key).await {
            tracing::warn!(error = %e, key = %key, "cache backend delete failed");
            return;
        }
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Fetches a value, computing and storing it on miss. Concurrent callers
    /// for the same key share a single computation (request coalescing) so a
    /// cache-stampede on a hot, newly-expired key cannot fan out into N
    /// identical upstream calls.
    ///
    /// Only the first ("leader") caller for a given key runs `compute`;
    /// followers wait for the leader to finish and then re-check the cache.
    /// If the leader's computation fails, followers fall back to computing
    /// the value themselves rather than sharing the leader's error — this
    /// keeps the coalescing path from needing to reconstruct `E` across
    /// tasks.
    pub async fn get_or_compute<T, F, Fut, E>(
        &self,
        layer: CacheLayer,
        tenant_id: &str,
        identifier: &str,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(layer, tenant_id, identifier).await {
            return Ok(value);
        }

        let key = self.key(layer, tenant_id, identifier);

        let (is_leader, notify) = {
            let mut in_flight = self.in_flight.lock();
            if let Some(existing) = in_flight.get(&key) {
                (false, existing.clone())
            } else {
                let notify: InFlight = Arc::new(Notify::new());
                in_flight.insert(key.clone(), notify.clone());
                (true, notify)
            }
        };

        if !is_leader {
            notify.notified().await;
            if let Some(value) = self.get::<T>(layer, tenant_id, identifier).await {
                return Ok(value);
            }
            // Leader finished without a usable cached value (it failed, or lost
            // a race with a concurrent invalidation) — compute independently.
            return compute().await;
        }

        let result = compute().await;
        self.in_flight.lock().remove(&key);
        notify.notify_waiters();

        if let Ok(ref value) = result {
            self.set(layer, tenant_id, identifier, value).await;
        }
        result
    }

    /// Invalidates every key under a tenant's namespace for a given layer,
    /// in both the in-process and backend layers. Bounded by
    /// [`crate::constants::DEFAULT_SCAN_MAX`] to keep the scan non-blocking.
    pub async fn invalidate_tenant_layer(&self, layer: CacheLayer, tenant_id: &str) {
        let prefix = format!("{}:{}:{tenant_id}:", self.key_prefix, layer.prefix());
        self.l1.remove_prefix(&prefix);

        let pattern = format!("{prefix}*");
        match self
            .backend
            .scan_keys(&pattern, crate::constants::DEFAULT_SCAN_MAX)
            .await
        {
            Ok(keys) => {
                for key in keys {
                    if let Err(e) = self.backend.delete(&key).await {
                        tracing::warn!(error = %e, key = %key, "cache invalidation delete failed");
                    } else {
                        self.deletes.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, tenant_id = %tenant_id, layer = %layer, "cache invalidation scan failed");
            }
        }
    }

    /// `"enabled"` or `"disabled"`, for `/healthz`/`/statusz` reporting.
    pub fn backend_label(&self) -> &'static str {
        self.backend.health_label()
    }

    /// Returns a snapshot of current hit/miss/set/delete counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    fn key(&self, layer: CacheLayer, tenant_id: &str, identifier: &str) -> String {
        build_cache_key(&self.key_prefix, layer, tenant_id, identifier)
    }
}

/// Computes `floor(base_ttl * (1 + U(-0.2, +0.2)))` when `jitter` is enabled,
/// else returns `base_ttl` unchanged.
fn jittered_ttl(base_ttl_secs: u64, jitter: bool) -> Duration {
    if !jitter {
        return Duration::from_secs(base_ttl_secs);
    }
    let fraction = crate::constants::TTL_JITTER_FRACTION;
    let delta = rand::thread_rng().gen_range(-fraction..=fraction);
    let jittered = (base_ttl_secs as f64 * (1.0 + delta)).floor().max(1.0);
    Duration::from_secs(jittered as u64)
}
