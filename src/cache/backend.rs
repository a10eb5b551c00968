//! The raw key/value backend behind the layered cache.
//!
//! [`CacheBackend`] is deliberately byte-oriented: the layered cache owns
//! serialization, TTL jitter, and tenant bookkeeping, while a backend only
//! needs to store and retrieve opaque blobs under a string key with an
//! expiry. This keeps [`NoopBackend`] and [`RedisBackend`] trivially
//! interchangeable.

use std::future::Future;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::CacheError;

/// A key/value store with TTL support, used as the backing layer for
/// [`crate::cache::LayeredCache`].
///
/// Methods return `impl Future + Send` rather than using `async_trait` so that
/// callers can await them without an extra boxed-future allocation per call.
pub trait CacheBackend: Send + Sync {
    /// Fetches the raw bytes stored under `key`, if present and unexpired.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, CacheError>> + Send;

    /// Stores `value` under `key` with the given TTL.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: std::time::Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Deletes the entry stored under `key`, if any.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Non-blocking, bounded scan for keys matching `pattern`. Implementations
    /// must cap the number of keys returned at `max_keys` and must never block
    /// the whole keyspace (e.g. Redis's `SCAN` cursor, never `KEYS`).
    fn scan_keys(
        &self,
        pattern: &str,
        max_keys: usize,
    ) -> impl Future<Output = Result<Vec<String>, CacheError>> + Send;

    /// Static label for `/healthz`/`/statusz` reporting — lets a disabled
    /// ([`NoopBackend`]) cache report "disabled" rather than looking like an
    /// outage of an enabled one.
    fn health_label(&self) -> &'static str {
        "enabled"
    }
}

/// Redis-backed implementation of [`CacheBackend`].
///
/// Holds no on-disk state of its own — persistence, replication, and eviction
/// policy are entirely Redis's concern.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connects to `redis_url` (e.g. `redis://host:port/0`) and returns a
    /// backend wrapping a reconnecting [`ConnectionManager`].
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url).map_err(CacheError::Connect)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(CacheError::Connect)?;
        Ok(Self { conn })
    }
}

impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(CacheError::Backend)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: std::time::Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let ttl_secs = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(key, value, ttl_secs)
            .await
            .map_err(CacheError::Backend)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(CacheError::Backend)?;
        Ok(())
    }

    async fn scan_keys(&self, pattern: &str, max_keys: usize) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut found = Vec::new();

        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await
                .map_err(CacheError::Backend)?;

            found.extend(batch);
            if found.len() >= max_keys {
                found.truncate(max_keys);
                break;
            }
            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }

        Ok(found)
    }
}

/// A backend that stores nothing and always reports a miss.
///
/// Selected at construction time when the cache is administratively disabled
/// (§9 redesign flag: "duck-typed disabled cache" → a real interface with two
/// implementations rather than scattered `if cache_enabled` checks).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

impl CacheBackend for NoopBackend {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: std::time::Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn scan_keys(&self, _pattern: &str, _max_keys: usize) -> Result<Vec<String>, CacheError> {
        Ok(Vec::new())
    }

    fn health_label(&self) -> &'static str {
        "disabled"
    }
}
