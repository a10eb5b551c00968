//! Cache error types.
//!
//! Per §4.1, cache errors never propagate to callers: a read error becomes a
//! miss and a write error is logged and dropped. [`CacheError`] exists so the
//! backend implementations have something concrete to log, not something
//! callers are expected to handle.

use thiserror::Error;

/// Errors a [`crate::cache::backend::CacheBackend`] implementation may surface
/// internally. [`crate::cache::LayeredCache`] catches all of these at its
/// public boundary.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to establish or re-establish the backend connection.
    #[error("cache backend connection error: {0}")]
    Connect(#[source] redis::RedisError),

    /// A get/set/delete/scan operation failed against an already-connected backend.
    #[error("cache backend operation error: {0}")]
    Backend(#[source] redis::RedisError),

    /// Stored value could not be deserialized into the requested type.
    #[error("cache entry deserialization error: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// Value could not be serialized for storage.
    #[error("cache entry serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}
