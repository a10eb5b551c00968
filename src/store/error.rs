//! Retrieval store error types.

use thiserror::Error;

/// Errors surfaced by [`crate::store::RetrievalStoreClient`].
///
/// Connection acquisition and statement timeouts are retryable from the
/// caller's perspective (§4.2); [`RetrievalStoreError::retryable`] makes that
/// explicit rather than requiring callers to match on variants.
#[derive(Debug, Error)]
pub enum RetrievalStoreError {
    #[error("failed to acquire a pool connection: {0}")]
    PoolAcquire(#[source] sqlx::Error),

    #[error("query timed out")]
    Timeout,

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("pool warmup failed: {0}")]
    Warmup(#[source] sqlx::Error),

    #[error("query embedding dimension mismatch: {0}")]
    DimensionMismatch(#[from] crate::constants::DimValidationError),
}

impl RetrievalStoreError {
    /// Whether the caller may reasonably retry this operation.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            RetrievalStoreError::PoolAcquire(_) | RetrievalStoreError::Timeout
        )
    }
}
