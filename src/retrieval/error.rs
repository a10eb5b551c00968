//! Hybrid retriever error types.

use thiserror::Error;

use crate::embed::EmbedError;
use crate::store::RetrievalStoreError;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embed provider error: {0}")]
    Embed(#[from] EmbedError),

    #[error("retrieval store error: {0}")]
    Store(#[from] RetrievalStoreError),
}
