//! Embed-provider error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embed provider transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("embed provider returned status {0}")]
    Status(u16),

    #[error("embed provider response decode error: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("embed provider dimension mismatch: {0}")]
    DimensionMismatch(#[from] crate::constants::DimValidationError),
}
