//! Rerank provider error types.
//!
//! These never cross a provider's boundary as `Err` to the orchestrator —
//! [`super::RerankProvider::rerank`] returns `Option<RerankResponse>` and
//! folds every variant here into `None` plus a circuit-breaker state update.
//! The enum still exists so a provider's internal retry/classification logic
//! has something precise to match on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerankProviderError {
    #[error("provider transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("provider call timed out")]
    Timeout,

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("provider response failed schema validation: {0}")]
    InvalidResponse(String),

    #[error("remaining budget too low to call provider")]
    BudgetExhausted,
}

impl RerankProviderError {
    /// §4.4: only 5xx-class transport/connection-reset failures are
    /// retryable. Timeouts, parse failures, and 4xx abort immediately.
    pub fn retryable(&self) -> bool {
        match self {
            RerankProviderError::Status(status) => *status >= 500,
            RerankProviderError::Transport(source) => source.is_connect() || source.is_request(),
            _ => false,
        }
    }
}
