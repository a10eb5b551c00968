//! Rerank orchestrator error types.

use thiserror::Error;

/// Only raised when graceful degradation is disabled and every provider
/// (including passthrough eligibility) has been exhausted (§4.5, §7).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("all rerank providers are unavailable")]
    VendorUnavailable,
}
