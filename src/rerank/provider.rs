//! The single interface both rerank providers implement (§9: "primary and
//! fallback are two values of one interface").

use std::future::Future;
use std::sync::Arc;

use super::model::{RerankRequest, RerankResponse};

/// A rerank provider never surfaces an error past its own boundary: any
/// failure — transport, timeout, schema validation, budget exhaustion, an
/// open circuit — folds to `None`, meaning "unavailable, caller should
/// degrade" (§4.4).
pub trait RerankProvider: Send + Sync {
    /// Reranks `request.candidates`, aborting if `remaining_budget_ms` is too
    /// low to attempt a call.
    fn rerank(
        &self,
        request: &RerankRequest,
        remaining_budget_ms: u64,
    ) -> impl Future<Output = Option<RerankResponse>> + Send;

    /// Best-effort, non-blocking health signal for `/statusz` (§6). Providers
    /// that track no internal state (e.g. the mock) default to always-available.
    fn is_available(&self) -> bool {
        true
    }

    /// Whether this provider was intentionally wired up at all, vs. left
    /// disabled (no API key configured). A deployment running
    /// passthrough-only with both providers unconfigured is healthy by
    /// design, not degraded (§6 "passthrough-only reranking if no provider
    /// API key is present").
    fn is_configured(&self) -> bool {
        true
    }
}

/// Lets an `Arc<dyn RerankProvider>` (or an `Arc` of a concrete provider)
/// stand in for `Pr`/`Fb` directly — useful for test harnesses that need to
/// keep a handle to a provider the orchestrator also owns.
impl<T: RerankProvider + ?Sized> RerankProvider for Arc<T> {
    fn rerank(
        &self,
        request: &RerankRequest,
        remaining_budget_ms: u64,
    ) -> impl Future<Output = Option<RerankResponse>> + Send {
        (**self).rerank(request, remaining_budget_ms)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn is_configured(&self) -> bool {
        (**self).is_configured()
    }
}
