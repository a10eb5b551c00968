//! LLM Rerank Clients (C4): two interchangeable providers behind one
//! interface, each guarded by its own circuit breaker (§4.4).

mod circuit;
mod error;
mod http_provider;
mod model;
mod provider;

pub use error::RerankProviderError;
pub use http_provider::HttpRerankProvider;
pub use model::{RerankCandidate, RerankRequest, RerankResponse, RerankResult};
pub use provider::RerankProvider;

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use std::future::Future;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use super::{RerankProvider, RerankRequest, RerankResponse};

    /// A provider whose behavior is dictated entirely by test fixtures: it
    /// can be told to succeed with a canned response, fail every call (so
    /// orchestrator tests can drive it through its circuit breaker), or
    /// simulate a deadline by ignoring `remaining_budget_ms`.
    pub struct MockRerankProvider {
        response: std::sync::Mutex<Option<RerankResponse>>,
        fail: AtomicBool,
        calls: AtomicU32,
    }

    impl MockRerankProvider {
        pub fn new() -> Self {
            Self {
                response: std::sync::Mutex::new(None),
                fail: AtomicBool::new(false),
                calls: AtomicU32::new(0),
            }
        }

        pub fn set_response(&self, response: RerankResponse) {
            *self.response.lock().unwrap() = Some(response);
        }

        pub fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        pub fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Default for MockRerankProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RerankProvider for MockRerankProvider {
        fn rerank(
            &self,
            _request: &RerankRequest,
            remaining_budget_ms: u64,
        ) -> impl Future<Output = Option<RerankResponse>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if remaining_budget_ms <= 50 || self.fail.load(Ordering::SeqCst) {
                None
            } else {
                self.response.lock().unwrap().clone()
            };
            async move { result }
        }
    }
}
