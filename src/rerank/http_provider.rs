//! HTTP-backed [`RerankProvider`], budget-aware and circuit-breaker-guarded.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::constants::{PROVIDER_CALL_ABORT_THRESHOLD_MS, PROVIDER_HARD_TIMEOUT_PAD_MS, PROVIDER_MIN_EFFECTIVE_TIMEOUT_MS};

use super::circuit::{Admission, CircuitBreaker};
use super::error::RerankProviderError;
use super::model::{RerankCandidate, RerankRequest, RerankResponse};
use super::provider::RerankProvider;

#[derive(serde::Serialize)]
struct HttpRerankRequest<'a> {
    model: &'a str,
    job_description: &'a str,
    candidates: &'a [RerankCandidate],
    top_n: usize,
    include_reasons: bool,
}

/// HTTP client for a single LLM rerank endpoint, wrapping its own circuit
/// breaker (§4.4). `primary` and `fallback` are both just instances of this
/// type, configured from [`ProviderConfig`].
pub struct HttpRerankProvider {
    name: &'static str,
    client: reqwest::Client,
    config: ProviderConfig,
    circuit: CircuitBreaker,
}

impl HttpRerankProvider {
    pub fn new(name: &'static str, client: reqwest::Client, config: ProviderConfig) -> Self {
        let circuit =
            CircuitBreaker::new(config.circuit_failure_threshold, Duration::from_millis(config.circuit_cooldown_ms));
        Self { name, client, config, circuit }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    async fn call_once(
        &self,
        request: &RerankRequest,
        effective_timeout: Duration,
    ) -> Result<RerankResponse, RerankProviderError> {
        let body = HttpRerankRequest {
            model: &self.config.model,
            job_description: &request.job_description,
            candidates: &request.candidates,
            top_n: request.top_n,
            include_reasons: request.include_reasons,
        };

        let response = self
            .client
            .post(format!("{}/rerank", self.config.base_url))
            .timeout(effective_timeout + Duration::from_millis(PROVIDER_HARD_TIMEOUT_PAD_MS))
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    RerankProviderError::Timeout
                } else {
                    RerankProviderError::Transport(error)
                }
            })?;

        if !response.status().is_success() {
            return Err(RerankProviderError::Status(response.status().as_u16()));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|error| RerankProviderError::InvalidResponse(error.to_string()))?;

        validate_schema(&parsed)?;
        Ok(parsed)
    }
}

fn validate_schema(response: &RerankResponse) -> Result<(), RerankProviderError> {
    for result in &response.candidates {
        if result.candidate_id.trim().is_empty() {
            return Err(RerankProviderError::InvalidResponse("empty candidateId".to_string()));
        }
        if result.rank < 1 {
            return Err(RerankProviderError::InvalidResponse(format!("rank {} is below 1", result.rank)));
        }
    }
    Ok(())
}

impl RerankProvider for HttpRerankProvider {
    async fn rerank(&self, request: &RerankRequest, remaining_budget_ms: u64) -> Option<RerankResponse> {
        if !self.config.enabled {
            return None;
        }

        if self.circuit.admit() == Admission::Denied {
            debug!(provider = self.name, "circuit open, skipping call");
            return None;
        }

        if remaining_budget_ms <= PROVIDER_CALL_ABORT_THRESHOLD_MS {
            debug!(provider = self.name, remaining_budget_ms, "budget too low, aborting before call");
            return None;
        }

        let effective_timeout_ms =
            remaining_budget_ms.clamp(PROVIDER_MIN_EFFECTIVE_TIMEOUT_MS, self.config.timeout_ms);
        let effective_timeout = Duration::from_millis(effective_timeout_ms);

        let suppress_retries = remaining_budget_ms < self.config.timeout_ms;
        let max_attempts = if suppress_retries { 1 } else { 1 + self.config.retries };

        let mut last_error = None;
        for attempt in 0..max_attempts {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }

            match self.call_once(request, effective_timeout).await {
                Ok(response) => {
                    self.circuit.on_success();
                    return Some(response);
                }
                Err(error) => {
                    let retryable = error.retryable();
                    warn!(provider = self.name, %error, attempt, "rerank provider call failed");
                    last_error = Some(error);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        self.circuit.on_failure();
        let _ = last_error;
        None
    }

    fn is_available(&self) -> bool {
        self.config.enabled && !self.circuit.is_open()
    }

    fn is_configured(&self) -> bool {
        self.config.enabled
    }
}
