//! Rerank Orchestrator (C5): the primary→fallback→passthrough state machine
//! (§4.5), the one component that ties the cache, the prompt builder, and
//! both rerank providers together under a request deadline.

mod error;
mod merge;
mod model;
mod prompt;

pub use error::OrchestratorError;
pub use model::{
    CandidateFeatures, OrchestratorMetadata, OrchestratorOutcome, OrchestratorRequest, OrchestratorTimings,
    ProviderSource, RerankCandidateInput,
};
pub use prompt::PromptLimits;

use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::cache::{CacheBackend, CacheLayer, LayeredCache};
use crate::constants::{DEFAULT_MAX_CANDIDATES, DEFAULT_MIN_CANDIDATES};
use crate::hashing;
use crate::rerank::{RerankProvider, RerankRequest};

use model::CachedRerankResults;

pub struct RerankOrchestrator<B: CacheBackend, Pr, Fb> {
    cache: LayeredCache<B>,
    primary: Pr,
    fallback: Fb,
    limits: PromptLimits,
    max_candidates: usize,
    min_candidates: usize,
    allow_graceful_degradation: bool,
}

impl<B, Pr, Fb> RerankOrchestrator<B, Pr, Fb>
where
    B: CacheBackend,
    Pr: RerankProvider,
    Fb: RerankProvider,
{
    pub fn new(cache: LayeredCache<B>, primary: Pr, fallback: Fb) -> Self {
        Self {
            cache,
            primary,
            fallback,
            limits: PromptLimits::default(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
            min_candidates: DEFAULT_MIN_CANDIDATES,
            allow_graceful_degradation: true,
        }
    }

    pub fn with_limits(mut self, limits: PromptLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_candidate_bounds(mut self, min_candidates: usize, max_candidates: usize) -> Self {
        self.min_candidates = min_candidates;
        self.max_candidates = max_candidates;
        self
    }

    pub fn with_graceful_degradation(mut self, allow: bool) -> Self {
        self.allow_graceful_degradation = allow;
        self
    }

    /// For `/statusz` (§6): best-effort, non-blocking availability signal.
    pub fn primary_available(&self) -> bool {
        self.primary.is_available()
    }

    /// For `/statusz` (§6): best-effort, non-blocking availability signal.
    pub fn fallback_available(&self) -> bool {
        self.fallback.is_available()
    }

    /// Whether any rerank provider is configured at all — a passthrough-only
    /// deployment (neither configured) is healthy by design (§6).
    pub fn any_provider_configured(&self) -> bool {
        self.primary.is_configured() || self.fallback.is_configured()
    }

    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.cache.stats()
    }

    pub fn cache_backend_label(&self) -> &'static str {
        self.cache.backend_label()
    }

    #[instrument(skip(self, request), fields(request_id = %request.request_id, tenant_id = %request.tenant_id))]
    pub async fn rerank(&self, mut request: OrchestratorRequest) -> Result<OrchestratorOutcome, OrchestratorError> {
        let start = Instant::now();

        if request.candidates.len() > self.max_candidates {
            warn!(
                candidate_count = request.candidates.len(),
                max_candidates = self.max_candidates,
                "truncating candidate set to maxCandidates"
            );
            request.candidates.truncate(self.max_candidates);
        }

        // (a) ComputeDescriptor
        let jd_hash = hashing::hash_job_description(&request.job_description);
        let mut sorted_ids: Vec<&str> = request.candidates.iter().map(|c| c.candidate_id.as_str()).collect();
        sorted_ids.sort_unstable();
        let docset_hash = hashing::hash_docset(sorted_ids);
        let descriptor = hashing::hash_rerank_descriptor(jd_hash, docset_hash, request.limit);
        let descriptor_key = format!("{descriptor:x}");
        let jd_hash_str = format!("{jd_hash:x}");
        let docset_hash_str = format!("{docset_hash:x}");

        let below_min_candidates = request.candidates.len() < self.min_candidates;

        // (b) CacheLookup
        let cache_start = Instant::now();
        if !request.disable_cache {
            if let Some(cached) = self
                .cache
                .get::<CachedRerankResults>(CacheLayer::RerankScores, &request.tenant_id, &descriptor_key)
                .await
            {
                let cache_ms = cache_start.elapsed().as_millis() as u64;
                debug!("rerank cache hit");
                return Ok(OrchestratorOutcome {
                    results: cached.results,
                    cache_hit: true,
                    used_fallback: false,
                    request_id: request.request_id.clone(),
                    timings: OrchestratorTimings {
                        total_ms: start.elapsed().as_millis() as u64,
                        prompt_ms: None,
                        provider_ms: None,
                        cache_ms: Some(cache_ms),
                    },
                    metadata: OrchestratorMetadata {
                        provider: ProviderSource::Cache,
                        docset_hash: docset_hash_str,
                        jd_hash: jd_hash_str,
                        candidate_count: request.candidates.len(),
                        limit: request.limit,
                        degraded: false,
                    },
                });
            }
        }
        let cache_ms = cache_start.elapsed().as_millis() as u64;

        // Below minCandidates, or an empty candidate set, always takes the
        // passthrough path without ever calling an LLM (§4.5 "Limits and inputs").
        if below_min_candidates || request.job_description.trim().is_empty() {
            return Ok(self.finish_with_passthrough(&request, start, cache_ms, jd_hash_str, docset_hash_str, false));
        }

        // (c) BuildPrompt
        let prompt_start = Instant::now();
        let (trimmed_jd, rerank_candidates) = prompt::build_prompt(
            &request.job_description,
            &request.candidates,
            self.limits.max_prompt_characters,
            self.limits.max_highlights,
            self.limits.max_skills,
        );
        let prompt_ms = prompt_start.elapsed().as_millis() as u64;

        let provider_request = RerankRequest {
            job_description: trimmed_jd,
            candidates: rerank_candidates,
            top_n: request.limit,
            include_reasons: request.include_reasons,
        };

        let provider_start = Instant::now();

        // (d) PrimaryProviderCall
        let primary_response = self.primary.rerank(&provider_request, request.remaining_budget_ms()).await;

        let (response, used_fallback, provider_source) = match primary_response {
            Some(response) => (Some(response), false, ProviderSource::Primary),
            None => {
                // (e) FallbackProviderCall
                let fallback_response = self.fallback.rerank(&provider_request, request.remaining_budget_ms()).await;
                match fallback_response {
                    Some(response) => (Some(response), true, ProviderSource::Fallback),
                    None => (None, true, ProviderSource::Passthrough),
                }
            }
        };
        let provider_ms = provider_start.elapsed().as_millis() as u64;

        let degraded = request.remaining_budget_ms() == 0;

        let results = match response {
            Some(response) => merge::merge_provider_response(
                response,
                &request.candidates,
                request.limit,
                request.include_reasons,
                self.limits.reason_limit,
            ),
            None => {
                if !self.allow_graceful_degradation {
                    return Err(OrchestratorError::VendorUnavailable);
                }
                merge::passthrough_results(&request.candidates, request.limit, request.include_reasons, self.limits.reason_limit)
            }
        };

        // (h) CacheWrite, unless the result came from passthrough or the caller
        // disabled the cache.
        if provider_source != ProviderSource::Passthrough && !request.disable_cache {
            self.cache
                .set(
                    CacheLayer::RerankScores,
                    &request.tenant_id,
                    &descriptor_key,
                    &CachedRerankResults { results: results.clone() },
                )
                .await;
        }

        Ok(OrchestratorOutcome {
            results,
            cache_hit: false,
            used_fallback,
            request_id: request.request_id.clone(),
            timings: OrchestratorTimings {
                total_ms: start.elapsed().as_millis() as u64,
                prompt_ms: Some(prompt_ms),
                provider_ms: Some(provider_ms),
                cache_ms: Some(cache_ms),
            },
            metadata: OrchestratorMetadata {
                provider: provider_source,
                docset_hash: docset_hash_str,
                jd_hash: jd_hash_str,
                candidate_count: request.candidates.len(),
                limit: request.limit,
                degraded,
            },
        })
    }

    fn finish_with_passthrough(
        &self,
        request: &OrchestratorRequest,
        start: Instant,
        cache_ms: u64,
        jd_hash: String,
        docset_hash: String,
        degraded: bool,
    ) -> OrchestratorOutcome {
        let results =
            merge::passthrough_results(&request.candidates, request.limit, request.include_reasons, self.limits.reason_limit);
        OrchestratorOutcome {
            results,
            cache_hit: false,
            used_fallback: true,
            request_id: request.request_id.clone(),
            timings: OrchestratorTimings {
                total_ms: start.elapsed().as_millis() as u64,
                prompt_ms: None,
                provider_ms: None,
                cache_ms: Some(cache_ms),
            },
            metadata: OrchestratorMetadata {
                provider: ProviderSource::Passthrough,
                docset_hash,
                jd_hash,
                candidate_count: request.candidates.len(),
                limit: request.limit,
                degraded,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::MemoryBackend;
    use crate::rerank::mock::MockRerankProvider;
    use crate::rerank::{RerankResponse, RerankResult};
    use std::time::Duration;

    fn make_orchestrator() -> RerankOrchestrator<MemoryBackend, MockRerankProvider, MockRerankProvider> {
        let cache = LayeredCache::new(MemoryBackend::default(), "test", 100);
        RerankOrchestrator::new(cache, MockRerankProvider::new(), MockRerankProvider::new())
    }

    fn candidate(id: &str, score: f64) -> RerankCandidateInput {
        RerankCandidateInput {
            candidate_id: id.to_string(),
            summary: Some("summary".to_string()),
            highlights: vec![],
            initial_score: Some(score),
            features: CandidateFeatures::default(),
            payload: None,
        }
    }

    fn request(candidates: Vec<RerankCandidateInput>) -> OrchestratorRequest {
        OrchestratorRequest {
            request_id: "req-1".to_string(),
            tenant_id: "tenant-a".to_string(),
            job_description: "Senior Go backend, distributed systems".to_string(),
            candidates,
            limit: 5,
            disable_cache: false,
            include_reasons: true,
            deadline: Instant::now() + Duration::from_millis(1_000),
        }
    }

    #[tokio::test]
    async fn test_primary_success_ranks_by_provider_order() {
        let orchestrator = make_orchestrator();
        orchestrator.primary.set_response(RerankResponse {
            candidates: vec![
                RerankResult { candidate_id: "c3".into(), rank: 1, score: 0.97, reasons: vec![] },
                RerankResult { candidate_id: "c1".into(), rank: 2, score: 0.92, reasons: vec![] },
            ],
        });

        let candidates = vec![candidate("c1", 0.9), candidate("c2", 0.8), candidate("c3", 0.7)];
        let outcome = orchestrator.rerank(request(candidates)).await.unwrap();

        assert_eq!(outcome.metadata.provider, ProviderSource::Primary);
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.results[0].candidate_id, "c3");
        assert_eq!(outcome.results[1].candidate_id, "c1");
    }

    #[tokio::test]
    async fn test_primary_fails_fallback_succeeds() {
        let orchestrator = make_orchestrator();
        orchestrator.primary.set_fail(true);
        orchestrator.fallback.set_response(RerankResponse {
            candidates: vec![RerankResult { candidate_id: "c2".into(), rank: 1, score: 0.9, reasons: vec![] }],
        });

        let candidates = vec![candidate("c1", 0.5), candidate("c2", 0.9)];
        let outcome = orchestrator.rerank(request(candidates)).await.unwrap();

        assert!(outcome.used_fallback);
        assert_eq!(outcome.metadata.provider, ProviderSource::Fallback);
    }

    #[tokio::test]
    async fn test_both_providers_down_passthrough() {
        let orchestrator = make_orchestrator();
        orchestrator.primary.set_fail(true);
        orchestrator.fallback.set_fail(true);

        let candidates = vec![candidate("c1", 0.2), candidate("c2", 0.9), candidate("c3", 0.5)];
        let outcome = orchestrator.rerank(request(candidates)).await.unwrap();

        assert_eq!(outcome.metadata.provider, ProviderSource::Passthrough);
        assert!(outcome.used_fallback);
        assert_eq!(outcome.results[0].candidate_id, "c2");
        assert_eq!(outcome.results.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_cache_hit_short_circuits_providers() {
        let orchestrator = make_orchestrator();
        orchestrator.primary.set_response(RerankResponse {
            candidates: vec![RerankResult { candidate_id: "c1".into(), rank: 1, score: 0.9, reasons: vec![] }],
        });

        let candidates = vec![candidate("c1", 0.5), candidate("c2", 0.9)];
        let first = orchestrator.rerank(request(candidates.clone())).await.unwrap();
        assert!(!first.cache_hit);
        assert_eq!(orchestrator.primary.call_count(), 1);

        let second = orchestrator.rerank(request(candidates)).await.unwrap();
        assert!(second.cache_hit);
        assert_eq!(second.results, first.results);
        assert_eq!(orchestrator.primary.call_count(), 1, "cache hit must not call the provider again");
    }

    #[tokio::test]
    async fn test_below_min_candidates_skips_providers() {
        let orchestrator = make_orchestrator().with_candidate_bounds(2, DEFAULT_MAX_CANDIDATES);
        orchestrator.primary.set_response(RerankResponse {
            candidates: vec![RerankResult { candidate_id: "c1".into(), rank: 1, score: 0.9, reasons: vec![] }],
        });

        let candidates = vec![candidate("c1", 0.5)];
        let outcome = orchestrator.rerank(request(candidates)).await.unwrap();

        assert_eq!(outcome.metadata.provider, ProviderSource::Passthrough);
        assert_eq!(orchestrator.primary.call_count(), 0);
    }

    #[tokio::test]
    async fn test_vendor_unavailable_when_degradation_disabled() {
        let orchestrator = make_orchestrator().with_graceful_degradation(false);
        orchestrator.primary.set_fail(true);
        orchestrator.fallback.set_fail(true);

        let candidates = vec![candidate("c1", 0.5), candidate("c2", 0.9)];
        let result = orchestrator.rerank(request(candidates)).await;
        assert!(matches!(result, Err(OrchestratorError::VendorUnavailable)));
    }
}
