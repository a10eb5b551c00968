//! Request/response types for the Rerank Orchestrator (§4.5, §6).

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::rerank::RerankResult;

/// Per-candidate features carried alongside the candidate id (§3
/// `RerankCandidate`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFeatures {
    pub vector_score: Option<f64>,
    pub text_score: Option<f64>,
    pub confidence: Option<f64>,
    pub years_experience: Option<f64>,
    pub current_title: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub match_reasons: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// One candidate as supplied on the wire to `POST /v1/search/rerank`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankCandidateInput {
    pub candidate_id: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub initial_score: Option<f64>,
    #[serde(default)]
    pub features: CandidateFeatures,
    pub payload: Option<serde_json::Value>,
}

impl RerankCandidateInput {
    /// The passthrough ordering key: `vectorScore → textScore → 0` (§4.5
    /// stage (f)).
    pub fn passthrough_score(&self) -> f64 {
        self.initial_score
            .or(self.features.vector_score)
            .or(self.features.text_score)
            .unwrap_or(0.0)
    }
}

/// A single orchestrator invocation's inputs, already validated and deadline-stamped.
pub struct OrchestratorRequest {
    pub request_id: String,
    pub tenant_id: String,
    pub job_description: String,
    pub candidates: Vec<RerankCandidateInput>,
    pub limit: usize,
    pub disable_cache: bool,
    pub include_reasons: bool,
    pub deadline: Instant,
}

impl OrchestratorRequest {
    pub fn remaining_budget_ms(&self) -> u64 {
        self.deadline.saturating_duration_since(Instant::now()).as_millis() as u64
    }
}

/// Which stage ultimately produced the response (§6 `metadata.provider`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSource {
    Primary,
    Fallback,
    Passthrough,
    Cache,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OrchestratorTimings {
    pub total_ms: u64,
    pub prompt_ms: Option<u64>,
    pub provider_ms: Option<u64>,
    pub cache_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorMetadata {
    pub provider: ProviderSource,
    pub docset_hash: String,
    pub jd_hash: String,
    pub candidate_count: usize,
    pub limit: usize,
    /// Set when a deadline was hit before the pipeline reached its natural
    /// end (§5 cancellation: "best available result plus a degraded marker").
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorOutcome {
    pub results: Vec<RerankResult>,
    pub cache_hit: bool,
    pub used_fallback: bool,
    pub request_id: String,
    pub timings: OrchestratorTimings,
    pub metadata: OrchestratorMetadata,
}

/// Cached at stage (h); serialized as the `RerankScores` cache layer value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRerankResults {
    pub results: Vec<RerankResult>,
}
