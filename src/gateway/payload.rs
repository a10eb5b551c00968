//! Request/response DTOs for the HTTP surface (§6), separate from the
//! internal orchestrator/retriever model types so the wire contract can
//! evolve independently of the core.

use serde::{Deserialize, Serialize};

use crate::orchestrator::{CandidateFeatures, OrchestratorOutcome, ProviderSource, RerankCandidateInput};
use crate::retrieval::{RetrievalCandidate, RetrievalOutcome};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankCandidateInputPayload {
    pub candidate_id: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub initial_score: Option<f64>,
    #[serde(default)]
    pub features: CandidateFeatures,
    pub payload: Option<serde_json::Value>,
}

impl From<RerankCandidateInputPayload> for RerankCandidateInput {
    fn from(value: RerankCandidateInputPayload) -> Self {
        Self {
            candidate_id: value.candidate_id,
            summary: value.summary,
            highlights: value.highlights,
            initial_score: value.initial_score,
            features: value.features,
            payload: value.payload,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankRequestPayload {
    pub job_description: String,
    pub jd_hash: Option<String>,
    pub docset_hash: Option<String>,
    pub candidates: Vec<RerankCandidateInputPayload>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub disable_cache: bool,
    #[serde(default = "default_true")]
    pub include_reasons: bool,
    pub request_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankResultPayload {
    pub candidate_id: String,
    pub rank: u32,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankTimingsPayload {
    pub total_ms: u64,
    pub provider_ms: Option<u64>,
    pub prompt_ms: Option<u64>,
    pub cache_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankMetadataPayload {
    pub provider: ProviderSource,
    pub docset_hash: String,
    pub jd_hash: String,
    pub candidate_count: usize,
    pub limit: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankResponsePayload {
    pub results: Vec<RerankResultPayload>,
    pub cache_hit: bool,
    pub used_fallback: bool,
    pub request_id: String,
    pub timings: RerankTimingsPayload,
    pub metadata: RerankMetadataPayload,
}

impl From<OrchestratorOutcome> for RerankResponsePayload {
    fn from(outcome: OrchestratorOutcome) -> Self {
        Self {
            results: outcome
                .results
                .into_iter()
                .map(|r| RerankResultPayload { candidate_id: r.candidate_id, rank: r.rank, score: r.score, reasons: r.reasons })
                .collect(),
            cache_hit: outcome.cache_hit,
            used_fallback: outcome.used_fallback,
            request_id: outcome.request_id,
            timings: RerankTimingsPayload {
                total_ms: outcome.timings.total_ms,
                provider_ms: outcome.timings.provider_ms,
                prompt_ms: outcome.timings.prompt_ms,
                cache_ms: outcome.timings.cache_ms,
            },
            metadata: RerankMetadataPayload {
                provider: outcome.metadata.provider,
                docset_hash: outcome.metadata.docset_hash,
                jd_hash: outcome.metadata.jd_hash,
                candidate_count: outcome.metadata.candidate_count,
                limit: outcome.metadata.limit,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestPayload {
    pub tenant_id: String,
    pub job_description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub seniority: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub disable_cache: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCandidatePayload {
    pub candidate_id: String,
    pub rrf_score: f64,
    pub vector_score: Option<f64>,
    pub text_score: Option<f64>,
    pub profile: crate::store::CandidateProfile,
}

impl From<RetrievalCandidate> for SearchCandidatePayload {
    fn from(candidate: RetrievalCandidate) -> Self {
        Self {
            candidate_id: candidate.candidate_id,
            rrf_score: candidate.rrf_score,
            vector_score: candidate.vector_score,
            text_score: candidate.text_score,
            profile: candidate.profile,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTimingsPayload {
    pub embed_ms: u64,
    pub vector_ms: u64,
    pub text_ms: u64,
    pub fuse_ms: u64,
    pub materialize_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponsePayload {
    pub candidates: Vec<SearchCandidatePayload>,
    pub timings: SearchTimingsPayload,
}

impl From<RetrievalOutcome> for SearchResponsePayload {
    fn from(outcome: RetrievalOutcome) -> Self {
        Self {
            candidates: outcome.candidates.into_iter().map(SearchCandidatePayload::from).collect(),
            timings: SearchTimingsPayload {
                embed_ms: outcome.timings.embed_ms,
                vector_ms: outcome.timings.vector_ms,
                text_ms: outcome.timings.text_ms,
                fuse_ms: outcome.timings.fuse_ms,
                materialize_ms: outcome.timings.materialize_ms,
            },
        }
    }
}
