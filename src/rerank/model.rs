//! Wire types shared by every rerank provider.

use serde::{Deserialize, Serialize};

/// A single candidate offered to a provider for reranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankCandidate {
    pub candidate_id: String,
    pub content: String,
}

/// A single request to a [`super::RerankProvider`].
#[derive(Debug, Clone)]
pub struct RerankRequest {
    pub job_description: String,
    pub candidates: Vec<RerankCandidate>,
    pub top_n: usize,
    pub include_reasons: bool,
}

/// One reordered result as returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankResult {
    pub candidate_id: String,
    pub rank: u32,
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// A provider's full response (§4.4: strict schema, `{candidates: [...]}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RerankResponse {
    pub candidates: Vec<RerankResult>,
}
