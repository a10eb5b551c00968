//! Hybrid Retriever (C3): fuses dense vector search and lexical full-text
//! search over the pgvector-backed store, then materializes candidate
//! profiles (§4.3).

mod error;
pub mod rrf;

pub use error::RetrievalError;
pub use rrf::FusedCandidate;

use std::future::Future;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{CacheBackend, CacheLayer, LayeredCache};
use crate::constants::{DEFAULT_MATERIALIZE_FALLBACK_CONCURRENCY, DEFAULT_OVER_RETRIEVAL_FACTOR, DEFAULT_RRF_K};
use crate::embed::EmbedProvider;
use crate::hashing;
use crate::store::{CandidateProfile, RetrievalStoreClient};

/// Deterministic reference lookup augmenting the text-search branch (§4.3
/// step 1). The taxonomy service backing this is out of scope (§1) — this
/// interface is a thin external collaborator, best-effort by contract: a
/// lookup failure never fails retrieval, it just means no augmentation.
pub trait SpecialtyLookupProvider: Send + Sync {
    fn lookup(&self, job_description: &str) -> impl Future<Output = Option<String>> + Send;
}

/// A lookup provider that never has anything to contribute.
pub struct NoopSpecialtyLookup;

impl SpecialtyLookupProvider for NoopSpecialtyLookup {
    async fn lookup(&self, _job_description: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RetrievalTimings {
    pub embed_ms: u64,
    pub vector_ms: u64,
    pub text_ms: u64,
    pub fuse_ms: u64,
    pub materialize_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    pub candidate_id: String,
    pub rrf_score: f64,
    pub vector_score: Option<f64>,
    pub text_score: Option<f64>,
    pub profile: CandidateProfile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    pub candidates: Vec<RetrievalCandidate>,
    pub timings: RetrievalTimings,
}

/// Structured hints that, together with the JD, narrow the search (§4.3
/// "Inputs"). Part of the `SearchResults` cache key's `filtersHash`.
#[derive(Debug, Clone, Default)]
pub struct RetrievalFilters {
    pub required_skills: Vec<String>,
    pub seniority: Option<String>,
}

impl RetrievalFilters {
    fn hash(&self) -> u64 {
        let mut sorted_skills = self.required_skills.clone();
        sorted_skills.sort_unstable();
        let mut combined = sorted_skills.join(",");
        if let Some(seniority) = &self.seniority {
            combined.push('\0');
            combined.push_str(seniority);
        }
        hashing::hash_to_u64(combined.as_bytes())
    }
}

pub struct HybridRetriever<S, E, B: CacheBackend, L = NoopSpecialtyLookup> {
    store: S,
    embed: E,
    specialty: L,
    cache: LayeredCache<B>,
    over_retrieval_factor: usize,
    rrf_k: u32,
    fallback_concurrency: usize,
}

impl<S, E, B> HybridRetriever<S, E, B, NoopSpecialtyLookup>
where
    S: RetrievalStoreClient,
    E: EmbedProvider,
    B: CacheBackend,
{
    pub fn new(store: S, embed: E, cache: LayeredCache<B>) -> Self {
        Self::with_specialty_lookup(store, embed, NoopSpecialtyLookup, cache)
    }
}

impl<S, E, B, L> HybridRetriever<S, E, B, L>
where
    S: RetrievalStoreClient,
    E: EmbedProvider,
    B: CacheBackend,
    L: SpecialtyLookupProvider,
{
    pub fn with_specialty_lookup(store: S, embed: E, specialty: L, cache: LayeredCache<B>) -> Self {
        Self {
            store,
            embed,
            specialty,
            cache,
            over_retrieval_factor: DEFAULT_OVER_RETRIEVAL_FACTOR as usize,
            rrf_k: DEFAULT_RRF_K,
            fallback_concurrency: DEFAULT_MATERIALIZE_FALLBACK_CONCURRENCY,
        }
    }

    pub fn with_over_retrieval_factor(mut self, factor: usize) -> Self {
        self.over_retrieval_factor = factor;
        self
    }

    pub fn with_rrf_k(mut self, k: u32) -> Self {
        self.rrf_k = k;
        self
    }

    pub fn with_fallback_concurrency(mut self, concurrency: usize) -> Self {
        self.fallback_concurrency = concurrency;
        self
    }

    /// Runs the full hybrid-retrieval pipeline for a single request, wrapped
    /// in the `SearchResults` cache layer keyed by
    /// `(tenantId, jdHash, filtersHash, limit)` unless `disable_cache` (§4.3
    /// "Caching").
    pub async fn retrieve(
        &self,
        tenant_id: &str,
        job_description: &str,
        text_query: &str,
        filters: &RetrievalFilters,
        limit: usize,
        disable_cache: bool,
    ) -> Result<RetrievalOutcome, RetrievalError> {
        if disable_cache {
            return self.retrieve_uncached(tenant_id, job_description, text_query, limit).await;
        }

        let jd_hash = hashing::hash_job_description(job_description);
        let identifier = format!("{jd_hash:x}:{:x}:{limit}", filters.hash());

        self.cache
            .get_or_compute(CacheLayer::SearchResults, tenant_id, &identifier, || {
                self.retrieve_uncached(tenant_id, job_description, text_query, limit)
            })
            .await
    }

    async fn retrieve_uncached(
        &self,
        tenant_id: &str,
        job_description: &str,
        text_query: &str,
        limit: usize,
    ) -> Result<RetrievalOutcome, RetrievalError> {
        let fan_out_start = Instant::now();
        let (embedding_result, specialty) =
            tokio::join!(self.embed_cached(tenant_id, job_description), self.specialty.lookup(job_description));
        let embedding = embedding_result?;
        let embed_ms = fan_out_start.elapsed().as_millis() as u64;

        let augmented_text_query = match specialty {
            Some(specialty) if !specialty.trim().is_empty() => format!("{text_query} {specialty}"),
            _ => text_query.to_string(),
        };

        let expanded_limit = limit.saturating_mul(self.over_retrieval_factor).max(limit);

        let vector_branch = async {
            let start = Instant::now();
            let hits = if embedding.is_empty() {
                Vec::new()
            } else {
                self.store.vector_search(tenant_id, &embedding, expanded_limit).await?
            };
            Ok::<_, RetrievalError>((hits, start.elapsed().as_millis() as u64))
        };

        let text_branch = async {
            let start = Instant::now();
            let hits = if augmented_text_query.trim().is_empty() {
                Vec::new()
            } else {
                self.store.text_search(tenant_id, &augmented_text_query, expanded_limit).await?
            };
            Ok::<_, RetrievalError>((hits, start.elapsed().as_millis() as u64))
        };

        let (vector_result, text_result) = tokio::join!(vector_branch, text_branch);
        let (vector_hits, vector_ms) = vector_result?;
        let (text_hits, text_ms) = text_result?;

        let fuse_start = Instant::now();
        let fused = rrf::rrf_merge(&vector_hits, &text_hits, self.rrf_k, limit);
        let fuse_ms = fuse_start.elapsed().as_millis() as u64;

        let materialize_start = Instant::now();
        let candidates = self.materialize(tenant_id, fused).await?;
        let materialize_ms = materialize_start.elapsed().as_millis() as u64;

        Ok(RetrievalOutcome {
            candidates,
            timings: RetrievalTimings { embed_ms, vector_ms, text_ms, fuse_ms, materialize_ms },
        })
    }

    /// Wraps the query embedding in the `Embedding` cache layer, keyed by a
    /// hash of the JD text. Embed failures propagate so the caller treats
    /// them the same as an uncached failure (caught by `Promise.allSettled`
    /// semantics at the `tokio::join!` call site — an error here just yields
    /// an empty embedding and the vector branch is skipped).
    async fn embed_cached(&self, tenant_id: &str, job_description: &str) -> Result<Vec<f32>, RetrievalError> {
        let identifier = format!("{:x}", hashing::hash_prompt(job_description));
        let result = self
            .cache
            .get_or_compute(CacheLayer::Embedding, tenant_id, &identifier, || async {
                self.embed.embed_query(job_description).await
            })
            .await;

        match result {
            Ok(embedding) => Ok(embedding),
            Err(error) => {
                warn!(%error, "embed provider failed, skipping vector branch");
                Ok(Vec::new())
            }
        }
    }

    async fn materialize(
        &self,
        tenant_id: &str,
        fused: Vec<FusedCandidate>,
    ) -> Result<Vec<RetrievalCandidate>, RetrievalError> {
        if fused.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = fused.iter().map(|c| c.candidate_id.clone()).collect();
        let profiles = self.store.fetch_profiles(tenant_id, &ids).await?;

        let mut by_id: std::collections::HashMap<String, CandidateProfile> =
            profiles.into_iter().map(|p| (p.candidate_id.clone(), p)).collect();

        let missing: Vec<String> = ids.iter().filter(|id| !by_id.contains_key(*id)).cloned().collect();

        if !missing.is_empty() {
            let fetched = stream::iter(missing.iter().cloned())
                .map(|id| async move {
                    let result = self.store.fetch_profiles(tenant_id, std::slice::from_ref(&id)).await;
                    (id, result)
                })
                .buffer_unordered(self.fallback_concurrency)
                .collect::<Vec<_>>()
                .await;

            for (id, result) in fetched {
                match result {
                    Ok(mut profiles) if !profiles.is_empty() => {
                        by_id.insert(id, profiles.remove(0));
                    }
                    Ok(_) => warn!(candidate_id = %id, "candidate profile not found during fallback materialization"),
                    Err(error) => warn!(candidate_id = %id, %error, "fallback profile fetch failed"),
                }
            }
        }

        Ok(fused
            .into_iter()
            .filter_map(|fused_candidate| {
                by_id.remove(&fused_candidate.candidate_id).map(|profile| RetrievalCandidate {
                    candidate_id: fused_candidate.candidate_id,
                    rrf_score: fused_candidate.rrf_score,
                    vector_score: fused_candidate.vector_score,
                    text_score: fused_candidate.text_score,
                    profile,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::MemoryBackend;
    use crate::embed::mock::MockEmbedProvider;
    use crate::store::mock::MockStoreClient;
    use crate::store::CandidateProfile;

    fn profile(id: &str) -> CandidateProfile {
        CandidateProfile {
            candidate_id: id.to_string(),
            tenant_id: "tenant-a".to_string(),
            payload: serde_json::json!({}),
            summary: None,
            highlights: Vec::new(),
            skills: Vec::new(),
            years_experience: None,
            current_title: None,
            location: None,
        }
    }

    fn make_retriever(
        store: MockStoreClient,
        embed: MockEmbedProvider,
    ) -> HybridRetriever<MockStoreClient, MockEmbedProvider, MemoryBackend> {
        let cache = LayeredCache::new(MemoryBackend::default(), "test", 100);
        HybridRetriever::new(store, embed, cache)
    }

    #[tokio::test]
    async fn test_both_branches_empty_returns_empty_slate() {
        let retriever = make_retriever(MockStoreClient::default(), MockEmbedProvider::new());

        let outcome = retriever
            .retrieve("tenant-a", "", "", &RetrievalFilters::default(), 10, true)
            .await
            .unwrap();
        assert!(outcome.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_fuses_and_materializes_candidates() {
        let store = MockStoreClient::default();
        store.seed_vector_hits("tenant-a", vec![crate::store::StoreHit { candidate_id: "c1".into(), score: 0.9 }]);
        store.seed_text_hits("tenant-a", vec![crate::store::StoreHit { candidate_id: "c1".into(), score: 0.8 }]);
        store.seed_profile(profile("c1"));

        let embed = MockEmbedProvider::new();
        embed.seed("staff engineer", vec![0.1, 0.2]);

        let retriever = make_retriever(store, embed);
        let outcome = retriever
            .retrieve("tenant-a", "staff engineer", "staff engineer", &RetrievalFilters::default(), 10, true)
            .await
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].candidate_id, "c1");
    }

    #[tokio::test]
    async fn test_missing_profile_drops_candidate() {
        let store = MockStoreClient::default();
        store.seed_vector_hits("tenant-a", vec![crate::store::StoreHit { candidate_id: "ghost".into(), score: 0.9 }]);

        let embed = MockEmbedProvider::new();
        embed.seed("query", vec![0.1]);

        let retriever = make_retriever(store, embed);
        let outcome = retriever
            .retrieve("tenant-a", "query", "", &RetrievalFilters::default(), 10, true)
            .await
            .unwrap();
        assert!(outcome.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_second_store_call() {
        let store = MockStoreClient::default();
        store.seed_vector_hits("tenant-a", vec![crate::store::StoreHit { candidate_id: "c1".into(), score: 0.9 }]);
        store.seed_profile(profile("c1"));

        let embed = MockEmbedProvider::new();
        embed.seed("staff engineer", vec![0.1, 0.2]);

        let retriever = make_retriever(store, embed);
        let filters = RetrievalFilters::default();

        let first = retriever.retrieve("tenant-a", "staff engineer", "", &filters, 10, false).await.unwrap();
        let second = retriever.retrieve("tenant-a", "staff engineer", "", &filters, 10, false).await.unwrap();

        assert_eq!(first.candidates.len(), second.candidates.len());
        assert_eq!(second.candidates[0].candidate_id, "c1");
    }
}
