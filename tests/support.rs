//! Shared fixtures for the end-to-end HTTP tests below. Builds the real
//! Axum router (`talent_rerank::gateway::create_router`) wired to in-memory
//! mocks, so these tests exercise the full request path — validation,
//! orchestration, caching — without a live Postgres/Redis/LLM dependency.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;

use talent_rerank::cache::LayeredCache;
use talent_rerank::config::Config;
use talent_rerank::gateway::HandlerState;
use talent_rerank::store::{CandidateProfile, MockStoreClient, StoreHit};
use talent_rerank::{HybridRetriever, MockEmbedProvider, MockRerankProvider, RerankOrchestrator};

pub fn candidate_profile(id: &str) -> CandidateProfile {
    CandidateProfile {
        candidate_id: id.to_string(),
        tenant_id: "acme".to_string(),
        payload: serde_json::Value::Null,
        summary: Some(format!("profile for {id}")),
        highlights: vec!["shipped a major migration".to_string()],
        skills: vec!["rust".to_string(), "postgres".to_string()],
        years_experience: Some(5.0),
        current_title: Some("senior engineer".to_string()),
        location: Some("remote".to_string()),
    }
}

pub struct Harness {
    pub router: Router,
    pub primary: Arc<MockRerankProvider>,
    pub fallback: Arc<MockRerankProvider>,
}

/// Builds a router over a store seeded with `candidate_ids` (present in both
/// the vector and text branches), and two mock rerank providers the caller
/// can drive via `set_response`/`set_fail` — the orchestrator holds the same
/// `Arc` clones, so mutations are visible to in-flight requests.
pub fn build_router(candidate_ids: &[&str]) -> Harness {
    let store = MockStoreClient::new();
    let hits: Vec<StoreHit> =
        candidate_ids.iter().enumerate().map(|(i, id)| StoreHit { candidate_id: id.to_string(), score: 1.0 - i as f64 * 0.1 }).collect();
    store.seed_vector_hits("acme", hits.clone());
    store.seed_text_hits("acme", hits);
    for id in candidate_ids {
        store.seed_profile(candidate_profile(id));
    }

    let embed = MockEmbedProvider::new();
    embed.seed("a job description long enough to pass validation", vec![0.1, 0.2, 0.3]);

    let retrieval_backend = talent_rerank::cache::NoopBackend;
    let retrieval_cache = LayeredCache::new(retrieval_backend, "e2e", 64);
    let retriever = HybridRetriever::new(store, embed, retrieval_cache);

    let primary = Arc::new(MockRerankProvider::new());
    let fallback = Arc::new(MockRerankProvider::new());

    let rerank_backend = talent_rerank::cache::NoopBackend;
    let rerank_cache = LayeredCache::new(rerank_backend, "e2e", 64);
    let orchestrator = RerankOrchestrator::new(rerank_cache, primary.clone(), fallback.clone());

    // `health_check` on the mock returns a canned `PoolHealth` regardless of
    // seeded data, so the gateway's own store handle can be a fresh instance
    // rather than a clone of the seeded one (the mock isn't `Clone`).
    let health_store = MockStoreClient::new();
    let state = HandlerState::new(retriever, orchestrator, health_store, Config::default());
    let router = talent_rerank::gateway::create_router(state);

    Harness { router, primary, fallback }
}

pub async fn post_json(router: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request =
        Request::builder().method("POST").uri(uri).header("content-type", "application/json").body(Body::from(body.to_string())).unwrap();
    tower::ServiceExt::oneshot(router, request).await.unwrap()
}

pub async fn get(router: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    tower::ServiceExt::oneshot(router, request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn status(response: &Response<Body>) -> StatusCode {
    response.status()
}
