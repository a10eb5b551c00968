use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::cache::LayeredCache;
use crate::cache::tests::MemoryBackend;
use crate::config::Config;
use crate::embed::mock::MockEmbedProvider;
use crate::orchestrator::RerankOrchestrator;
use crate::rerank::mock::MockRerankProvider;
use crate::retrieval::HybridRetriever;
use crate::store::{CandidateProfile, MockStoreClient, StoreHit};

use super::state::HandlerState;

type TestState = HandlerState<MockStoreClient, MockEmbedProvider, MemoryBackend, MockRerankProvider, MockRerankProvider>;

fn profile(id: &str) -> CandidateProfile {
    CandidateProfile {
        candidate_id: id.to_string(),
        tenant_id: "default".to_string(),
        payload: serde_json::Value::Null,
        summary: Some("senior backend engineer".to_string()),
        highlights: vec!["led platform migration".to_string()],
        skills: vec!["rust".to_string()],
        years_experience: Some(6.0),
        current_title: Some("staff engineer".to_string()),
        location: Some("remote".to_string()),
    }
}

fn build_state() -> TestState {
    let store = MockStoreClient::new();
    store.seed_vector_hits("default", vec![StoreHit { candidate_id: "c1".to_string(), score: 0.9 }]);
    store.seed_text_hits("default", vec![StoreHit { candidate_id: "c1".to_string(), score: 0.4 }]);
    store.seed_profile(profile("c1"));

    let embed = MockEmbedProvider::new();
    let retrieval_cache = LayeredCache::new(MemoryBackend::default(), "test", 64);
    let retriever = HybridRetriever::new(store, embed, retrieval_cache);

    let rerank_cache = LayeredCache::new(MemoryBackend::default(), "test", 64);
    let orchestrator = RerankOrchestrator::new(rerank_cache, MockRerankProvider::new(), MockRerankProvider::new());

    let store_for_health = MockStoreClient::new();
    store_for_health.seed_profile(profile("c1"));

    HandlerState::new(retriever, orchestrator, store_for_health, Config::default())
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_healthz_reports_ok_with_passthrough_only_providers() {
    let router = super::create_router(build_state());
    let response = router.oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_statusz_reports_cache_and_provider_sections() {
    let router = super::create_router(build_state());
    let response = router.oneshot(Request::builder().uri("/statusz").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["cache"]["backend"], "enabled");
    assert_eq!(body["providers"]["primary_available"], true);
}

#[tokio::test]
async fn test_search_rejects_short_job_description() {
    let router = super::create_router(build_state());
    let payload = serde_json::json!({
        "tenantId": "default",
        "jobDescription": "too short",
    });
    let request = Request::builder()
        .method("POST")
        .uri("/v1/search/candidates")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_search_returns_fused_candidates() {
    let router = super::create_router(build_state());
    let payload = serde_json::json!({
        "tenantId": "default",
        "jobDescription": "Looking for a senior backend engineer with distributed systems depth",
    });
    let request = Request::builder()
        .method("POST")
        .uri("/v1/search/candidates")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["candidates"][0]["candidateId"], "c1");
}

#[tokio::test]
async fn test_rerank_passthrough_when_no_provider_configured() {
    let router = super::create_router(build_state());
    let payload = serde_json::json!({
        "jobDescription": "Looking for a senior backend engineer with distributed systems depth",
        "candidates": [
            {"candidateId": "c1", "summary": "staff engineer", "initialScore": 0.8},
            {"candidateId": "c2", "summary": "junior engineer", "initialScore": 0.2},
        ],
    });
    let request = Request::builder()
        .method("POST")
        .uri("/v1/search/rerank")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("server-timing"));
    let body = body_json(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["usedFallback"], false);
}

#[tokio::test]
async fn test_rerank_rejects_empty_candidates() {
    let router = super::create_router(build_state());
    let payload = serde_json::json!({
        "jobDescription": "Looking for a senior backend engineer with distributed systems depth",
        "candidates": [],
    });
    let request = Request::builder()
        .method("POST")
        .uri("/v1/search/rerank")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
