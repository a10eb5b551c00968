//! Request-shape and boundary validation tests for the HTTP surface.

mod support;

use axum::http::StatusCode;

use support::{build_router, post_json, status};

fn candidate(id: &str, score: f64) -> serde_json::Value {
    serde_json::json!({"candidateId": id, "summary": format!("profile for {id}"), "initialScore": score})
}

#[tokio::test]
async fn test_rerank_rejects_job_description_below_minimum_length() {
    let harness = build_router(&["c1"]);
    let payload = serde_json::json!({
        "jobDescription": "too short",
        "candidates": [candidate("c1", 0.5)],
    });
    let response = post_json(harness.router, "/v1/search/rerank", payload).await;
    assert_eq!(status(&response), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rerank_rejects_candidate_count_above_maximum() {
    let harness = build_router(&["c1"]);
    let candidates: Vec<serde_json::Value> = (0..201).map(|i| candidate(&format!("c{i}"), 0.5)).collect();
    let payload = serde_json::json!({
        "jobDescription": "a job description long enough to pass validation",
        "candidates": candidates,
    });
    let response = post_json(harness.router, "/v1/search/rerank", payload).await;
    assert_eq!(status(&response), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rerank_rejects_limit_above_maximum() {
    let harness = build_router(&["c1"]);
    let payload = serde_json::json!({
        "jobDescription": "a job description long enough to pass validation",
        "candidates": [candidate("c1", 0.5)],
        "limit": 500,
    });
    let response = post_json(harness.router, "/v1/search/rerank", payload).await;
    assert_eq!(status(&response), StatusCode::BAD_REQUEST);
    let body = support::json_body(response).await;
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_rerank_rejects_limit_of_zero() {
    let harness = build_router(&["c1"]);
    let payload = serde_json::json!({
        "jobDescription": "a job description long enough to pass validation",
        "candidates": [candidate("c1", 0.5)],
        "limit": 0,
    });
    let response = post_json(harness.router, "/v1/search/rerank", payload).await;
    assert_eq!(status(&response), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rerank_rejects_malformed_json_body() {
    let harness = build_router(&["c1"]);
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/search/rerank")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(harness.router, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_candidates_rejects_job_description_below_minimum_length() {
    let harness = build_router(&["c1"]);
    let payload = serde_json::json!({"tenantId": "acme", "jobDescription": "short"});
    let response = post_json(harness.router, "/v1/search/candidates", payload).await;
    assert_eq!(status(&response), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rerank_accepts_candidate_count_at_the_upper_boundary() {
    let harness = build_router(&["c1"]);
    let candidates: Vec<serde_json::Value> = (0..200).map(|i| candidate(&format!("c{i}"), 0.5)).collect();
    let payload = serde_json::json!({
        "jobDescription": "a job description long enough to pass validation",
        "candidates": candidates,
    });
    let response = post_json(harness.router, "/v1/search/rerank", payload).await;
    assert_eq!(status(&response), StatusCode::OK);
}
