//! HTTP gateway (Axum) for the rerank RPC, the hybrid-search RPC, and
//! health/status endpoints (§6).

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;

#[cfg(test)]
mod tests;

pub use error::GatewayError;
pub use state::HandlerState;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::cache::CacheBackend;
use crate::embed::EmbedProvider;
use crate::rerank::RerankProvider;
use crate::retrieval::SpecialtyLookupProvider;
use crate::store::{PoolStatus, RetrievalStoreClient};

pub fn create_router<S, E, B, Pr, Fb, L>(state: HandlerState<S, E, B, Pr, Fb, L>) -> Router
where
    S: RetrievalStoreClient + Send + Sync + 'static,
    E: EmbedProvider + Send + Sync + 'static,
    B: CacheBackend + Send + Sync + 'static,
    L: SpecialtyLookupProvider + Send + Sync + 'static,
    Pr: RerankProvider + Send + Sync + 'static,
    Fb: RerankProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/v1/search/rerank", post(handler::rerank_handler))
        .route("/v1/search/candidates", post(handler::search_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(healthz_handler))
        .route("/statusz", get(statusz_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// §6: 200 when `cache health ∈ {healthy, disabled, degraded}` and at least
/// one provider is `{healthy, disabled}`; 503 otherwise. Shared by
/// `/healthz` and `/readyz` — this gateway has no separate startup-vs-liveness
/// distinction to make (no warm-up phase beyond the store pool warmup done at
/// process start).
async fn healthz_handler<S, E, B, Pr, Fb, L>(State(state): State<HandlerState<S, E, B, Pr, Fb, L>>) -> Response
where
    S: RetrievalStoreClient + Send + Sync + 'static,
    E: EmbedProvider + Send + Sync + 'static,
    B: CacheBackend + Send + Sync + 'static,
    L: SpecialtyLookupProvider + Send + Sync + 'static,
    Pr: RerankProvider + Send + Sync + 'static,
    Fb: RerankProvider + Send + Sync + 'static,
{
    // The layered cache swallows all backend errors as misses (§4.1), so it
    // never reports a failure state here — the store pool and providers are
    // the only things that can actually take this endpoint down.
    let store_healthy = state.store.health_check().await.is_ok();
    let providers_healthy = !state.orchestrator.any_provider_configured()
        || state.orchestrator.primary_available()
        || state.orchestrator.fallback_available();

    let healthy = store_healthy && providers_healthy;
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(HealthResponse { status: if healthy { "ok" } else { "degraded" } })).into_response()
}

#[derive(Debug, Serialize)]
struct StatuszResponse {
    cache: CacheStatus,
    store: StoreStatus,
    providers: ProviderStatus,
}

#[derive(Debug, Serialize)]
struct CacheStatus {
    backend: &'static str,
    hits: u64,
    misses: u64,
    sets: u64,
    deletes: u64,
    hit_rate: f64,
}

#[derive(Debug, Serialize)]
struct StoreStatus {
    status: PoolStatus,
    pool_size: u32,
    idle_connections: u32,
    waiting_requests: u64,
    pool_utilization: f64,
}

#[derive(Debug, Serialize)]
struct ProviderStatus {
    primary_available: bool,
    fallback_available: bool,
}

/// Detailed component breakdown (§6: "a detailed variant ... returns
/// per-component status objects").
async fn statusz_handler<S, E, B, Pr, Fb, L>(State(state): State<HandlerState<S, E, B, Pr, Fb, L>>) -> Response
where
    S: RetrievalStoreClient + Send + Sync + 'static,
    E: EmbedProvider + Send + Sync + 'static,
    B: CacheBackend + Send + Sync + 'static,
    L: SpecialtyLookupProvider + Send + Sync + 'static,
    Pr: RerankProvider + Send + Sync + 'static,
    Fb: RerankProvider + Send + Sync + 'static,
{
    let cache_stats = state.orchestrator.cache_stats();
    let store_health = state.store.health_check().await;

    let body = StatuszResponse {
        cache: CacheStatus {
            backend: state.orchestrator.cache_backend_label(),
            hits: cache_stats.hits,
            misses: cache_stats.misses,
            sets: cache_stats.sets,
            deletes: cache_stats.deletes,
            hit_rate: cache_stats.hit_rate(),
        },
        store: match store_health {
            Ok(health) => StoreStatus {
                status: health.status,
                pool_size: health.pool_size,
                idle_connections: health.idle_connections,
                waiting_requests: health.waiting_requests,
                pool_utilization: health.pool_utilization,
            },
            Err(_) => StoreStatus {
                status: PoolStatus::Degraded,
                pool_size: 0,
                idle_connections: 0,
                waiting_requests: 0,
                pool_utilization: 0.0,
            },
        },
        providers: ProviderStatus {
            primary_available: state.orchestrator.primary_available(),
            fallback_available: state.orchestrator.fallback_available(),
        },
    };

    Json(body).into_response()
}
