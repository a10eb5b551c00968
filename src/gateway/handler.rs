//! Axum handlers for the search/rerank HTTP surface (§6).

use std::time::{Duration, Instant};

use axum::Json;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use tracing::{info, instrument, warn};

use crate::cache::CacheBackend;
use crate::config::Config;
use crate::embed::EmbedProvider;
use crate::orchestrator::{OrchestratorRequest, RerankCandidateInput};
use crate::rerank::RerankProvider;
use crate::retrieval::{RetrievalFilters, SpecialtyLookupProvider};
use crate::store::RetrievalStoreClient;

use super::error::GatewayError;
use super::payload::{RerankRequestPayload, RerankResponsePayload, SearchRequestPayload, SearchResponsePayload};
use super::state::HandlerState;

const MIN_JOB_DESCRIPTION_CHARS: usize = 20;
const MAX_JOB_DESCRIPTION_CHARS: usize = 20_000;
const MIN_WIRE_CANDIDATES: usize = 1;
const MAX_WIRE_CANDIDATES: usize = 200;
const MIN_WIRE_LIMIT: usize = 1;
const MAX_WIRE_LIMIT: usize = 200;

fn validate_job_description(job_description: &str) -> Result<(), GatewayError> {
    let len = job_description.chars().count();
    if !(MIN_JOB_DESCRIPTION_CHARS..=MAX_JOB_DESCRIPTION_CHARS).contains(&len) {
        return Err(GatewayError::BadRequest(format!(
            "jobDescription must be {MIN_JOB_DESCRIPTION_CHARS}..{MAX_JOB_DESCRIPTION_CHARS} characters, got {len}"
        )));
    }
    Ok(())
}

fn validate_limit(limit: Option<usize>, default: usize) -> Result<usize, GatewayError> {
    let limit = limit.unwrap_or(default);
    if !(MIN_WIRE_LIMIT..=MAX_WIRE_LIMIT).contains(&limit) {
        return Err(GatewayError::BadRequest(format!("limit must be {MIN_WIRE_LIMIT}..{MAX_WIRE_LIMIT}, got {limit}")));
    }
    Ok(limit)
}

#[instrument(skip(state, payload), fields(request_id = tracing::field::Empty, tenant_id = tracing::field::Empty))]
pub async fn rerank_handler<S, E, B, Pr, Fb, L>(
    State(state): State<HandlerState<S, E, B, Pr, Fb, L>>,
    Json(payload): Json<RerankRequestPayload>,
) -> Result<Response, GatewayError>
where
    S: RetrievalStoreClient + Send + Sync + 'static,
    E: EmbedProvider + Send + Sync + 'static,
    B: CacheBackend + Send + Sync + 'static,
    L: SpecialtyLookupProvider + Send + Sync + 'static,
    Pr: RerankProvider + Send + Sync + 'static,
    Fb: RerankProvider + Send + Sync + 'static,
{
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();
    tracing::Span::current().record("request_id", request_id.as_str());

    validate_job_description(&payload.job_description)?;

    if !(MIN_WIRE_CANDIDATES..=MAX_WIRE_CANDIDATES).contains(&payload.candidates.len()) {
        return Err(GatewayError::BadRequest(format!(
            "candidates must contain {MIN_WIRE_CANDIDATES}..{MAX_WIRE_CANDIDATES} entries, got {}",
            payload.candidates.len()
        )));
    }

    let limit = validate_limit(payload.limit, state.config.default_limit)?;

    // §6 request payload has no tenantId field for the rerank RPC; requests
    // are isolated by the caller's own auth boundary upstream of this gateway
    // (out of scope here, §1), so a fixed pseudo-tenant namespaces the cache
    // the same way a real per-tenant token would.
    let tenant_id = "default".to_string();
    tracing::Span::current().record("tenant_id", tenant_id.as_str());

    let candidates: Vec<RerankCandidateInput> = payload.candidates.into_iter().map(Into::into).collect();

    let deadline = Instant::now() + Duration::from_millis(state.config.sla_target_ms);
    let orchestrator_request = OrchestratorRequest {
        request_id: request_id.clone(),
        tenant_id,
        job_description: payload.job_description,
        candidates,
        limit,
        disable_cache: payload.disable_cache,
        include_reasons: payload.include_reasons,
        deadline,
    };

    let outcome = state.orchestrator.rerank(orchestrator_request).await?;

    let total_ms = start.elapsed().as_millis() as u64;
    if total_ms > state.config.slow_log_ms {
        warn!(total_ms, %request_id, "slow rerank request");
    }
    info!(
        %request_id,
        provider = ?outcome.metadata.provider,
        cache_hit = outcome.cache_hit,
        used_fallback = outcome.used_fallback,
        total_ms,
        candidate_count = outcome.metadata.candidate_count,
        "rerank request completed"
    );

    let server_timing = format!(
        "total;dur={},provider;dur={},prompt;dur={},cache;dur={}",
        outcome.timings.total_ms,
        outcome.timings.provider_ms.unwrap_or(0),
        outcome.timings.prompt_ms.unwrap_or(0),
        outcome.timings.cache_ms.unwrap_or(0),
    );

    let mut response = Json(RerankResponsePayload::from(outcome)).into_response();
    if let Ok(value) = HeaderValue::from_str(&server_timing) {
        response.headers_mut().insert("Server-Timing", value);
    }
    Ok(response)
}

#[instrument(skip(state, payload), fields(tenant_id = %payload.tenant_id))]
pub async fn search_handler<S, E, B, Pr, Fb, L>(
    State(state): State<HandlerState<S, E, B, Pr, Fb, L>>,
    Json(payload): Json<SearchRequestPayload>,
) -> Result<Response, GatewayError>
where
    S: RetrievalStoreClient + Send + Sync + 'static,
    E: EmbedProvider + Send + Sync + 'static,
    B: CacheBackend + Send + Sync + 'static,
    L: SpecialtyLookupProvider + Send + Sync + 'static,
    Pr: RerankProvider + Send + Sync + 'static,
    Fb: RerankProvider + Send + Sync + 'static,
{
    validate_job_description(&payload.job_description)?;
    let limit = validate_limit(payload.limit, state.config.default_limit)?;

    let filters = RetrievalFilters { required_skills: payload.required_skills, seniority: payload.seniority };

    let outcome = state
        .retriever
        .retrieve(&payload.tenant_id, &payload.job_description, &payload.job_description, &filters, limit, payload.disable_cache)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

    Ok(Json(SearchResponsePayload::from(outcome)).into_response())
}
