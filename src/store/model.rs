//! Wire/row types for the retrieval store client.

use serde::{Deserialize, Serialize};

/// A single hit from either the vector or the lexical branch, before fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreHit {
    pub candidate_id: String,
    /// Raw similarity/rank score in `[0, 1]`, as produced by the store.
    pub score: f64,
}

/// A candidate profile row materialized from the primary (or secondary
/// fallback) profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate_id: String,
    pub tenant_id: String,
    /// Free-form profile payload passed through opaquely to the response.
    pub payload: serde_json::Value,
    pub summary: Option<String>,
    pub highlights: Vec<String>,
    pub skills: Vec<String>,
    pub years_experience: Option<f64>,
    pub current_title: Option<String>,
    pub location: Option<String>,
}

/// Health snapshot returned by [`crate::store::RetrievalStoreClient::health_check`]
/// (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolHealth {
    pub status: PoolStatus,
    pub pool_size: u32,
    pub idle_connections: u32,
    pub waiting_requests: u64,
    pub pool_utilization: f64,
    pub index_type: crate::config::IndexType,
}

/// Coarse health classification (§4.2: degrades to `Degraded` when
/// `waitingRequests > 10`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    Healthy,
    Degraded,
}

impl PoolHealth {
    pub fn from_counts(
        pool_size: u32,
        idle_connections: u32,
        waiting_requests: u64,
        index_type: crate::config::IndexType,
    ) -> Self {
        let utilization = if pool_size == 0 {
            0.0
        } else {
            (pool_size - idle_connections) as f64 / pool_size as f64
        };
        let status = if waiting_requests > crate::constants::POOL_WAITERS_DEGRADED_THRESHOLD {
            PoolStatus::Degraded
        } else {
            PoolStatus::Healthy
        };
        Self {
            status,
            pool_size,
            idle_connections,
            waiting_requests,
            pool_utilization: utilization,
            index_type,
        }
    }
}
