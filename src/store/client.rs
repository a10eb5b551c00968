//! Connection-pooled access to the pgvector + full-text relational store (§4.2).

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pgvector::Vector;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Pool, Postgres, Row};

use crate::config::{Config, IndexType};
use crate::constants::{self, DimConfig, validate_embedding_dim};

use super::RetrievalStoreError;
use super::model::{CandidateProfile, PoolHealth, StoreHit};

/// Primitive operations against the relational store.
///
/// Methods return `impl Future + Send` rather than using `async_trait` so
/// callers pay no extra boxed-future allocation per call — mirrors the
/// vector-db client trait this component replaces.
pub trait RetrievalStoreClient: Send + Sync {
    /// Approximate nearest-neighbor search over `search.candidate_embeddings`.
    fn vector_search(
        &self,
        tenant_id: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<StoreHit>, RetrievalStoreError>> + Send;

    /// Full-text search over `search.candidate_profiles.search_document`.
    fn text_search(
        &self,
        tenant_id: &str,
        text_query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<StoreHit>, RetrievalStoreError>> + Send;

    /// Batch profile fetch by candidate id, from the primary profile store.
    fn fetch_profiles(
        &self,
        tenant_id: &str,
        candidate_ids: &[String],
    ) -> impl Future<Output = Result<Vec<CandidateProfile>, RetrievalStoreError>> + Send;

    /// Pool + index health snapshot.
    fn health_check(&self) -> impl Future<Output = Result<PoolHealth, RetrievalStoreError>> + Send;

    /// Best-effort warmup of `min` pool connections at startup.
    fn warmup_pool(&self) -> impl Future<Output = ()> + Send;
}

/// `RetrievalStoreClient` backed by a `sqlx` Postgres pool with `pgvector`.
#[derive(Clone)]
pub struct PgRetrievalStoreClient {
    pool: Pool<Postgres>,
    index_type: IndexType,
    hnsw_ef_search: u32,
    diskann_search_list_size: u32,
    pool_min: u32,
    waiting_requests: Arc<AtomicU64>,
    dim_config: DimConfig,
}

impl PgRetrievalStoreClient {
    /// Builds the pool from `config` using the pool-tuning defaults in §4.2.
    ///
    /// `statement_timeout` is applied per-connection via `after_connect`
    /// rather than per-query, so every statement issued over a pooled
    /// connection (including the index knob in [`Self::acquire_tuned`])
    /// inherits the same wall-clock budget (§4.2 "statement timeout").
    pub async fn connect(config: &Config) -> Result<Self, RetrievalStoreError> {
        let statement_timeout_ms = config.pgvector_statement_timeout_ms;
        let pool = PgPoolOptions::new()
            .max_connections(config.pgvector_pool_max)
            .min_connections(config.pgvector_pool_min)
            .acquire_timeout(Duration::from_millis(config.pgvector_connection_timeout_ms))
            .idle_timeout(Duration::from_millis(config.pgvector_idle_timeout_ms))
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query(&format!("SET statement_timeout = {statement_timeout_ms}"))
                        .execute(conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(&config.pgvector_url)
            .await
            .map_err(RetrievalStoreError::PoolAcquire)?;

        Ok(Self {
            pool,
            index_type: config.pgvector_index_type,
            hnsw_ef_search: config.hnsw_ef_search,
            diskann_search_list_size: config.diskann_search_list_size,
            pool_min: config.pgvector_pool_min,
            waiting_requests: Arc::new(AtomicU64::new(0)),
            dim_config: DimConfig::new(config.embedding_dim),
        })
    }

    /// Acquires a connection, tracking waiters for the health signal, and
    /// applies the active index variant's session knob before handing the
    /// connection back. The knob is scoped to this single connection use;
    /// callers must not reuse a knobbed connection across queries with a
    /// different variant (the pool never mixes variants at runtime, since
    /// `index_type` is fixed for the process lifetime).
    async fn acquire_tuned(&self) -> Result<sqlx::pool::PoolConnection<Postgres>, RetrievalStoreError> {
        self.waiting_requests.fetch_add(1, Ordering::Relaxed);
        let result = self.pool.acquire().await;
        self.waiting_requests.fetch_sub(1, Ordering::Relaxed);
        let mut conn = result.map_err(RetrievalStoreError::PoolAcquire)?;

        let knob = match self.index_type {
            IndexType::Hnsw => format!("SET hnsw.ef_search = {}", self.hnsw_ef_search),
            IndexType::DiskAnn => format!("SET diskann.search_list_size = {}", self.diskann_search_list_size),
        };
        sqlx::query(&knob)
            .execute(&mut *conn)
            .await
            .map_err(classify_query_error)?;

        Ok(conn)
    }

    fn row_to_hit(row: PgRow, id_col: &str, score_col: &str) -> Result<StoreHit, RetrievalStoreError> {
        Ok(StoreHit {
            candidate_id: row.try_get(id_col).map_err(classify_query_error)?,
            score: row.try_get(score_col).map_err(classify_query_error)?,
        })
    }
}

/// Maps a raw `sqlx::Error` to [`RetrievalStoreError`], distinguishing a
/// statement cancelled by the session's `statement_timeout` (Postgres
/// SQLSTATE `57014`, `query_canceled`) from any other query failure so
/// callers can retry the former via [`RetrievalStoreError::retryable`].
fn classify_query_error(error: sqlx::Error) -> RetrievalStoreError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.code().as_deref() == Some("57014") {
            return RetrievalStoreError::Timeout;
        }
    }
    RetrievalStoreError::Query(error)
}

impl RetrievalStoreClient for PgRetrievalStoreClient {
    async fn vector_search(
        &self,
        tenant_id: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<StoreHit>, RetrievalStoreError> {
        if query_embedding.is_empty() {
            return Ok(Vec::new());
        }
        validate_embedding_dim(query_embedding.len(), self.dim_config.embedding_dim)?;

        let mut conn = self.acquire_tuned().await?;
        let vector = Vector::from(query_embedding.to_vec());

        let rows = sqlx::query(
            "SELECT entity_id AS candidate_id, 1.0 - (embedding <=> $1) AS score \
             FROM search.candidate_embeddings \
             WHERE tenant_id = $2 \
             ORDER BY embedding <=> $1 \
             LIMIT $3",
        )
        .bind(vector)
        .bind(tenant_id)
        .bind(limit as i64)
        .fetch_all(&mut *conn)
        .await
        .map_err(classify_query_error)?;

        rows.into_iter()
            .map(|row| Self::row_to_hit(row, "candidate_id", "score"))
            .collect()
    }

    async fn text_search(
        &self,
        tenant_id: &str,
        text_query: &str,
        limit: usize,
    ) -> Result<Vec<StoreHit>, RetrievalStoreError> {
        if text_query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT candidate_id, ts_rank(search_document, plainto_tsquery('english', $1)) AS score \
             FROM search.candidate_profiles \
             WHERE tenant_id = $2 AND search_document @@ plainto_tsquery('english', $1) \
             ORDER BY score DESC \
             LIMIT $3",
        )
        .bind(text_query)
        .bind(tenant_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(classify_query_error)?;

        rows.into_iter()
            .map(|row| Self::row_to_hit(row, "candidate_id", "score"))
            .collect()
    }

    async fn fetch_profiles(
        &self,
        tenant_id: &str,
        candidate_ids: &[String],
    ) -> Result<Vec<CandidateProfile>, RetrievalStoreError> {
        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT candidate_id, tenant_id, profile \
             FROM search.candidate_profiles \
             WHERE tenant_id = $1 AND candidate_id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(candidate_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(classify_query_error)?;

        rows.into_iter()
            .map(|row| {
                let payload: serde_json::Value = row.try_get("profile").map_err(classify_query_error)?;
                Ok(CandidateProfile {
                    candidate_id: row.try_get("candidate_id").map_err(classify_query_error)?,
                    tenant_id: row.try_get("tenant_id").map_err(classify_query_error)?,
                    summary: payload.get("summary").and_then(|v| v.as_str()).map(str::to_string),
                    highlights: json_string_array(&payload, "highlights"),
                    skills: json_string_array(&payload, "skills"),
                    years_experience: payload.get("yearsExperience").and_then(|v| v.as_f64()),
                    current_title: payload
                        .get("currentTitle")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    location: payload.get("location").and_then(|v| v.as_str()).map(str::to_string),
                    payload,
                })
            })
            .collect()
    }

    async fn health_check(&self) -> Result<PoolHealth, RetrievalStoreError> {
        let pool_size = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        let waiting = self.waiting_requests.load(Ordering::Relaxed);

        if waiting > constants::POOL_WAITERS_WARN_THRESHOLD {
            tracing::warn!(waiting_requests = waiting, "retrieval store pool under pressure");
        }

        Ok(PoolHealth::from_counts(pool_size, idle, waiting, self.index_type))
    }

    async fn warmup_pool(&self) {
        let mut handles = Vec::with_capacity(self.pool_min as usize);
        for _ in 0..self.pool_min {
            let pool = self.pool.clone();
            handles.push(tokio::spawn(async move {
                match pool.acquire().await {
                    Ok(mut conn) => {
                        let _ = sqlx::query("SELECT 1").execute(&mut *conn).await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "retrieval store warmup connection failed");
                    }
                }
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

fn json_string_array(value: &serde_json::Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    //! A deterministic in-memory [`RetrievalStoreClient`] for orchestrator and
    //! retriever tests — no network, no database.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Fixture-driven mock store: returns pre-seeded vector/text hits and
    /// profiles regardless of the actual query content.
    #[derive(Default)]
    pub struct MockStoreClient {
        pub vector_hits: Mutex<HashMap<String, Vec<StoreHit>>>,
        pub text_hits: Mutex<HashMap<String, Vec<StoreHit>>>,
        pub profiles: Mutex<HashMap<String, CandidateProfile>>,
    }

    impl MockStoreClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed_vector_hits(&self, tenant_id: &str, hits: Vec<StoreHit>) {
            self.vector_hits.lock().unwrap().insert(tenant_id.to_string(), hits);
        }

        pub fn seed_text_hits(&self, tenant_id: &str, hits: Vec<StoreHit>) {
            self.text_hits.lock().unwrap().insert(tenant_id.to_string(), hits);
        }

        pub fn seed_profile(&self, profile: CandidateProfile) {
            self.profiles.lock().unwrap().insert(profile.candidate_id.clone(), profile);
        }
    }

    impl RetrievalStoreClient for MockStoreClient {
        async fn vector_search(
            &self,
            tenant_id: &str,
            query_embedding: &[f32],
            limit: usize,
        ) -> Result<Vec<StoreHit>, RetrievalStoreError> {
            if query_embedding.is_empty() {
                return Ok(Vec::new());
            }
            let mut hits = self.vector_hits.lock().unwrap().get(tenant_id).cloned().unwrap_or_default();
            hits.truncate(limit);
            Ok(hits)
        }

        async fn text_search(
            &self,
            tenant_id: &str,
            text_query: &str,
            limit: usize,
        ) -> Result<Vec<StoreHit>, RetrievalStoreError> {
            if text_query.trim().is_empty() {
                return Ok(Vec::new());
            }
            let mut hits = self.text_hits.lock().unwrap().get(tenant_id).cloned().unwrap_or_default();
            hits.truncate(limit);
            Ok(hits)
        }

        async fn fetch_profiles(
            &self,
            _tenant_id: &str,
            candidate_ids: &[String],
        ) -> Result<Vec<CandidateProfile>, RetrievalStoreError> {
            let profiles = self.profiles.lock().unwrap();
            Ok(candidate_ids.iter().filter_map(|id| profiles.get(id).cloned()).collect())
        }

        async fn health_check(&self) -> Result<PoolHealth, RetrievalStoreError> {
            Ok(PoolHealth::from_counts(5, 5, 0, IndexType::Hnsw))
        }

        async fn warmup_pool(&self) {}
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockStoreClient;
    use super::*;

    #[tokio::test]
    async fn test_vector_search_empty_embedding_short_circuits() {
        let client = MockStoreClient::new();
        client.seed_vector_hits("t1", vec![StoreHit { candidate_id: "c1".into(), score: 0.9 }]);
        let hits = client.vector_search("t1", &[], 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_text_search_empty_query_short_circuits() {
        let client = MockStoreClient::new();
        client.seed_text_hits("t1", vec![StoreHit { candidate_id: "c1".into(), score: 0.9 }]);
        let hits = client.text_search("t1", "   ", 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_profiles_only_returns_seeded_ids() {
        let client = MockStoreClient::new();
        client.seed_profile(CandidateProfile {
            candidate_id: "c1".into(),
            tenant_id: "t1".into(),
            payload: serde_json::json!({}),
            summary: None,
            highlights: vec![],
            skills: vec![],
            years_experience: None,
            current_title: None,
            location: None,
        });

        let profiles = client
            .fetch_profiles("t1", &["c1".to_string(), "c2".to_string()])
            .await
            .unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].candidate_id, "c1");
    }

    #[test]
    fn test_pool_health_degrades_over_threshold() {
        let health = PoolHealth::from_counts(20, 5, 11, IndexType::Hnsw);
        assert_eq!(health.status, super::super::model::PoolStatus::Degraded);

        let healthy = PoolHealth::from_counts(20, 5, 3, IndexType::Hnsw);
        assert_eq!(healthy.status, super::super::model::PoolStatus::Healthy);
    }
}
