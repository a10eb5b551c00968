//! # Talent Rerank
//!
//! Multi-tenant candidate-search pipeline: hybrid dense+lexical retrieval
//! over a pgvector-backed store, an LLM reranker with circuit-breaker
//! fallback and passthrough degradation, and a multi-layer TTL-jittered
//! cache with tenant isolation and request-coalescing stampede protection.
//!
//! ```text
//! Request → Hybrid Retriever (vector + text, RRF fusion) → Rerank Orchestrator
//!            (cache → primary LLM → fallback LLM → passthrough) → Response
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use talent_rerank::Config;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("listening on {}:{}", config.bind_addr, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Purpose |
//! |---------|---------|
//! | `mock` | Mock store/embed/rerank backends for tests and downstream integration tests |
//!
//! ## Modules
//!
//! - [`store`] - pgvector-backed retrieval store client (C1)
//! - [`embed`] - query embedding provider (C2)
//! - [`retrieval`] - Hybrid Retriever: dense + lexical fusion (C3)
//! - [`rerank`] - LLM rerank provider clients, circuit-breaker guarded (C4)
//! - [`orchestrator`] - Rerank Orchestrator state machine (C5)
//! - [`cache`] - multi-layer TTL-jittered cache with tenant isolation (C6)
//! - [`gateway`] - HTTP surface (Axum): search/rerank RPCs, health/status
//! - [`config`] - environment-backed configuration
//! - [`lifecycle`] - process shutdown coordination

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;
pub mod config;
pub mod constants;
pub mod embed;
pub mod gateway;
pub mod hashing;
pub mod lifecycle;
pub mod orchestrator;
pub mod rerank;
pub mod retrieval;
pub mod store;

pub use cache::{CacheBackend, CacheError, CacheLayer, CacheStats, LayeredCache, NoopBackend, RedisBackend};

pub use config::{Config, ConfigError, IndexType, ProviderConfig};
pub use constants::{DimConfig, DimValidationError, validate_embedding_dim};

pub use embed::{EmbedError, EmbedProvider, HttpEmbedProvider};
#[cfg(any(test, feature = "mock"))]
pub use embed::mock::MockEmbedProvider;

pub use gateway::{GatewayError, HandlerState, create_router};

pub use hashing::{
    hash_docset, hash_job_description, hash_prompt, hash_rerank_descriptor, hash_tenant_id, hash_to_u64,
};

pub use lifecycle::shutdown_signal;

pub use orchestrator::{
    CandidateFeatures, OrchestratorError, OrchestratorMetadata, OrchestratorOutcome, OrchestratorRequest,
    OrchestratorTimings, ProviderSource, PromptLimits, RerankCandidateInput, RerankOrchestrator,
};

pub use rerank::{HttpRerankProvider, RerankCandidate, RerankProvider, RerankProviderError, RerankRequest, RerankResponse, RerankResult};
#[cfg(any(test, feature = "mock"))]
pub use rerank::mock::MockRerankProvider;

pub use retrieval::{
    FusedCandidate, HybridRetriever, NoopSpecialtyLookup, RetrievalCandidate, RetrievalError, RetrievalFilters,
    RetrievalOutcome, RetrievalTimings, SpecialtyLookupProvider,
};

#[cfg(any(test, feature = "mock"))]
pub use store::MockStoreClient;
pub use store::{CandidateProfile, PgRetrievalStoreClient, PoolHealth, PoolStatus, RetrievalStoreClient, RetrievalStoreError, StoreHit};
