//! Cross-cutting, shared constants.
//!
//! Every value here is a documented default; the corresponding environment variable
//! (see [`crate::config`]) overrides it at startup. Prefer deriving secondary constants
//! from primary ones to avoid drift.

/// RRF smoothing constant `k` in `1/(k+rank)`.
pub const DEFAULT_RRF_K: u32 = 60;

/// Over-retrieval factor applied to `limit` for each retrieval branch.
pub const DEFAULT_OVER_RETRIEVAL_FACTOR: u32 = 3;

/// Bounded concurrency for the secondary-store fallback fetch in candidate materialization.
pub const DEFAULT_MATERIALIZE_FALLBACK_CONCURRENCY: usize = 8;

/// Cap on non-blocking key scans (`scanKeys`).
pub const DEFAULT_SCAN_MAX: usize = 1000;

/// Base TTL (seconds) for the `SearchResults` cache layer.
pub const TTL_SEARCH_RESULTS_SECS: u64 = 600;
/// Base TTL (seconds) for the `RerankScores` cache layer.
pub const TTL_RERANK_SCORES_SECS: u64 = 21_600;
/// Base TTL (seconds) for the `SpecialtyLookup` cache layer (no jitter).
pub const TTL_SPECIALTY_LOOKUP_SECS: u64 = 86_400;
/// Base TTL (seconds) for the `Embedding` (query) cache layer.
pub const TTL_EMBEDDING_SECS: u64 = 3_600;

/// Proportional jitter applied to TTLs that opt in (±20%).
pub const TTL_JITTER_FRACTION: f64 = 0.20;

/// Default in-process L1 cache capacity (entry count).
pub const DEFAULT_L1_CAPACITY: u64 = 10_000;

/// Default retrieval store pool sizing.
pub const DEFAULT_POOL_MAX_CONNECTIONS: u32 = 20;
pub const DEFAULT_POOL_MIN_CONNECTIONS: u32 = 5;
pub const DEFAULT_POOL_CONNECTION_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_POOL_STATEMENT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_POOL_IDLE_TIMEOUT_MS: u64 = 60_000;

/// Pool health degrades (warns) once waiters exceed this count.
pub const POOL_WAITERS_WARN_THRESHOLD: u64 = 5;
/// Pool health reports `degraded` once waiters exceed this count.
pub const POOL_WAITERS_DEGRADED_THRESHOLD: u64 = 10;

/// Rerank orchestrator hard caps (§4.5).
pub const DEFAULT_MAX_CANDIDATES: usize = 50;
pub const DEFAULT_MIN_CANDIDATES: usize = 1;
pub const DEFAULT_REQUEST_LIMIT: usize = 20;
pub const DEFAULT_REASON_LIMIT: usize = 3;
pub const DEFAULT_MAX_PROMPT_CHARACTERS: usize = 16_000;
pub const DEFAULT_MAX_HIGHLIGHTS: usize = 5;
pub const DEFAULT_MAX_SKILLS: usize = 20;

/// Request-level SLA defaults.
pub const DEFAULT_SLA_TARGET_MS: u64 = 850;
pub const DEFAULT_SLOW_LOG_MS: u64 = 1_000;
/// Allowed deadline overrun before a response is considered late (§8 property 4).
pub const DEADLINE_GRACE_MS: u64 = 50;

/// Budget-aware provider call bounds (§4.4).
pub const PROVIDER_MIN_EFFECTIVE_TIMEOUT_MS: u64 = 100;
/// Below this remaining budget, the provider is not called at all.
pub const PROVIDER_CALL_ABORT_THRESHOLD_MS: u64 = 50;
/// Extra slack added on top of the effective timeout for the hard wall-clock deadline.
pub const PROVIDER_HARD_TIMEOUT_PAD_MS: u64 = 50;

/// Per-provider circuit breaker defaults.
pub const DEFAULT_CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_CIRCUIT_COOLDOWN_MS: u64 = 30_000;
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_PROVIDER_RETRIES: u32 = 2;
pub const DEFAULT_PROVIDER_RETRY_DELAY_MS: u64 = 200;

/// Default embedding vector dimension used for dimension-agreement checks across
/// the retrieval store and embed-provider clients. Concrete providers may differ;
/// [`validate_embedding_dim`] exists precisely to catch that at the boundary rather
/// than downstream.
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Runtime dimension configuration for modules that must agree on vector size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimConfig {
    /// The embedding vector dimension (number of floats).
    pub embedding_dim: usize,
}

impl Default for DimConfig {
    fn default() -> Self {
        Self {
            embedding_dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl DimConfig {
    /// Creates a new dimension configuration with the specified embedding dimension.
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    /// Validates that this configuration is internally consistent.
    pub fn validate(&self) -> Result<(), DimValidationError> {
        if self.embedding_dim == 0 {
            return Err(DimValidationError::ZeroDimension);
        }
        Ok(())
    }
}

/// Error returned when dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {}, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// Use this at module boundaries (retrieval store client construction, embed-provider
/// client construction) to catch mismatches early rather than downstream.
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if actual == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
