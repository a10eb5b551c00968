//! Environment-backed configuration (§6a).
//!
//! Every variable is optional with a documented, sane default so the process
//! starts with zero configuration: in-memory-equivalent cache settings
//! pointing at `localhost`, and passthrough-only reranking if no provider API
//! key is present. Parsing failures produce a [`ConfigError`] naming the
//! offending variable and raw value; [`Config::validate`] performs cross-field
//! and filesystem-independent sanity checks before the server binds a socket.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;

use crate::constants;

/// Which ANN index variant the retrieval store client targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    /// In-memory hierarchical small-world graph (`pgvector` HNSW).
    Hnsw,
    /// Disk-resident quantized graph (DiskANN-style).
    DiskAnn,
}

impl IndexType {
    pub(crate) fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "hnsw" => Ok(IndexType::Hnsw),
            "diskann" => Ok(IndexType::DiskAnn),
            other => Err(ConfigError::InvalidIndexType {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for IndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexType::Hnsw => write!(f, "hnsw"),
            IndexType::DiskAnn => write!(f, "diskann"),
        }
    }
}

/// Per-provider LLM rerank client configuration (`PRIMARY_*` / `FALLBACK_*`).
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub circuit_failure_threshold: u32,
    pub circuit_cooldown_ms: u64,
    pub enabled: bool,
}

impl ProviderConfig {
    fn from_env(env_prefix: &'static str, default_base_url: &str, default_model: &str) -> Result<Self, ConfigError> {
        let api_key = parse_optional_string_from_env(&format!("{env_prefix}_API_KEY"));
        let base_url = parse_string_from_env(&format!("{env_prefix}_BASE_URL"), default_base_url.to_string());
        let model = parse_string_from_env(&format!("{env_prefix}_MODEL"), default_model.to_string());
        let timeout_ms = parse_u64_from_env(
            &format!("{env_prefix}_TIMEOUT_MS"),
            constants::DEFAULT_PROVIDER_TIMEOUT_MS,
        )?;
        let retries = parse_u32_from_env(&format!("{env_prefix}_RETRIES"), constants::DEFAULT_PROVIDER_RETRIES)?;
        let retry_delay_ms = parse_u64_from_env(
            &format!("{env_prefix}_RETRY_DELAY_MS"),
            constants::DEFAULT_PROVIDER_RETRY_DELAY_MS,
        )?;
        let circuit_failure_threshold = parse_u32_from_env(
            &format!("{env_prefix}_CB_FAILURES"),
            constants::DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
        )?;
        let circuit_cooldown_ms = parse_u64_from_env(
            &format!("{env_prefix}_CB_COOLDOWN_MS"),
            constants::DEFAULT_CIRCUIT_COOLDOWN_MS,
        )?;
        // A provider with no API key configured defaults to disabled, unless the
        // caller explicitly forces it on (useful for providers that authenticate
        // some other way, e.g. a local sidecar).
        let default_enabled = api_key.is_some();
        let enabled = parse_bool_from_env(&format!("{env_prefix}_ENABLE"), default_enabled)?;

        Ok(Self {
            api_key,
            base_url,
            model,
            timeout_ms,
            retries,
            retry_delay_ms,
            circuit_failure_threshold,
            circuit_cooldown_ms,
            enabled,
        })
    }
}

/// Process-wide configuration loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,

    pub sla_target_ms: u64,
    pub slow_log_ms: u64,

    pub max_candidates: usize,
    pub min_candidates: usize,
    pub default_limit: usize,
    pub reason_limit: usize,

    pub max_prompt_characters: usize,
    pub max_highlights: usize,
    pub max_skills: usize,

    pub enable_fallback: bool,

    pub embed_base_url: String,
    pub embed_model: String,
    /// Expected query-embedding dimension, enforced at the embed-provider and
    /// retrieval-store boundaries via [`crate::constants::validate_embedding_dim`].
    pub embedding_dim: usize,

    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    pub redis_tls: bool,
    pub cache_key_prefix: String,
    /// Overrides every cache layer's base TTL uniformly when set; per-layer
    /// relative TTLs (§4.1) are otherwise fixed defaults.
    pub cache_ttl_override_secs: Option<u64>,
    pub cache_disable: bool,
    pub l1_capacity: u64,

    pub primary_provider: ProviderConfig,
    pub fallback_provider: ProviderConfig,

    pub pgvector_index_type: IndexType,
    pub hnsw_ef_search: u32,
    pub diskann_search_list_size: u32,
    pub pgvector_url: String,
    pub pgvector_pool_max: u32,
    pub pgvector_pool_min: u32,
    pub pgvector_connection_timeout_ms: u64,
    pub pgvector_statement_timeout_ms: u64,
    pub pgvector_idle_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),

            sla_target_ms: constants::DEFAULT_SLA_TARGET_MS,
            slow_log_ms: constants::DEFAULT_SLOW_LOG_MS,

            max_candidates: constants::DEFAULT_MAX_CANDIDATES,
            min_candidates: constants::DEFAULT_MIN_CANDIDATES,
            default_limit: constants::DEFAULT_REQUEST_LIMIT,
            reason_limit: constants::DEFAULT_REASON_LIMIT,

            max_prompt_characters: constants::DEFAULT_MAX_PROMPT_CHARACTERS,
            max_highlights: constants::DEFAULT_MAX_HIGHLIGHTS,
            max_skills: constants::DEFAULT_MAX_SKILLS,

            enable_fallback: true,

            embed_base_url: "http://localhost:9000".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            embedding_dim: constants::DEFAULT_EMBEDDING_DIM,

            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_password: None,
            redis_tls: false,
            cache_key_prefix: "talent-rerank".to_string(),
            cache_ttl_override_secs: None,
            cache_disable: false,
            l1_capacity: constants::DEFAULT_L1_CAPACITY,

            primary_provider: ProviderConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_ms: constants::DEFAULT_PROVIDER_TIMEOUT_MS,
                retries: constants::DEFAULT_PROVIDER_RETRIES,
                retry_delay_ms: constants::DEFAULT_PROVIDER_RETRY_DELAY_MS,
                circuit_failure_threshold: constants::DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
                circuit_cooldown_ms: constants::DEFAULT_CIRCUIT_COOLDOWN_MS,
                enabled: false,
            },
            fallback_provider: ProviderConfig {
                api_key: None,
                base_url: "https://api.anthropic.com/v1".to_string(),
                model: "claude-3-haiku".to_string(),
                timeout_ms: constants::DEFAULT_PROVIDER_TIMEOUT_MS,
                retries: constants::DEFAULT_PROVIDER_RETRIES,
                retry_delay_ms: constants::DEFAULT_PROVIDER_RETRY_DELAY_MS,
                circuit_failure_threshold: constants::DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
                circuit_cooldown_ms: constants::DEFAULT_CIRCUIT_COOLDOWN_MS,
                enabled: false,
            },

            pgvector_index_type: IndexType::Hnsw,
            hnsw_ef_search: 100,
            diskann_search_list_size: 100,
            pgvector_url: "postgres://localhost:5432/talent".to_string(),
            pgvector_pool_max: constants::DEFAULT_POOL_MAX_CONNECTIONS,
            pgvector_pool_min: constants::DEFAULT_POOL_MIN_CONNECTIONS,
            pgvector_connection_timeout_ms: constants::DEFAULT_POOL_CONNECTION_TIMEOUT_MS,
            pgvector_statement_timeout_ms: constants::DEFAULT_POOL_STATEMENT_TIMEOUT_MS,
            pgvector_idle_timeout_ms: constants::DEFAULT_POOL_IDLE_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// documented defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_port_from_env("SEARCH_PORT", defaults.port)?;
        let bind_addr = parse_bind_addr_from_env("SEARCH_BIND_ADDR", defaults.bind_addr)?;

        let sla_target_ms = parse_u64_from_env("RERANK_SLA_TARGET_MS", defaults.sla_target_ms)?;
        let slow_log_ms = parse_u64_from_env("RERANK_SLOW_LOG_MS", defaults.slow_log_ms)?;

        let max_candidates = parse_usize_from_env("RERANK_MAX_CANDIDATES", defaults.max_candidates)?;
        let min_candidates = parse_usize_from_env("RERANK_MIN_CANDIDATES", defaults.min_candidates)?;
        let default_limit = parse_usize_from_env("RERANK_DEFAULT_LIMIT", defaults.default_limit)?;
        let reason_limit = parse_usize_from_env("RERANK_REASON_LIMIT", defaults.reason_limit)?;

        let max_prompt_characters =
            parse_usize_from_env("RERANK_MAX_PROMPT_CHARACTERS", defaults.max_prompt_characters)?;
        let max_highlights = parse_usize_from_env("RERANK_MAX_HIGHLIGHTS", defaults.max_highlights)?;
        let max_skills = parse_usize_from_env("RERANK_MAX_SKILLS", defaults.max_skills)?;

        let enable_fallback = parse_bool_from_env("RERANK_ENABLE_FALLBACK", defaults.enable_fallback)?;

        let embed_base_url = parse_string_from_env("EMBED_BASE_URL", defaults.embed_base_url);
        let embed_model = parse_string_from_env("EMBED_MODEL", defaults.embed_model);
        let embedding_dim = parse_usize_from_env("EMBED_DIMENSION", defaults.embedding_dim)?;

        let redis_host = parse_string_from_env("REDIS_HOST", defaults.redis_host);
        let redis_port = parse_port_from_env("REDIS_PORT", defaults.redis_port)?;
        let redis_password = parse_optional_string_from_env("REDIS_PASSWORD");
        let redis_tls = parse_bool_from_env("REDIS_TLS", defaults.redis_tls)?;
        let cache_key_prefix = parse_string_from_env("RERANK_REDIS_PREFIX", defaults.cache_key_prefix);
        let cache_ttl_override_secs = parse_optional_u64_from_env("RERANK_CACHE_TTL_SECONDS")?;
        let cache_disable = parse_bool_from_env("RERANK_CACHE_DISABLE", defaults.cache_disable)?;
        let l1_capacity = parse_u64_from_env("RERANK_L1_CAPACITY", defaults.l1_capacity)?;

        let primary_provider = ProviderConfig::from_env(
            "PRIMARY",
            &defaults.primary_provider.base_url,
            &defaults.primary_provider.model,
        )?;
        let fallback_provider = ProviderConfig::from_env(
            "FALLBACK",
            &defaults.fallback_provider.base_url,
            &defaults.fallback_provider.model,
        )?;

        let pgvector_index_type = match env::var("PGVECTOR_INDEX_TYPE") {
            Ok(value) => IndexType::parse(&value)?,
            Err(_) => defaults.pgvector_index_type,
        };
        let hnsw_ef_search = parse_u32_from_env("HNSW_EF_SEARCH", defaults.hnsw_ef_search)?;
        let diskann_search_list_size =
            parse_u32_from_env("DISKANN_SEARCH_LIST_SIZE", defaults.diskann_search_list_size)?;
        let pgvector_url = parse_string_from_env("PGVECTOR_URL", defaults.pgvector_url);
        let pgvector_pool_max = parse_u32_from_env("PGVECTOR_POOL_MAX", defaults.pgvector_pool_max)?;
        let pgvector_pool_min = parse_u32_from_env("PGVECTOR_POOL_MIN", defaults.pgvector_pool_min)?;
        let pgvector_connection_timeout_ms = parse_u64_from_env(
            "PGVECTOR_CONNECTION_TIMEOUT_MS",
            defaults.pgvector_connection_timeout_ms,
        )?;
        let pgvector_statement_timeout_ms = parse_u64_from_env(
            "PGVECTOR_STATEMENT_TIMEOUT_MS",
            defaults.pgvector_statement_timeout_ms,
        )?;
        let pgvector_idle_timeout_ms =
            parse_u64_from_env("PGVECTOR_IDLE_TIMEOUT_MS", defaults.pgvector_idle_timeout_ms)?;

        Ok(Self {
            port,
            bind_addr,
            sla_target_ms,
            slow_log_ms,
            max_candidates,
            min_candidates,
            default_limit,
            reason_limit,
            max_prompt_characters,
            max_highlights,
            max_skills,
            enable_fallback,
            embed_base_url,
            embed_model,
            embedding_dim,
            redis_host,
            redis_port,
            redis_password,
            redis_tls,
            cache_key_prefix,
            cache_ttl_override_secs,
            cache_disable,
            l1_capacity,
            primary_provider,
            fallback_provider,
            pgvector_index_type,
            hnsw_ef_search,
            diskann_search_list_size,
            pgvector_url,
            pgvector_pool_max,
            pgvector_pool_min,
            pgvector_connection_timeout_ms,
            pgvector_statement_timeout_ms,
            pgvector_idle_timeout_ms,
        })
    }

    /// Cross-field sanity checks that don't require touching the filesystem
    /// or network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_candidates == 0 {
            return Err(ConfigError::CrossField {
                message: "RERANK_MIN_CANDIDATES must be at least 1".to_string(),
            });
        }
        if self.min_candidates > self.max_candidates {
            return Err(ConfigError::CrossField {
                message: format!(
                    "RERANK_MIN_CANDIDATES ({}) must not exceed RERANK_MAX_CANDIDATES ({})",
                    self.min_candidates, self.max_candidates
                ),
            });
        }
        if self.pgvector_pool_min > self.pgvector_pool_max {
            return Err(ConfigError::CrossField {
                message: format!(
                    "PGVECTOR_POOL_MIN ({}) must not exceed PGVECTOR_POOL_MAX ({})",
                    self.pgvector_pool_min, self.pgvector_pool_max
                ),
            });
        }
        if self.reason_limit == 0 {
            return Err(ConfigError::CrossField {
                message: "RERANK_REASON_LIMIT must be at least 1".to_string(),
            });
        }
        if self.embedding_dim == 0 {
            return Err(ConfigError::CrossField {
                message: "EMBED_DIMENSION must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The address the gateway binds to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// The Redis connection URL built from `REDIS_HOST/PORT/PASSWORD/TLS`.
    pub fn redis_url(&self) -> String {
        let scheme = if self.redis_tls { "rediss" } else { "redis" };
        match &self.redis_password {
            Some(password) => format!(
                "{scheme}://:{password}@{}:{}",
                self.redis_host, self.redis_port
            ),
            None => format!("{scheme}://{}:{}", self.redis_host, self.redis_port),
        }
    }
}

fn parse_port_from_env(var_name: &'static str, default: u16) -> Result<u16, ConfigError> {
    match env::var(var_name) {
        Ok(value) => {
            let port: u16 = value.parse().map_err(|_| ConfigError::InvalidPort {
                name: var_name,
                value: value.clone(),
            })?;
            if port == 0 {
                return Err(ConfigError::InvalidPort { name: var_name, value });
            }
            Ok(port)
        }
        Err(_) => Ok(default),
    }
}

fn parse_bind_addr_from_env(var_name: &'static str, default: IpAddr) -> Result<IpAddr, ConfigError> {
    match env::var(var_name) {
        Ok(value) => value
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr { value, source }),
        Err(_) => Ok(default),
    }
}

fn parse_string_from_env(var_name: &str, default: String) -> String {
    env::var(var_name).unwrap_or(default)
}

fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
    env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_u64_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var_name) {
        Ok(value) => value.parse().map_err(|e: std::num::ParseIntError| ConfigError::ParseFailure {
            name: var_name,
            value,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_optional_u64_from_env(var_name: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => {
            let parsed = value.parse().map_err(|e: std::num::ParseIntError| ConfigError::ParseFailure {
                name: var_name,
                value,
                reason: e.to_string(),
            })?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

fn parse_u32_from_env(var_name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(var_name) {
        Ok(value) => value.parse().map_err(|e: std::num::ParseIntError| ConfigError::ParseFailure {
            name: var_name,
            value,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_usize_from_env(var_name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(var_name) {
        Ok(value) => value.parse().map_err(|e: std::num::ParseIntError| ConfigError::ParseFailure {
            name: var_name,
            value,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var_name) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::ParseFailure {
                name: var_name,
                value: other.to_string(),
                reason: "expected a boolean (true/false/1/0/yes/no/on/off)".to_string(),
            }),
        },
        Err(_) => Ok(default),
    }
}
