//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}' for {name}: must be between 1 and 65535")]
    InvalidPort { name: &'static str, value: String },

    /// An environment variable could not be parsed as the expected type.
    #[error("failed to parse {name}='{value}': {reason}")]
    ParseFailure {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// `PGVECTOR_INDEX_TYPE` was set to something other than `hnsw`/`diskann`.
    #[error("invalid index type '{value}': expected 'hnsw' or 'diskann'")]
    InvalidIndexType { value: String },

    /// A cross-field invariant was violated (e.g. pool min > pool max).
    #[error("invalid configuration: {message}")]
    CrossField { message: String },
}
