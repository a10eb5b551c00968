//! Thin client for the external query-embedding provider.
//!
//! The embedding provider is explicitly out of scope (§1): the core never
//! generates embeddings for stored candidates and only ever asks this
//! collaborator for a single query-time vector. This module specifies just
//! that interface, plus an HTTP implementation and a deterministic mock for
//! tests.

mod error;

pub use error::EmbedError;

use std::future::Future;

use crate::constants::{DimConfig, validate_embedding_dim};

/// Produces a query embedding for hybrid retrieval's vector branch.
pub trait EmbedProvider: Send + Sync {
    /// Embeds `text`, returning an empty vector only if the provider
    /// explicitly reports "no embedding available" — callers treat an empty
    /// vector as "skip the vector branch" (§4.3 edge cases), never as an
    /// error.
    fn embed_query(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbedError>> + Send;
}

/// HTTP-backed [`EmbedProvider`].
#[derive(Clone)]
pub struct HttpEmbedProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dim_config: DimConfig,
}

impl HttpEmbedProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_dim_config(client, base_url, model, DimConfig::default())
    }

    /// Builds a provider that validates every non-empty response against
    /// `dim_config.embedding_dim` — catches a model/config drift at the
    /// embed-provider boundary rather than downstream in vector search.
    pub fn with_dim_config(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        dim_config: DimConfig,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            dim_config,
        }
    }
}

#[derive(serde::Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(serde::Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl EmbedProvider for HttpEmbedProvider {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&EmbedRequest { input: text, model: &self.model })
            .send()
            .await
            .map_err(EmbedError::Transport)?;

        if !response.status().is_success() {
            return Err(EmbedError::Status(response.status().as_u16()));
        }

        let body: EmbedResponse = response.json().await.map_err(EmbedError::Decode)?;
        if !body.embedding.is_empty() {
            validate_embedding_dim(body.embedding.len(), self.dim_config.embedding_dim)?;
        }
        Ok(body.embedding)
    }
}

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns a pre-seeded vector for a given query text, or an empty vector
    /// (simulating "no embedding") for unseeded text.
    #[derive(Default)]
    pub struct MockEmbedProvider {
        pub vectors: Mutex<HashMap<String, Vec<f32>>>,
        pub fail: Mutex<bool>,
    }

    impl MockEmbedProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed(&self, text: &str, vector: Vec<f32>) {
            self.vectors.lock().unwrap().insert(text.to_string(), vector);
        }

        pub fn set_fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }
    }

    impl EmbedProvider for MockEmbedProvider {
        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            if *self.fail.lock().unwrap() {
                return Err(EmbedError::Status(503));
            }
            Ok(self.vectors.lock().unwrap().get(text).cloned().unwrap_or_default())
        }
    }
}
