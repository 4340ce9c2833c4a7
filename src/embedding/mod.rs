//! Embedding client abstraction and retry policy.

pub mod http;
pub mod retry;

pub use http::HttpEmbeddingClient;
pub use retry::{Sleeper, TokioSleeper, embed_with_retry};

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Provider asked the client to slow down.
    #[error("Embedding service rate limited the request")]
    RateLimited,
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with an unexpected status code.
    #[error("Unexpected embedding response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider returned no vector for the input.
    #[error("Embedding service returned no vector")]
    MissingVector,
    /// Returned vector length does not match the configured dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured for the pipeline.
        expected: usize,
        /// Dimension actually returned by the provider.
        actual: usize,
    },
    /// Input was empty after normalization; nothing to embed.
    #[error("Nothing to embed after normalization")]
    EmptyInput,
}

impl EmbeddingError {
    /// Whether this failure is a rate-limit signal that deserves a longer backoff.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce a fixed-length embedding vector for the supplied text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Collapse newlines to spaces and trim, matching what the provider expects.
pub fn normalize_for_embedding(text: &str) -> String {
    text.replace(['\n', '\r'], " ").trim().to_string()
}
