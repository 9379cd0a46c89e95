//! Embedding and rerank backends behind a small facade.
//!
//! Backends are narrow capabilities: [`EmbeddingBackend`] turns texts into
//! vectors and [`RerankBackend`] scores documents against a query. The
//! [`EmbeddingService`] facade validates what they return, computes cosine
//! similarity, and applies the ordering and truncation rules rerank results
//! follow.
//!
//! The [`mock`] module holds deterministic stand-ins for tests and offline use.

mod facade;
mod http;
pub mod mock;

pub(crate) use facade::sort_by_score_desc;
pub use facade::{cosine_similarity, cosine_similarity_matrix, EmbeddingService, Ranked, RerankCandidate};
pub use http::{HttpEmbeddingBackend, HttpRerankBackend};

use async_trait::async_trait;
use thiserror::Error;

/// A dense embedding vector
pub type Embedding = Vec<f32>;

/// Produces one embedding per input text.
///
/// Implementations must return rows in input order, all with the same,
/// backend-defined dimensionality.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync + std::fmt::Debug {
    /// Model identifier, for logging
    fn model_name(&self) -> &str;

    /// Embed a batch of texts
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, RetrievalBackendError>;
}

/// Scores documents for relevance to a query.
///
/// Scores are returned in document order. Their scale is arbitrary; only the
/// relative order within one call is meaningful.
#[async_trait]
pub trait RerankBackend: Send + Sync + std::fmt::Debug {
    /// Model identifier, for logging
    fn model_name(&self) -> &str;

    /// Score each document against `query`
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RetrievalBackendError>;
}

/// Errors raised by embedding and rerank backends
#[derive(Debug, Error)]
pub enum RetrievalBackendError {
    /// Network or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response from the backend
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// Backend returned a different number of rows than inputs
    #[error("Backend returned {actual} results for {expected} inputs")]
    ResponseLength { expected: usize, actual: usize },

    /// Embedding rows disagree on dimensionality
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl RetrievalBackendError {
    /// Whether retrying the same call might succeed
    ///
    /// Network failures, rate limiting (429) and server errors (5xx) are
    /// transient; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            RetrievalBackendError::Network(_) => true,
            RetrievalBackendError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RetrievalBackendError {
    fn from(err: reqwest::Error) -> Self {
        // A request that could not be built (bad URL, bad header) will never succeed
        if err.is_builder() {
            return RetrievalBackendError::Other(err.to_string());
        }
        if err.is_decode() {
            return RetrievalBackendError::Parse(err.to_string());
        }
        match err.status() {
            Some(status) => RetrievalBackendError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => RetrievalBackendError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RetrievalBackendError {
    fn from(err: serde_json::Error) -> Self {
        RetrievalBackendError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RetrievalBackendError::Network("reset".into()).is_transient());
        assert!(RetrievalBackendError::Api {
            status: 429,
            message: String::new()
        }
        .is_transient());
        assert!(RetrievalBackendError::Api {
            status: 502,
            message: String::new()
        }
        .is_transient());
        assert!(!RetrievalBackendError::Api {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!RetrievalBackendError::Parse("bad".into()).is_transient());
        assert!(!RetrievalBackendError::ResponseLength {
            expected: 2,
            actual: 1
        }
        .is_transient());
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<Vec<f32>>("not json").unwrap_err();
        assert!(matches!(RetrievalBackendError::from(err), RetrievalBackendError::Parse(_)));
    }
}
