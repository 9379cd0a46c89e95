//! Deterministic backends for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Embedding, EmbeddingBackend, RerankBackend, RetrievalBackendError};

/// Embeds each text as the vector of the first keyword it contains.
///
/// Matching is case-insensitive substring search in registration order.
/// Texts without a keyword get the fallback vector.
#[derive(Debug)]
pub struct KeywordEmbeddingBackend {
    keywords: Vec<(String, Embedding)>,
    fallback: Embedding,
    calls: AtomicUsize,
}

impl KeywordEmbeddingBackend {
    pub fn new(fallback: Embedding) -> Self {
        Self {
            keywords: Vec::new(),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>, vector: Embedding) -> Self {
        self.keywords.push((keyword.into().to_lowercase(), vector));
        self
    }

    /// Number of `embed` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn vector_for(&self, text: &str) -> Embedding {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl EmbeddingBackend for KeywordEmbeddingBackend {
    fn model_name(&self) -> &str {
        "mock-keyword-embedding"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, RetrievalBackendError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Returns the same scores on every call, regardless of the documents.
#[derive(Debug)]
pub struct FixedScoreReranker {
    scores: Vec<f32>,
    calls: AtomicUsize,
}

impl FixedScoreReranker {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `score` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RerankBackend for FixedScoreReranker {
    fn model_name(&self) -> &str {
        "mock-fixed-rerank"
    }

    async fn score(&self, _query: &str, _documents: &[String]) -> Result<Vec<f32>, RetrievalBackendError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.scores.clone())
    }
}

/// Keeps the incoming order by scoring documents `n, n-1, ..., 1`.
#[derive(Debug, Default)]
pub struct PassthroughReranker;

#[async_trait]
impl RerankBackend for PassthroughReranker {
    fn model_name(&self) -> &str {
        "mock-passthrough-rerank"
    }

    async fn score(&self, _query: &str, documents: &[String]) -> Result<Vec<f32>, RetrievalBackendError> {
        let n = documents.len();
        Ok((0..n).map(|i| (n - i) as f32).collect())
    }
}

/// Fails every call, as either backend.
#[derive(Debug)]
pub struct FailingBackend {
    status: Option<u16>,
    calls: AtomicUsize,
}

impl FailingBackend {
    /// Fail with a network error
    pub fn network() -> Self {
        Self {
            status: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail with an API error carrying `status`
    pub fn api(status: u16) -> Self {
        Self {
            status: Some(status),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn fail(&self) -> RetrievalBackendError {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.status {
            Some(status) => RetrievalBackendError::Api {
                status,
                message: "mock backend failure".to_string(),
            },
            None => RetrievalBackendError::Network("mock backend unreachable".to_string()),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for FailingBackend {
    fn model_name(&self) -> &str {
        "mock-failing"
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Embedding>, RetrievalBackendError> {
        Err(self.fail())
    }
}

#[async_trait]
impl RerankBackend for FailingBackend {
    fn model_name(&self) -> &str {
        "mock-failing"
    }

    async fn score(&self, _query: &str, _documents: &[String]) -> Result<Vec<f32>, RetrievalBackendError> {
        Err(self.fail())
    }
}
