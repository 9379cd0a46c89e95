//! HTTP embedding and rerank backends.
//!
//! The embedding backend speaks the OpenAI-compatible `/embeddings` shape.
//! The rerank backend speaks the `{query, documents}` shape used by
//! text-embeddings-inference, Cohere and Jina style rerank servers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Embedding, EmbeddingBackend, RerankBackend, RetrievalBackendError};
use crate::config::BackendConfig;
use crate::utils::HttpClient;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Embedding,
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankRow>,
}

#[derive(Debug, Deserialize)]
struct RerankRow {
    index: usize,
    #[serde(alias = "score")]
    relevance_score: f32,
}

/// Put `(index, value)` pairs back into input order
///
/// Every index in `0..expected` must appear exactly once.
fn reorder<T>(expected: usize, rows: Vec<(usize, T)>) -> Result<Vec<T>, RetrievalBackendError> {
    if rows.len() != expected {
        return Err(RetrievalBackendError::ResponseLength {
            expected,
            actual: rows.len(),
        });
    }

    let mut slots: Vec<Option<T>> = (0..expected).map(|_| None).collect();
    for (index, value) in rows {
        let Some(slot) = slots.get_mut(index) else {
            return Err(RetrievalBackendError::Parse(format!(
                "Result index {} out of range for {} inputs",
                index, expected
            )));
        };
        if slot.replace(value).is_some() {
            return Err(RetrievalBackendError::Parse(format!(
                "Duplicate result index {}",
                index
            )));
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| RetrievalBackendError::Parse(format!("Missing result index {}", i)))
        })
        .collect()
}

/// Send a request and decode a JSON body, mapping non-success statuses
async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    endpoint: &str,
) -> Result<T, RetrievalBackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| match RetrievalBackendError::from(e) {
            RetrievalBackendError::Network(message) => {
                RetrievalBackendError::Network(format!("Request to {} failed: {}", endpoint, message))
            }
            other => other,
        })?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        tracing::warn!("Backend {} returned status {}", endpoint, status);
        return Err(RetrievalBackendError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| RetrievalBackendError::Parse(format!("Failed to parse JSON from {}: {}", endpoint, e)))
}

/// Embedding backend over an OpenAI-compatible HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpEmbeddingBackend {
    client: HttpClient,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbeddingBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self, RetrievalBackendError> {
        Ok(Self {
            client: HttpClient::new(config.timeout())?,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, RetrievalBackendError> {
        tracing::debug!("POST {} ({} texts)", self.endpoint, texts.len());

        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let request = self
            .client
            .post_json(&self.endpoint, &body, self.api_key.as_deref());
        let response: EmbeddingResponse = send_json(request, &self.endpoint).await?;

        reorder(
            texts.len(),
            response
                .data
                .into_iter()
                .map(|row| (row.index, row.embedding))
                .collect(),
        )
    }
}

/// Cross-encoder rerank backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpRerankBackend {
    client: HttpClient,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpRerankBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self, RetrievalBackendError> {
        Ok(Self {
            client: HttpClient::new(config.timeout())?,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl RerankBackend for HttpRerankBackend {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RetrievalBackendError> {
        tracing::debug!("POST {} ({} documents)", self.endpoint, documents.len());

        let body = RerankRequest {
            model: &self.model,
            query,
            documents,
        };
        let request = self
            .client
            .post_json(&self.endpoint, &body, self.api_key.as_deref());
        let response: RerankResponse = send_json(request, &self.endpoint).await?;

        reorder(
            documents.len(),
            response
                .results
                .into_iter()
                .map(|row| (row.index, row.relevance_score))
                .collect(),
        )
    }
}
