//! Validating facade over the embedding and rerank backends.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{Embedding, EmbeddingBackend, RerankBackend, RetrievalBackendError};
use crate::models::ParagraphElement;

/// Lower bound for vector norms in cosine similarity
const MIN_NORM: f32 = 1e-12;

/// Anything that can be sent to the rerank backend as a document
pub trait RerankCandidate {
    fn rerank_text(&self) -> &str;
}

impl RerankCandidate for ParagraphElement {
    fn rerank_text(&self) -> &str {
        &self.text
    }
}

impl RerankCandidate for String {
    fn rerank_text(&self) -> &str {
        self
    }
}

impl RerankCandidate for str {
    fn rerank_text(&self) -> &str {
        self
    }
}

impl<T: RerankCandidate + ?Sized> RerankCandidate for &T {
    fn rerank_text(&self) -> &str {
        (**self).rerank_text()
    }
}

/// A candidate with the relevance score the reranker gave it
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub item: T,
    pub score: f32,
}

/// Cosine similarity of two vectors
///
/// Norms are clamped away from zero, so a zero vector has similarity 0 with
/// everything. Components beyond the shorter vector are ignored.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt().max(MIN_NORM);
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt().max(MIN_NORM);
    dot / (norm_a * norm_b)
}

/// Pairwise cosine similarity, shape `(a.len(), b.len())`
pub fn cosine_similarity_matrix(a: &[Embedding], b: &[Embedding]) -> Vec<Vec<f32>> {
    a.iter()
        .map(|row| b.iter().map(|col| cosine_similarity(row, col)).collect())
        .collect()
}

/// Sort descending by score, keeping input order on ties. NaN sorts last.
pub(crate) fn sort_by_score_desc<T>(items: &mut [Ranked<T>]) {
    items.sort_by(|a, b| {
        sortable(b.score)
            .partial_cmp(&sortable(a.score))
            .unwrap_or(Ordering::Equal)
    });
}

fn sortable(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

/// Batch embedding and candidate reranking over injected backends
#[derive(Debug, Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn EmbeddingBackend>,
    reranker: Arc<dyn RerankBackend>,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn EmbeddingBackend>, reranker: Arc<dyn RerankBackend>) -> Self {
        Self { embedder, reranker }
    }

    /// Embed texts in one backend call
    ///
    /// Returns exactly one row per input, in input order, all of equal
    /// dimensionality. An empty input returns an empty matrix without calling
    /// the backend.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Embedding>, RetrievalBackendError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            "Embedding {} texts with {}",
            texts.len(),
            self.embedder.model_name()
        );
        let rows = self.embedder.embed(texts).await?;

        if rows.len() != texts.len() {
            return Err(RetrievalBackendError::ResponseLength {
                expected: texts.len(),
                actual: rows.len(),
            });
        }

        let dim = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != dim) {
            return Err(RetrievalBackendError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }

        Ok(rows)
    }

    /// Rerank candidates against `query`
    ///
    /// Returns at most `top_k` candidates, strictly ordered by descending
    /// score with ties kept in candidate order. Empty candidates or `top_k`
    /// of zero return an empty result without calling the backend.
    pub async fn rerank<T: RerankCandidate>(
        &self,
        query: &str,
        candidates: Vec<T>,
        top_k: usize,
    ) -> Result<Vec<Ranked<T>>, RetrievalBackendError> {
        if candidates.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let documents: Vec<String> = candidates
            .iter()
            .map(|c| c.rerank_text().to_string())
            .collect();

        tracing::debug!(
            "Reranking {} candidates with {}",
            documents.len(),
            self.reranker.model_name()
        );
        let scores = self.reranker.score(query, &documents).await?;

        if scores.len() != candidates.len() {
            return Err(RetrievalBackendError::ResponseLength {
                expected: candidates.len(),
                actual: scores.len(),
            });
        }

        let mut ranked: Vec<Ranked<T>> = candidates
            .into_iter()
            .zip(scores)
            .map(|(item, score)| Ranked { item, score })
            .collect();
        sort_by_score_desc(&mut ranked);
        ranked.truncate(top_k);

        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::mock::{FailingBackend, FixedScoreReranker, KeywordEmbeddingBackend};

    fn service_with_scores(scores: Vec<f32>) -> (EmbeddingService, Arc<FixedScoreReranker>) {
        let reranker = Arc::new(FixedScoreReranker::new(scores));
        let service = EmbeddingService::new(
            Arc::new(KeywordEmbeddingBackend::new(vec![0.0, 1.0])),
            reranker.clone(),
        );
        (service, reranker)
    }

    #[test]
    fn test_cosine_orthogonal_and_identical() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[0.6, 0.8], &[0.6, 0.8]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let sim = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]);
        assert_eq!(sim, 0.0);
        assert!(!cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]).is_nan());
    }

    #[test]
    fn test_cosine_matrix_shape() {
        let a = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
        let b = vec![vec![1.0, 0.0], vec![0.0, 0.0]];
        let sim = cosine_similarity_matrix(&a, &b);

        assert_eq!(sim.len(), 3);
        assert!(sim.iter().all(|row| row.len() == 2));
        assert_eq!(sim[0][0], 1.0);
        assert_eq!(sim[1][0], 0.0);
        assert_eq!(sim[2][1], 0.0);
    }

    #[tokio::test]
    async fn test_rerank_truncation() {
        let (service, _) = service_with_scores(vec![0.1, 0.9, 0.5]);
        let candidates = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let ranked = service.rerank("q", candidates, 2).await.unwrap();
        let scores: Vec<f32> = ranked.iter().map(|r| r.score).collect();
        let items: Vec<&str> = ranked.iter().map(|r| r.item.as_str()).collect();

        assert_eq!(scores, vec![0.9, 0.5]);
        assert_eq!(items, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_rerank_ties_keep_candidate_order() {
        let (service, _) = service_with_scores(vec![0.5, 0.7, 0.5, f32::NAN]);
        let candidates = vec!["a", "b", "c", "d"];

        let ranked = service.rerank("q", candidates, 10).await.unwrap();
        let items: Vec<&str> = ranked.iter().map(|r| r.item).collect();
        assert_eq!(items, vec!["b", "a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_rerank_empty_skips_backend() {
        let (service, reranker) = service_with_scores(vec![1.0]);

        for top_k in [0, 1, 8] {
            let ranked = service.rerank("q", Vec::<String>::new(), top_k).await.unwrap();
            assert!(ranked.is_empty());
        }
        assert_eq!(reranker.calls(), 0);
    }

    #[tokio::test]
    async fn test_rerank_length_mismatch() {
        let (service, _) = service_with_scores(vec![0.3]);
        let err = service
            .rerank("q", vec!["a".to_string(), "b".to_string()], 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrievalBackendError::ResponseLength {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_embed_texts_one_row_per_input() {
        let embedder = KeywordEmbeddingBackend::new(vec![0.0, 0.0, 1.0])
            .with_keyword("cat", vec![1.0, 0.0, 0.0])
            .with_keyword("dog", vec![0.0, 1.0, 0.0]);
        let service = EmbeddingService::new(
            Arc::new(embedder),
            Arc::new(FixedScoreReranker::new(Vec::new())),
        );

        let texts = vec!["a dog".to_string(), "fish".to_string(), "cat".to_string()];
        let rows = service.embed_texts(&texts).await.unwrap();
        assert_eq!(
            rows,
            vec![vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0]]
        );

        assert!(service.embed_texts(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embed_dimension_mismatch() {
        let embedder = KeywordEmbeddingBackend::new(vec![0.0, 1.0]).with_keyword("odd", vec![1.0]);
        let service = EmbeddingService::new(
            Arc::new(embedder),
            Arc::new(FixedScoreReranker::new(Vec::new())),
        );

        let texts = vec!["even".to_string(), "odd".to_string()];
        let err = service.embed_texts(&texts).await.unwrap_err();
        assert!(matches!(err, RetrievalBackendError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let service = EmbeddingService::new(Arc::new(FailingBackend::network()), Arc::new(FailingBackend::network()));
        let err = service.embed_texts(&["x".to_string()]).await.unwrap_err();
        assert!(err.is_transient());

        let err = service.rerank("q", vec!["x"], 1).await.unwrap_err();
        assert!(matches!(err, RetrievalBackendError::Network(_)));
    }
}
