//! Reference linking: map a query to the bibliography entries it concerns.
//!
//! A query that itself contains citation markers (`"As in [1] we do X."`) is
//! resolved directly against the bibliography. Any other query is treated as
//! a topic: paragraphs are prefiltered by embedding similarity, reranked, and
//! the references cited by the surviving paragraphs are returned ordered by
//! the best rerank score among the paragraphs citing them.
//!
//! Backend failures propagate unchanged; retrying is the caller's business
//! (see [`crate::utils::with_retry`]).

use std::collections::{HashMap, HashSet};

use crate::models::{
    BibliographyEntry, LinkMode, LinkResponse, LinkedReference, ParagraphElement, StructuredPaper,
};
use crate::parsing::{extract_citation_keys, has_citation_markers};
use crate::retrieval::{
    cosine_similarity_matrix, sort_by_score_desc, EmbeddingService, Ranked, RetrievalBackendError,
};

/// Default number of paragraphs kept by prefilter and rerank
pub const DEFAULT_TOP_K: usize = 8;

/// Score given to references resolved directly from query markers
pub const SNIPPET_SCORE: f32 = 1.0;

/// Links queries to bibliography entries of a [`StructuredPaper`]
#[derive(Debug, Clone)]
pub struct ReferenceLinker {
    service: EmbeddingService,
}

impl ReferenceLinker {
    pub fn new(service: EmbeddingService) -> Self {
        Self { service }
    }

    /// Decide the mode for `query` without doing any work
    pub fn mode_for(query: &str) -> LinkMode {
        if has_citation_markers(query) {
            LinkMode::Snippet
        } else {
            LinkMode::Topic
        }
    }

    /// Find the bibliography entries `query` refers to
    ///
    /// Never mutates `paper`. Unresolvable markers are skipped. An empty
    /// bibliography always yields an empty result without backend calls.
    pub async fn link(
        &self,
        paper: &StructuredPaper,
        query: &str,
        top_k: usize,
    ) -> Result<LinkResponse, RetrievalBackendError> {
        match Self::mode_for(query) {
            LinkMode::Snippet => {
                let markers = extract_citation_keys(query);
                tracing::debug!("Snippet mode: {} markers in query", markers.len());
                Ok(LinkResponse::new(
                    LinkMode::Snippet,
                    resolve_markers(paper, &markers),
                ))
            }
            LinkMode::Topic => {
                tracing::debug!("Topic mode for query {:?}", query);
                let references = self.link_topic(paper, query, top_k).await?;
                Ok(LinkResponse::new(LinkMode::Topic, references))
            }
        }
    }

    async fn link_topic(
        &self,
        paper: &StructuredPaper,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<LinkedReference>, RetrievalBackendError> {
        let index = paper.bibliography_index();
        let paragraphs: Vec<&ParagraphElement> = paper.paragraphs().collect();

        let cites_anything = paragraphs
            .iter()
            .flat_map(|p| p.citation_keys())
            .any(|key| index.contains_key(key));
        if top_k == 0 || !cites_anything {
            tracing::debug!(
                "Nothing to link: top_k={}, {} bibliography entries, {} paragraphs",
                top_k,
                index.len(),
                paragraphs.len()
            );
            return Ok(Vec::new());
        }

        let candidates = self.prefilter(query, paragraphs, top_k).await?;
        tracing::debug!("Prefilter kept {} paragraphs", candidates.len());

        let reranked = self.service.rerank(query, candidates, top_k).await?;
        Ok(aggregate_references(&reranked, &index))
    }

    /// Top `top_k` paragraphs by cosine similarity to the query
    async fn prefilter<'a>(
        &self,
        query: &str,
        paragraphs: Vec<&'a ParagraphElement>,
        top_k: usize,
    ) -> Result<Vec<&'a ParagraphElement>, RetrievalBackendError> {
        // Query and paragraphs go out in one batch; row 0 is the query
        let texts: Vec<String> = std::iter::once(query.to_string())
            .chain(paragraphs.iter().map(|p| p.text.clone()))
            .collect();
        let rows = self.service.embed_texts(&texts).await?;
        let (query_row, paragraph_rows) = rows.split_at(1);

        let similarities = cosine_similarity_matrix(query_row, paragraph_rows);
        let mut ranked: Vec<Ranked<&ParagraphElement>> = paragraphs
            .into_iter()
            .zip(similarities.into_iter().flatten())
            .map(|(item, score)| Ranked { item, score })
            .collect();

        sort_by_score_desc(&mut ranked);
        ranked.truncate(top_k);

        Ok(ranked.into_iter().map(|r| r.item).collect())
    }
}

/// Resolve query markers in order of first appearance, once each
fn resolve_markers(paper: &StructuredPaper, markers: &[String]) -> Vec<LinkedReference> {
    let index = paper.bibliography_index();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut references = Vec::new();

    for marker in markers {
        if !seen.insert(marker.as_str()) {
            continue;
        }
        match index.get(marker.as_str()) {
            Some(entry) => references.push(LinkedReference::new(entry, SNIPPET_SCORE)),
            None => tracing::debug!("Marker {} has no bibliography entry", marker),
        }
    }

    references
}

/// Union the citations of reranked paragraphs, scored by best paragraph
///
/// Ties keep the order in which references were first met while walking the
/// reranked paragraphs.
fn aggregate_references(
    reranked: &[Ranked<&ParagraphElement>],
    index: &HashMap<&str, &BibliographyEntry>,
) -> Vec<LinkedReference> {
    let mut references: Vec<Ranked<&BibliographyEntry>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for paragraph in reranked {
        for key in paragraph.item.citation_keys() {
            let Some(entry) = index.get(key) else {
                continue;
            };
            match positions.get(key) {
                Some(&pos) => {
                    let best = &mut references[pos].score;
                    if paragraph.score > *best {
                        *best = paragraph.score;
                    }
                }
                None => {
                    positions.insert(entry.ref_id.as_str(), references.len());
                    references.push(Ranked {
                        item: *entry,
                        score: paragraph.score,
                    });
                }
            }
        }
    }

    sort_by_score_desc(&mut references);
    references
        .into_iter()
        .map(|r| LinkedReference::new(r.item, r.score))
        .collect()
}
