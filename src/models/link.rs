//! Reference linking request and result models.

use serde::{Deserialize, Serialize};

use super::paper::BibliographyEntry;

/// How a query was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// The query carried citation markers which were resolved directly
    Snippet,
    /// The query was free text matched against paragraphs
    Topic,
}

impl std::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkMode::Snippet => write!(f, "snippet"),
            LinkMode::Topic => write!(f, "topic"),
        }
    }
}

/// A bibliography entry annotated with a relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedReference {
    pub ref_id: String,

    pub full_citation: String,

    /// 1.0 for direct marker matches; the best paragraph rerank score in topic mode
    pub score: f32,
}

impl LinkedReference {
    pub fn new(entry: &BibliographyEntry, score: f32) -> Self {
        Self {
            ref_id: entry.ref_id.clone(),
            full_citation: entry.full_citation.clone(),
            score,
        }
    }
}

/// Result of linking a query against a paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkResponse {
    pub mode: LinkMode,

    pub references: Vec<LinkedReference>,
}

impl LinkResponse {
    pub fn new(mode: LinkMode, references: Vec<LinkedReference>) -> Self {
        Self { mode, references }
    }

    /// Marker ids in result order
    pub fn ref_ids(&self) -> Vec<&str> {
        self.references.iter().map(|r| r.ref_id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}
