//! Compose segmentation and citation extraction into a [`StructuredPaper`].

use thiserror::Error;

use crate::config::SegmenterConfig;
use crate::models::{BibliographyEntry, PageText, ParagraphElement, Section, StructuredPaper};
use crate::utils::deduplicate_bibliography;

use super::segmenter::segment;

/// Number given to the single section produced without heading detection
pub const BODY_SECTION_NUMBER: &str = "1";

/// Title given to the single section produced without heading detection
pub const BODY_SECTION_TITLE: &str = "Full Text";

/// Errors raised while structuring a document
#[derive(Debug, Error)]
pub enum StructuringError {
    /// Segmentation produced no chunks: every page was empty or whitespace
    #[error("Document has no usable text content ({pages} pages supplied)")]
    NoUsableText { pages: usize },
}

/// Turns per-page text into a one-section [`StructuredPaper`]
///
/// Each chunk becomes a paragraph whose citations are extracted from its own
/// text. No heading inference happens here.
#[derive(Debug, Clone)]
pub struct PaperStructurer {
    max_chunk_chars: usize,
    overlap: usize,
}

impl Default for PaperStructurer {
    fn default() -> Self {
        Self::from_config(&SegmenterConfig::default())
    }
}

impl PaperStructurer {
    pub fn new(max_chunk_chars: usize, overlap: usize) -> Self {
        Self {
            max_chunk_chars,
            overlap,
        }
    }

    pub fn from_config(config: &SegmenterConfig) -> Self {
        Self::new(config.max_chunk_chars, config.overlap)
    }

    /// Build a paper from pages and an optional bibliography
    ///
    /// The bibliography keeps its order; entries repeating an earlier `ref_id`
    /// are dropped.
    pub fn structure(
        &self,
        paper_id: impl Into<String>,
        pages: &[PageText],
        bibliography: Option<Vec<BibliographyEntry>>,
    ) -> Result<StructuredPaper, StructuringError> {
        let paper_id = paper_id.into();
        let chunks = segment(pages, self.max_chunk_chars, self.overlap);

        if chunks.is_empty() {
            tracing::warn!("No usable text in document {}", paper_id);
            return Err(StructuringError::NoUsableText { pages: pages.len() });
        }

        let section = chunks.into_iter().fold(
            Section::new(BODY_SECTION_NUMBER, BODY_SECTION_TITLE),
            |section, chunk| section.with_element(ParagraphElement::from_text(chunk.id, chunk.text)),
        );

        let bibliography = deduplicate_bibliography(bibliography.unwrap_or_default());

        let citation_count: usize = section.paragraphs().map(|p| p.citations.len()).sum();
        tracing::info!(
            "Structured document {}: {} paragraphs, {} citation markers, {} bibliography entries",
            paper_id,
            section.content.len(),
            citation_count,
            bibliography.len()
        );

        Ok(StructuredPaper::new(paper_id)
            .with_section(section)
            .with_bibliography(bibliography))
    }
}
