//! PDF parsing tool: pages from a [`PageSource`], structure from the
//! [`PaperStructurer`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Tool, ToolError};
use crate::models::{BibliographyEntry, PageText, StructuredPaper};
use crate::parsing::PaperStructurer;
use crate::utils::{extract_pages, PdfExtractError};

/// Supplies per-page text for a document
#[async_trait]
pub trait PageSource: Send + Sync + std::fmt::Debug {
    async fn pages(&self, path: &Path) -> Result<Vec<PageText>, PdfExtractError>;
}

/// Reads pages from a PDF file with pdf-extract
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfPageSource;

#[async_trait]
impl PageSource for PdfPageSource {
    async fn pages(&self, path: &Path) -> Result<Vec<PageText>, PdfExtractError> {
        let path = path.to_path_buf();
        // pdf-extract is CPU bound and synchronous
        tokio::task::spawn_blocking(move || extract_pages(&path))
            .await
            .map_err(|e| PdfExtractError::ExtractionFailed(e.to_string()))?
    }
}

/// Content-addressed paper id: md5 over each page's number and text, in order
pub fn content_paper_id(pages: &[PageText]) -> String {
    let mut context = md5::Context::new();
    for page in pages {
        // Page number and length delimit each page
        context.consume(page.page_number.to_le_bytes());
        context.consume((page.text.len() as u64).to_le_bytes());
        context.consume(page.text.as_bytes());
    }
    format!("{:x}", context.compute())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfParserInput {
    pub file_path: PathBuf,

    #[serde(default)]
    pub bibliography: Option<Vec<BibliographyEntry>>,

    /// Defaults to [`content_paper_id`]
    #[serde(default)]
    pub paper_id: Option<String>,
}

impl PdfParserInput {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            bibliography: None,
            paper_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfParserOutput {
    pub structured_paper: StructuredPaper,
}

#[derive(Debug, Clone)]
pub struct PdfParserTool {
    source: Arc<dyn PageSource>,
    structurer: PaperStructurer,
}

impl Default for PdfParserTool {
    fn default() -> Self {
        Self::new(Arc::new(PdfPageSource), PaperStructurer::default())
    }
}

impl PdfParserTool {
    pub fn new(source: Arc<dyn PageSource>, structurer: PaperStructurer) -> Self {
        Self { source, structurer }
    }
}

#[async_trait]
impl Tool for PdfParserTool {
    type Input = PdfParserInput;
    type Output = PdfParserOutput;

    fn name(&self) -> &str {
        "pdf_parser"
    }

    fn description(&self) -> &str {
        "Parse a PDF into a structured paper with paragraphs, citation markers and bibliography"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the PDF file"
                },
                "bibliography": {
                    "type": "array",
                    "description": "Reference list as {ref_id, full_citation} objects",
                    "items": {
                        "type": "object",
                        "properties": {
                            "ref_id": {"type": "string"},
                            "full_citation": {"type": "string"}
                        },
                        "required": ["ref_id", "full_citation"]
                    }
                },
                "paper_id": {
                    "type": "string",
                    "description": "Identifier to assign; defaults to a hash of the text"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, input: PdfParserInput) -> Result<PdfParserOutput, ToolError> {
        tracing::info!("Parsing {}", input.file_path.display());
        let pages = self.source.pages(&input.file_path).await?;

        let paper_id = input
            .paper_id
            .unwrap_or_else(|| content_paper_id(&pages));
        let structured_paper = self.structurer.structure(paper_id, &pages, input.bibliography)?;

        Ok(PdfParserOutput { structured_paper })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::StructuringError;

    #[derive(Debug)]
    struct FixedPages(Vec<PageText>);

    #[async_trait]
    impl PageSource for FixedPages {
        async fn pages(&self, _path: &Path) -> Result<Vec<PageText>, PdfExtractError> {
            Ok(self.0.clone())
        }
    }

    fn sample_tool() -> PdfParserTool {
        PdfParserTool::new(
            Arc::new(FixedPages(vec![
                PageText::new(1, "This is a test [1]."),
                PageText::new(2, "Another paragraph without citation."),
                PageText::new(3, "Related to prior work [2, 3]."),
            ])),
            PaperStructurer::default(),
        )
    }

    #[tokio::test]
    async fn test_pdf_parser_with_stub_pages() {
        let out = sample_tool()
            .execute(PdfParserInput::new("/tmp/does_not_matter.pdf"))
            .await
            .unwrap();
        let paper = out.structured_paper;

        assert_eq!(paper.paper_id.len(), 32);
        assert_eq!(paper.sections.len(), 1);
        assert!(paper.paragraphs().any(|p| p.text.contains("test")));

        let keys: Vec<&str> = paper.paragraphs().flat_map(|p| p.citation_keys()).collect();
        assert_eq!(keys, vec!["[1]", "[2]", "[3]"]);
    }

    #[tokio::test]
    async fn test_paper_id_is_stable_and_overridable() {
        let tool = sample_tool();
        let a = tool.execute(PdfParserInput::new("a.pdf")).await.unwrap();
        let b = tool.execute(PdfParserInput::new("b.pdf")).await.unwrap();
        assert_eq!(a.structured_paper.paper_id, b.structured_paper.paper_id);

        let mut input = PdfParserInput::new("c.pdf");
        input.paper_id = Some("custom".to_string());
        let c = tool.execute(input).await.unwrap();
        assert_eq!(c.structured_paper.paper_id, "custom");
    }

    #[tokio::test]
    async fn test_empty_document_fails() {
        let tool = PdfParserTool::new(
            Arc::new(FixedPages(vec![PageText::new(1, "   ")])),
            PaperStructurer::default(),
        );
        let err = tool.execute(PdfParserInput::new("blank.pdf")).await.unwrap_err();
        assert!(matches!(
            err,
            ToolError::Structuring(StructuringError::NoUsableText { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_pdf_file() {
        let err = PdfParserTool::default()
            .execute(PdfParserInput::new("/nonexistent/paper.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Pdf(PdfExtractError::InvalidFile(_))));
    }

    #[test]
    fn test_content_paper_id() {
        let id = content_paper_id(&[PageText::new(1, "abc")]);
        assert_eq!(id.len(), 32);
        assert_eq!(id, content_paper_id(&[PageText::new(1, "abc")]));
        assert_ne!(id, content_paper_id(&[PageText::new(2, "abc")]));
    }

    #[test]
    fn test_content_paper_id_respects_page_boundaries() {
        let a = content_paper_id(&[PageText::new(1, "ab"), PageText::new(2, "c")]);
        let b = content_paper_id(&[PageText::new(1, "a"), PageText::new(2, "bc")]);
        assert_ne!(a, b);
    }
}
