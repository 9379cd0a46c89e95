//! Reference linking tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Tool, ToolError};
use crate::linker::{ReferenceLinker, DEFAULT_TOP_K};
use crate::models::{LinkResponse, StructuredPaper};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceLinkerInput {
    pub source_paper: StructuredPaper,

    /// Citation-bearing snippet or free-text topic
    pub query: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Clone)]
pub struct ReferenceLinkerTool {
    linker: ReferenceLinker,
}

impl ReferenceLinkerTool {
    pub fn new(linker: ReferenceLinker) -> Self {
        Self { linker }
    }
}

#[async_trait]
impl Tool for ReferenceLinkerTool {
    type Input = ReferenceLinkerInput;
    type Output = LinkResponse;

    fn name(&self) -> &str {
        "reference_linker"
    }

    fn description(&self) -> &str {
        "Find the bibliography entries a snippet cites, or the ones most relevant to a topic"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_paper": {
                    "type": "object",
                    "description": "Structured paper as produced by pdf_parser"
                },
                "query": {
                    "type": "string",
                    "description": "Text containing citation markers like [1], or a free-text topic"
                },
                "top_k": {
                    "type": "integer",
                    "description": "Paragraphs kept by prefilter and rerank",
                    "default": DEFAULT_TOP_K
                }
            },
            "required": ["source_paper", "query"]
        })
    }

    async fn execute(&self, input: ReferenceLinkerInput) -> Result<LinkResponse, ToolError> {
        let response = self
            .linker
            .link(&input.source_paper, &input.query, input.top_k)
            .await?;
        tracing::info!(
            "Linked {} references in {} mode",
            response.references.len(),
            response.mode
        );
        Ok(response)
    }
}
