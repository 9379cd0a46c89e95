//! Code generation from algorithm pseudocode.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{Tool, ToolError};
use crate::llm::{ChatMessage, GenerationError, TextGenerator};
use crate::models::{AlgorithmElement, StructuredPaper};

/// Paragraphs of the paper quoted as context in the prompt
const CONTEXT_PARAGRAPHS: usize = 3;

/// Upper bound on quoted context, in characters
const MAX_CONTEXT_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeGeneratorInput {
    pub pseudocode_element: AlgorithmElement,

    pub source_paper: StructuredPaper,

    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "python".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeGeneratorOutput {
    pub generated_code: String,
    pub language: String,
}

/// Remove one surrounding Markdown code fence, if present
///
/// ```
/// use paper_lens::tools::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```python\nx = 1\n```"), "x = 1");
/// assert_eq!(strip_code_fence("x = 1\n"), "x = 1");
/// ```
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string line ("python", "rust", or nothing)
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Debug, Clone)]
pub struct CodeGeneratorTool {
    generator: Arc<dyn TextGenerator>,
}

impl CodeGeneratorTool {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn build_messages(input: &CodeGeneratorInput) -> Vec<ChatMessage> {
        let language = &input.language;
        let paper = &input.source_paper;
        let algorithm = &input.pseudocode_element;

        let system = format!(
            "You are an expert {language} developer who implements algorithms from research papers. \
             Translate the given pseudocode into correct, idiomatic {language}. \
             Reply with a single code block and no explanation."
        );

        let context: String = paper
            .paragraphs()
            .take(CONTEXT_PARAGRAPHS)
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
            .chars()
            .take(MAX_CONTEXT_CHARS)
            .collect();

        let mut user = format!("Paper: {}\n", paper.title().unwrap_or(paper.paper_id.as_str()));
        if !context.is_empty() {
            user.push_str(&format!("\nContext:\n{}\n", context));
        }
        let heading = match (&algorithm.label, &algorithm.caption) {
            (Some(label), Some(caption)) => format!("{}: {}", label, caption),
            (Some(label), None) => label.clone(),
            (None, Some(caption)) => caption.clone(),
            (None, None) => algorithm.element_id.clone(),
        };
        user.push_str(&format!(
            "\nAlgorithm: {}\n\nPseudocode:\n{}\n",
            heading, algorithm.pseudocode
        ));

        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }
}

#[async_trait]
impl Tool for CodeGeneratorTool {
    type Input = CodeGeneratorInput;
    type Output = CodeGeneratorOutput;

    fn name(&self) -> &str {
        "code_generator"
    }

    fn description(&self) -> &str {
        "Generate source code implementing an algorithm's pseudocode"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pseudocode_element": {
                    "type": "object",
                    "description": "Algorithm element with element_id, label, caption and pseudocode"
                },
                "source_paper": {
                    "type": "object",
                    "description": "Structured paper the algorithm comes from"
                },
                "language": {
                    "type": "string",
                    "description": "Target programming language",
                    "default": "python"
                }
            },
            "required": ["pseudocode_element", "source_paper"]
        })
    }

    async fn execute(&self, input: CodeGeneratorInput) -> Result<CodeGeneratorOutput, ToolError> {
        if input.pseudocode_element.pseudocode.trim().is_empty() {
            return Err(ToolError::InvalidInput(format!(
                "Algorithm {} has no pseudocode",
                input.pseudocode_element.element_id
            )));
        }

        let messages = Self::build_messages(&input);
        tracing::debug!(
            "Generating {} code for {}",
            input.language,
            input.pseudocode_element.element_id
        );
        let reply = self.generator.generate(&messages).await?;

        let generated_code = strip_code_fence(&reply);
        if generated_code.is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }

        Ok(CodeGeneratorOutput {
            generated_code: generated_code.to_string(),
            language: input.language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Role, StaticGenerator};
    use crate::models::{PaperMetadata, ParagraphElement, Section};

    fn sample_input() -> CodeGeneratorInput {
        let paper = StructuredPaper::new("p1")
            .with_metadata(PaperMetadata::with_title("Answering Everything"))
            .with_section(
                Section::new("1", "Intro")
                    .with_element(ParagraphElement::from_text("p", "context paragraph")),
            );
        let mut algorithm = AlgorithmElement::new("alg-1");
        algorithm.label = Some("Alg 1".to_string());
        algorithm.caption = Some("cap".to_string());
        algorithm.pseudocode = "return 42".to_string();

        CodeGeneratorInput {
            pseudocode_element: algorithm,
            source_paper: paper,
            language: default_language(),
        }
    }

    #[tokio::test]
    async fn test_code_generator_with_static_llm() {
        let generator = Arc::new(StaticGenerator::new("def foo():\n    return 42\n"));
        let tool = CodeGeneratorTool::new(generator.clone());

        let out = tool.execute(sample_input()).await.unwrap();
        assert!(out.generated_code.contains("def"));
        assert_eq!(out.language, "python");

        let prompt = generator.last_prompt();
        assert_eq!(prompt[0].role, Role::System);
        assert!(prompt[0].content.contains("python"));
        assert!(prompt[1].content.contains("Answering Everything"));
        assert!(prompt[1].content.contains("Alg 1: cap"));
        assert!(prompt[1].content.contains("return 42"));
        assert!(prompt[1].content.contains("context paragraph"));
    }

    #[tokio::test]
    async fn test_fenced_reply_is_unwrapped() {
        let tool = CodeGeneratorTool::new(Arc::new(StaticGenerator::new(
            "```python\ndef foo():\n    return 42\n```\n",
        )));
        let out = tool.execute(sample_input()).await.unwrap();
        assert_eq!(out.generated_code, "def foo():\n    return 42");
    }

    #[tokio::test]
    async fn test_empty_reply_is_error() {
        let tool = CodeGeneratorTool::new(Arc::new(StaticGenerator::new("```\n```")));
        let err = tool.execute(sample_input()).await.unwrap_err();
        assert!(matches!(err, ToolError::Generation(GenerationError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_missing_pseudocode_rejected() {
        let tool = CodeGeneratorTool::new(Arc::new(StaticGenerator::new("unused")));
        let mut input = sample_input();
        input.pseudocode_element.pseudocode = "  ".to_string();

        let err = tool.execute(input).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```\nfn main() {}\n```"), "fn main() {}");
        assert_eq!(strip_code_fence("```rust\nlet x = 1;"), "let x = 1;");
        assert_eq!(strip_code_fence("```"), "");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }
}
