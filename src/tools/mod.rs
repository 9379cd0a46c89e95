//! Tools wrapping the pipeline behind a uniform execute interface.
//!
//! Every tool has typed input and output models and can also be driven with
//! plain JSON through [`Tool::invoke`], which is how the [`ToolRegistry`]
//! dispatches calls by name.

mod code_generator;
mod pdf_parser;
mod reference_linker;

pub use code_generator::{strip_code_fence, CodeGeneratorInput, CodeGeneratorOutput, CodeGeneratorTool};
pub use pdf_parser::{
    content_paper_id, PageSource, PdfPageSource, PdfParserInput, PdfParserOutput, PdfParserTool,
};
pub use reference_linker::{ReferenceLinkerInput, ReferenceLinkerTool};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::llm::GenerationError;
use crate::parsing::StructuringError;
use crate::retrieval::RetrievalBackendError;
use crate::utils::PdfExtractError;

/// Errors surfaced by tools
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not match the tool's input model
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Structuring(#[from] StructuringError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalBackendError),

    #[error(transparent)]
    Pdf(#[from] PdfExtractError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Failed to serialize tool output: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// A named operation with typed input and output
#[async_trait]
pub trait Tool: Send + Sync + std::fmt::Debug {
    type Input: DeserializeOwned + Send + 'static;
    type Output: Serialize + Send + 'static;

    /// Tool name (e.g., "pdf_parser")
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON Schema for the input model
    fn input_schema(&self) -> Value;

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, ToolError>;

    /// Execute with JSON arguments, returning JSON output
    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let input: Self::Input =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let output = self.execute(input).await?;
        Ok(serde_json::to_value(output)?)
    }
}

/// Object-safe view of a [`Tool`], for registries
#[async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn input_schema(&self) -> Value;

    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

#[async_trait]
impl<T: Tool> ToolHandler for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn description(&self) -> &str {
        Tool::description(self)
    }

    fn input_schema(&self) -> Value {
        Tool::input_schema(self)
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        self.invoke(args).await
    }
}

/// Tools addressable by name
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn ToolHandler>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tools.get(name)
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call a tool by name with JSON arguments
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tracing::debug!("Calling tool {}", name);
        tool.call(args).await
    }
}
