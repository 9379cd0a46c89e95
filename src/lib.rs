//! # Paper Lens
//!
//! Turns the text of a scholarly paper into a structured document and links
//! citation markers or free-text topics back to bibliography entries.
//!
//! ## Architecture
//!
//! - [`models`]: Document model (StructuredPaper, sections, elements, link results)
//! - [`parsing`]: Page segmentation, citation extraction and paper structuring
//! - [`retrieval`]: Embedding and rerank capabilities behind a small facade
//! - [`linker`]: Snippet and topic reference linking
//! - [`tools`]: Tool wrappers (pdf_parser, reference_linker, code_generator)
//! - [`llm`]: Text generation capability used by code generation
//! - [`utils`]: PDF pages, HTTP client, retry and bibliography deduplication
//! - [`config`]: Configuration management

pub mod config;
pub mod linker;
pub mod llm;
pub mod models;
pub mod parsing;
pub mod retrieval;
pub mod tools;
pub mod utils;

// Re-export commonly used types
pub use linker::ReferenceLinker;
pub use models::{LinkMode, LinkResponse, StructuredPaper};
pub use parsing::PaperStructurer;
pub use retrieval::EmbeddingService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
