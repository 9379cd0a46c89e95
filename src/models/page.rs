//! Page text input and the chunks segmentation produces from it.

use serde::{Deserialize, Serialize};

/// Raw text of one page, as delivered by the upstream text extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// Page number (extractor-defined; usually 1-based)
    #[serde(alias = "page")]
    pub page_number: u32,

    /// Raw page text; may be empty
    #[serde(default)]
    pub text: String,
}

impl PageText {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// A bounded, whitespace-trimmed window of page text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Document-scoped id, `chunk-<n>`
    pub id: String,

    /// Source page
    pub page_number: u32,

    /// Byte offset of `text` within the raw page text
    pub offset: usize,

    pub text: String,
}
