//! Utility modules supporting the parsing and retrieval pipeline.
//!
//! - [`deduplicate_bibliography`]: Drop bibliography entries whose `ref_id` repeats, keeping the first
//! - [`find_duplicates`]: Find duplicate groups without modifying the list
//! - [`HttpClient`]: Shared HTTP client for model backends
//! - [`extract_pages`]: Extract per-page text from PDF files
//! - [`PdfExtractError`]: Errors that can occur during PDF extraction
//! - [`RetryConfig`] / [`with_retry`]: Caller-side retry on transient backend errors
//!
//! # Deduplication
//!
//! ```rust
//! use paper_lens::models::BibliographyEntry;
//! use paper_lens::utils::deduplicate_bibliography;
//!
//! let entries = vec![
//!     BibliographyEntry::new("[1]", "First"),
//!     BibliographyEntry::new("[1]", "Repeat"),
//! ];
//! let unique = deduplicate_bibliography(entries);
//! assert_eq!(unique.len(), 1);
//! assert_eq!(unique[0].full_citation, "First");
//! ```

mod dedup;
mod http;
mod pdf;
mod retry;

pub use dedup::{deduplicate_bibliography, find_duplicates};
pub use http::{HttpClient, USER_AGENT};
pub use pdf::{extract_pages, extract_text, split_pages, PdfExtractError};
pub use retry::{with_retry, RetryConfig};
