//! PDF text extraction utilities.
//!
//! Text is extracted with the pdf-extract crate and split into pages on the
//! form-feed characters it emits between pages.

use std::path::Path;
use thiserror::Error;

use crate::models::PageText;

/// Page separator emitted by pdf-extract
const PAGE_BREAK: char = '\x0c';

/// Errors that can occur during PDF extraction
#[derive(Debug, Error)]
pub enum PdfExtractError {
    #[error("PDF extraction not available: native libraries not installed or not working")]
    NotAvailable,

    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),

    #[error("File not found or not a valid PDF: {0}")]
    InvalidFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract the full text of a PDF file
pub fn extract_text(path: &Path) -> Result<String, PdfExtractError> {
    if !path.exists() {
        return Err(PdfExtractError::InvalidFile(format!(
            "File not found: {}",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(PdfExtractError::InvalidFile(format!(
            "Not a file: {}",
            path.display()
        )));
    }

    match pdf_extract::extract_text(path) {
        Ok(text) => {
            if text.trim().is_empty() {
                // Usually a scanned or image-only PDF
                tracing::debug!("Extracted empty text from PDF: {}", path.display());
            }
            Ok(text)
        }
        Err(e) => {
            let error_msg = e.to_string();
            if error_msg.contains("poppler")
                || error_msg.contains("shared library")
                || error_msg.contains("cannot open shared object")
            {
                Err(PdfExtractError::NotAvailable)
            } else {
                Err(PdfExtractError::ExtractionFailed(error_msg))
            }
        }
    }
}

/// Split extracted text into 1-based pages on form feeds
///
/// Text without form feeds is a single page. A trailing form feed does not
/// create an extra page.
pub fn split_pages(text: &str) -> Vec<PageText> {
    let body = text.strip_suffix(PAGE_BREAK).unwrap_or(text);
    body.split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page)| PageText::new(i as u32 + 1, page))
        .collect()
}

/// Extract a PDF as per-page text
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>, PdfExtractError> {
    let pages = split_pages(&extract_text(path)?);
    tracing::debug!("Extracted {} pages from {}", pages.len(), path.display());
    Ok(pages)
}
