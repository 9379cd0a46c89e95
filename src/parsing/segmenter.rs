//! Page segmentation into bounded, word-aligned chunks.

use crate::models::{PageText, TextChunk};

/// Split pages into chunks of at most `max_chunk_chars` characters
///
/// Windows are walked left to right over each page. A window whose right edge
/// lands inside a word is extended to the next whitespace, so words are only
/// cut at the end of the page text. Chunks are whitespace-trimmed, empty ones
/// are dropped, and survivors get ids `chunk-0`, `chunk-1`, ... across the
/// whole document. Empty pages produce nothing.
///
/// `max_chunk_chars` below 1 is treated as 1.
pub fn segment(pages: &[PageText], max_chunk_chars: usize, overlap: usize) -> Vec<TextChunk> {
    let max_chunk_chars = max_chunk_chars.max(1);
    let mut chunks = Vec::new();

    for page in pages {
        segment_page(page, max_chunk_chars, overlap, &mut chunks);
    }

    tracing::debug!(
        "Segmented {} pages into {} chunks (max {} chars)",
        pages.len(),
        chunks.len(),
        max_chunk_chars
    );

    chunks
}

fn segment_page(page: &PageText, max_chars: usize, overlap: usize, out: &mut Vec<TextChunk>) {
    let raw = page.text.as_str();
    let body_end = raw.trim_end().len();
    let mut start = raw.len() - raw.trim_start().len();

    while start < body_end {
        let mut end = advance_chars(raw, start, max_chars, body_end);
        if end < body_end {
            end = extend_to_whitespace(raw, end, body_end);
        }

        let window = &raw[start..end];
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            let offset = start + (window.len() - window.trim_start().len());
            out.push(TextChunk {
                id: format!("chunk-{}", out.len()),
                page_number: page.page_number,
                offset,
                text: trimmed.to_string(),
            });
        }

        start = next_window_start(end, overlap);
    }
}

/// Byte index `count` characters after `start`, capped at `limit`
fn advance_chars(text: &str, start: usize, count: usize, limit: usize) -> usize {
    text[start..limit]
        .char_indices()
        .nth(count)
        .map(|(i, _)| start + i)
        .unwrap_or(limit)
}

/// Move `end` forward to the next whitespace if it splits a word
fn extend_to_whitespace(text: &str, end: usize, limit: usize) -> usize {
    let splits_word = text[..end]
        .chars()
        .next_back()
        .is_some_and(|c| !c.is_whitespace());
    if !splits_word {
        return end;
    }

    text[end..limit]
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, _)| end + i)
        .unwrap_or(limit)
}

/// Start of the window following one that ends at `end`
///
/// Overlap is advisory and never moves the cursor behind `end`, which keeps
/// every step strictly forward.
fn next_window_start(end: usize, overlap: usize) -> usize {
    end.saturating_sub(overlap).max(end)
}
