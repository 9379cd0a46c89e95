//! Bracket-style citation marker extraction.
//!
//! Recognizes `[1]`, `[2, 3]`, `[Smith99]` and emits one single-token marker
//! per token. Narrative citations such as `(Smith, 2021)` or
//! `Smith et al. (2021)` are never matched. Ranges (`[2-4]`) are not
//! expanded and the bracket is ignored.

use regex::Regex;
use std::sync::OnceLock;

/// Longest token accepted inside a bracket
const MAX_TOKEN_LEN: usize = 24;

fn bracket_regex() -> &'static Regex {
    static BRACKET: OnceLock<Regex> = OnceLock::new();
    BRACKET.get_or_init(|| Regex::new(r"\[([^\[\]]{1,128})\]").expect("static regex is valid"))
}

/// A marker token is a short ASCII alphanumeric code containing a digit
fn is_marker_token(token: &str) -> bool {
    token.len() <= MAX_TOKEN_LEN
        && token.chars().all(|c| c.is_ascii_alphanumeric())
        && token.chars().any(|c| c.is_ascii_digit())
}

/// Tokens of one bracket body, or `None` if any token is not a marker
fn bracket_tokens(body: &str) -> Option<Vec<&str>> {
    let mut tokens: Vec<&str> = Vec::new();
    for token in body
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if !is_marker_token(token) {
            return None;
        }
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }

    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

/// Extract citation markers from text
///
/// Markers come back in order of appearance, each wrapped individually
/// (`[2, 3]` yields `[2]` and `[3]`). A token repeated inside one bracket is
/// emitted once; repeats across brackets are all kept.
///
/// # Examples
///
/// ```
/// use paper_lens::parsing::extract_citation_keys;
///
/// assert_eq!(
///     extract_citation_keys("Our method [1] builds upon [2, 3]."),
///     vec!["[1]", "[2]", "[3]"]
/// );
/// assert!(extract_citation_keys("As shown by Smith et al. (2021), performance improves.").is_empty());
/// ```
pub fn extract_citation_keys(text: &str) -> Vec<String> {
    let mut keys = Vec::new();

    for caps in bracket_regex().captures_iter(text) {
        let Some(body) = caps.get(1) else {
            continue;
        };
        if let Some(tokens) = bracket_tokens(body.as_str()) {
            keys.extend(tokens.into_iter().map(|t| format!("[{}]", t)));
        }
    }

    keys
}

/// Whether `text` contains at least one citation marker
pub fn has_citation_markers(text: &str) -> bool {
    bracket_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .any(|body| bracket_tokens(body.as_str()).is_some())
}
