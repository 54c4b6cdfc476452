//! Compiled regex patterns used across the pipeline.
//!
//! All patterns are compiled once at startup using `LazyLock`.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

/// Matches the content-marker symbol class source issues use to flag story
/// headers (emoji in the Supplemental Symbols / Extended Pictographs planes).
///
/// A block whose text carries one of these markers is genuine article content
/// and must never be deleted.
pub static CONTENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{1F300}-\u{1FAFF}]").expect("CONTENT_MARKER regex"));

/// Matches URLs displayed as visible text (`https://...` or `www....`).
///
/// A closing parenthesis is excluded from the match so that a parenthesized
/// URL leaves an empty pair behind for [`EMPTY_PARENS`] to clean up. Only text
/// nodes are rewritten with this; `href` attributes are never touched.
pub static VISIBLE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(https?://[^\s)]+|www\.[^\s)]+)").expect("VISIBLE_URL regex")
});

/// Matches parentheses left empty after URL-display stripping.
pub static EMPTY_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\)").expect("EMPTY_PARENS regex"));

/// Matches runs of two or more spaces for post-strip cleanup.
pub static MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("MULTI_SPACE regex"));

/// Matches paragraph boundaries (blank lines) for translation chunking.
pub static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("PARAGRAPH_BREAK regex"));

/// Matches whitespace runs for text flattening.
pub static WHITESPACE_NORMALIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_NORMALIZE regex"));

/// Strips everything but ASCII alphanumerics when deriving placeholder names
/// for protected terms.
pub static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").expect("NON_ALNUM regex"));
