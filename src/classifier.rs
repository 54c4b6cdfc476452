//! Block classification: boilerplate candidates vs. protected content.
//!
//! Every predicate here is read-only over the tree. The protected-content
//! signal (content-marker emoji or an issue-table signature) takes precedence
//! over any keyword match: a protected block is never a deletion candidate,
//! no matter how much boilerplate vocabulary it contains.

use dom_query::Selection;

use crate::dom;
use crate::patterns::CONTENT_MARKER;
use crate::policy::{RemovalPolicy, SizeWindow};

/// Tags removed outright on a single keyword match.
const LEAF_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "header", "footer"];

/// Tags that require `container_min_matches` keyword hits, because large
/// ambient containers often mention a stray keyword without being
/// boilerplate.
const CONTAINER_TAGS: &[&str] = &["div", "section", "table", "tr", "td"];

/// Read-only classification of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The block qualifies for deletion under the given policy and window.
    pub boilerplate_candidate: bool,
    /// Number of boilerplate keywords matching the flattened text.
    pub keyword_count: usize,
    /// The block carries the protected-content signal.
    pub protected: bool,
}

/// Count case-insensitive keyword substring matches in `text`.
#[must_use]
pub fn keyword_count(text: &str, keywords: &[String]) -> usize {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .filter(|kw| lower.contains(&kw.to_lowercase()))
        .count()
}

/// Whether any keyword matches `text` case-insensitively.
#[must_use]
pub fn text_has_any(text: &str, keywords: &[String]) -> bool {
    keyword_count(text, keywords) > 0
}

/// Whether a table matches the issue-table signature.
///
/// A table is an article block when its text carries a content marker, or
/// when it carries the narrow layout-style signature the source issues use
/// for story tables.
#[must_use]
pub fn is_issue_table(table: &Selection) -> bool {
    let text = dom::flatten_text(table);
    if CONTENT_MARKER.is_match(&text) {
        return true;
    }

    dom::get_attribute(table, "style").is_some_and(|style| {
        let style = style.to_lowercase();
        style.contains("padding-top") && style.contains("50")
    })
}

/// Whether a container holds at least one issue table.
///
/// Table-based only: a lone marker emoji in a promotional heading must not
/// protect the promotional block around it.
#[must_use]
pub fn has_issue_tables(sel: &Selection) -> bool {
    sel.select("table")
        .nodes()
        .iter()
        .any(|node| is_issue_table(&Selection::from(*node)))
}

/// Whether a block contains genuine article content: a content marker in its
/// text, or a nested issue table.
#[must_use]
pub fn has_issue_content(sel: &Selection) -> bool {
    if CONTENT_MARKER.is_match(&dom::flatten_text(sel)) {
        return true;
    }
    has_issue_tables(sel)
}

/// Keyword matches required before a block of the given tag is a candidate.
#[must_use]
pub fn required_matches(tag: &str, policy: &RemovalPolicy) -> usize {
    if CONTAINER_TAGS.contains(&tag) {
        policy.container_min_matches
    } else {
        1
    }
}

/// Whether the tag is one of the leaf kinds eligible for fallback removal.
#[must_use]
pub fn is_leaf_tag(tag: &str) -> bool {
    LEAF_TAGS.contains(&tag) || tag == "td"
}

/// Classify one block against a policy and the window of the current removal
/// context. Read-only; never mutates the tree.
#[must_use]
pub fn classify(block: &Selection, policy: &RemovalPolicy, window: SizeWindow) -> Classification {
    let text = dom::flatten_text(block);
    let protected = has_issue_content(block);
    let count = keyword_count(&text, &policy.keywords);

    let tag = dom::tag_name(block).unwrap_or_default();
    let candidate = !protected
        && window.contains(text.chars().count())
        && count >= required_matches(&tag, policy);

    Classification {
        boilerplate_candidate: candidate,
        keyword_count: count,
        protected,
    }
}
