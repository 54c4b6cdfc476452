//! DOM operations adapter over the `dom_query` crate.
//!
//! The pipeline models one issue as a tagged tree of element and text nodes
//! and dispatches on `NodeRef::is_element` / `is_text` explicitly. This module
//! collects the small set of tree operations the removal, extraction and
//! translation passes need, so the rest of the crate never touches `dom_query`
//! internals directly.

// Re-export core types for external use
pub use dom_query::{Document, NodeRef, Selection};

// Re-export StrTendril; dom_query hands out reference-counted text
pub use tendril::StrTendril;

use crate::patterns::WHITESPACE_NORMALIZE;

// === Parsing & serialization ===

/// Parse an HTML string into a document.
///
/// Fragments are wrapped into a full `html`/`body` scaffold by the parser;
/// [`body_html`] strips the scaffold back off on output.
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Serialize the document body back to markup.
#[must_use]
pub fn body_html(doc: &Document) -> String {
    doc.select("body").inner_html().trim().to_string()
}

/// Clone a document for an independent working copy.
#[must_use]
pub fn clone_document(doc: &Document) -> Document {
    Document::from(doc.html().to_string())
}

// === Text ===

/// Flattened, whitespace-normalized text of a selection.
///
/// Equivalent to joining all descendant text with single spaces and trimming,
/// which is the representation every keyword and size heuristic runs against.
#[must_use]
pub fn flatten_text(sel: &Selection) -> String {
    WHITESPACE_NORMALIZE
        .replace_all(&sel.text(), " ")
        .trim()
        .to_string()
}

/// Flattened text of a single node subtree.
#[must_use]
pub fn flatten_node_text(node: &NodeRef) -> String {
    WHITESPACE_NORMALIZE
        .replace_all(&node.text(), " ")
        .trim()
        .to_string()
}

/// Character length of a selection's flattened text.
#[must_use]
pub fn text_len(sel: &Selection) -> usize {
    flatten_text(sel).chars().count()
}

/// Character length of the document's visible body text.
#[must_use]
pub fn visible_text_len(doc: &Document) -> usize {
    text_len(&doc.select("body"))
}

// === Node information ===

/// Lowercase tag name of a selection's first element.
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes()
        .first()
        .and_then(dom_query::NodeRef::node_name)
        .map(|t| t.to_lowercase())
}

/// Lowercase tag name of an element node.
#[must_use]
pub fn node_tag(node: &NodeRef) -> Option<String> {
    node.node_name().map(|t| t.to_lowercase())
}

/// Lowercase tag name of a node's parent element.
#[must_use]
pub fn parent_tag(node: &NodeRef) -> Option<String> {
    node.parent().as_ref().and_then(node_tag)
}

/// Whether the node is still reachable from the document root.
///
/// Removal passes collect candidates up front; a candidate inside an already
/// removed subtree is skipped rather than counted as a second removal.
#[must_use]
pub fn is_attached(node: &NodeRef) -> bool {
    node.ancestors(None)
        .into_iter()
        .any(|anc| anc.node_name().is_some_and(|n| n.eq_ignore_ascii_case("html")))
}

/// Element-only ancestor chain, nearest first, stopping below `body`.
#[must_use]
pub fn element_ancestors<'a>(node: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    let mut out = Vec::new();
    for anc in node.ancestors(None) {
        if !anc.is_element() {
            continue;
        }
        if anc
            .node_name()
            .is_some_and(|n| n.eq_ignore_ascii_case("body") || n.eq_ignore_ascii_case("html"))
        {
            break;
        }
        out.push(anc);
    }
    out
}

/// Nearest ancestor whose tag is in `tags` (lowercase).
#[must_use]
pub fn find_ancestor<'a>(node: &NodeRef<'a>, tags: &[&str]) -> Option<NodeRef<'a>> {
    element_ancestors(node)
        .into_iter()
        .find(|anc| node_tag(anc).is_some_and(|t| tags.contains(&t.as_str())))
}

/// All text nodes of the document in document order.
#[must_use]
pub fn text_nodes(doc: &Document) -> Vec<NodeRef<'_>> {
    let root = doc.select("html");
    let Some(root_node) = root.nodes().first().copied() else {
        return Vec::new();
    };
    root_node
        .descendants()
        .into_iter()
        .filter(|node| node.is_text())
        .collect()
}

/// Next sibling that is an element, skipping text nodes.
#[must_use]
pub fn next_element_sibling<'a>(node: &NodeRef<'a>) -> Option<NodeRef<'a>> {
    node.next_element_sibling()
}

// === Attributes ===

/// Get an attribute value.
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Set an attribute value.
#[inline]
pub fn set_attribute(sel: &Selection, name: &str, value: &str) {
    sel.set_attr(name, value);
}

// === Mutation ===

/// Remove a subtree from the document.
#[inline]
pub fn remove(sel: &Selection) {
    sel.remove();
}

/// Remove a single node (element or text) from the document.
#[inline]
pub fn remove_node(node: &NodeRef) {
    Selection::from(*node).remove();
}

/// Replace the content of a text node in place.
///
/// The replacement is HTML-escaped before insertion, so it always lands back
/// in the tree as plain text. Replacing with an empty string removes the node.
pub fn replace_text_node(node: &NodeRef, text: &str) {
    let sel = Selection::from(*node);
    if text.is_empty() {
        sel.remove();
    } else {
        sel.replace_with_html(escape_text(text).as_str());
    }
}

/// Escape text for re-insertion as a text node.
#[must_use]
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_text_normalizes_whitespace() {
        let doc = parse("<div>  a\n  <span>b</span>\n\n c  </div>");
        let div = doc.select("div");
        assert_eq!(flatten_text(&div), "a b c");
        assert_eq!(text_len(&div), 5);
    }

    #[test]
    fn test_body_html_strips_scaffold() {
        let doc = parse("<div><p>fragment</p></div>");
        let out = body_html(&doc);
        assert!(out.starts_with("<div>"));
        assert!(!out.contains("<body>"));
    }

    #[test]
    fn test_is_attached_after_removal() {
        let doc = parse("<div><p id=\"gone\">x</p><p>y</p></div>");
        let nodes = text_nodes(&doc);
        assert_eq!(nodes.len(), 2);

        doc.select("#gone").remove();
        assert!(!is_attached(&nodes[0]));
        assert!(is_attached(&nodes[1]));
    }

    #[test]
    fn test_element_ancestors_nearest_first() {
        let doc = parse("<table><tr><td><p id=\"leaf\">x</p></td></tr></table>");
        let leaf = doc.select("#leaf");
        let Some(node) = leaf.nodes().first().copied() else {
            panic!("leaf not found");
        };

        let tags: Vec<String> = element_ancestors(&node)
            .iter()
            .filter_map(node_tag)
            .collect();
        // The parser inserts tbody between table and tr.
        assert_eq!(tags.first().map(String::as_str), Some("td"));
        assert_eq!(tags.last().map(String::as_str), Some("table"));
    }

    #[test]
    fn test_find_ancestor() {
        let doc = parse("<div><table><tr><td id=\"cell\">x</td></tr></table></div>");
        let cell = doc.select("#cell");
        let Some(node) = cell.nodes().first().copied() else {
            panic!("cell not found");
        };

        let table = find_ancestor(&node, &["table"]);
        assert!(table.is_some());
        assert_eq!(table.as_ref().and_then(node_tag).as_deref(), Some("table"));
        assert!(find_ancestor(&node, &["ul"]).is_none());
    }

    #[test]
    fn test_replace_text_node_escapes() {
        let doc = parse("<p>original</p>");
        let nodes = text_nodes(&doc);
        assert_eq!(nodes.len(), 1);

        replace_text_node(&nodes[0], "a < b & c");
        let p = doc.select("p");
        assert_eq!(p.text().as_ref(), "a < b & c");
        assert!(p.inner_html().contains("&lt;"));
    }

    #[test]
    fn test_replace_text_node_empty_removes() {
        let doc = parse("<p>gone<span>kept</span></p>");
        let nodes = text_nodes(&doc);
        replace_text_node(&nodes[0], "");
        assert_eq!(flatten_text(&doc.select("p")), "kept");
    }

    #[test]
    fn test_replace_text_node_preserves_siblings() {
        let doc = parse("<p>before <a href=\"https://x/y\">link</a> after</p>");
        let nodes = text_nodes(&doc);
        replace_text_node(&nodes[0], "BEFORE ");
        let p = doc.select("p");
        assert_eq!(flatten_text(&p), "BEFORE link after");
        assert_eq!(
            get_attribute(&p.select("a"), "href").as_deref(),
            Some("https://x/y")
        );
    }

    #[test]
    fn test_clone_document_is_independent() {
        let doc = parse("<div id=\"a\">text</div>");
        let copy = clone_document(&doc);
        copy.select("#a").remove();
        assert!(doc.select("#a").exists());
        assert!(!copy.select("#a").exists());
    }
}
