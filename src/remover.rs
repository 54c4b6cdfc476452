//! Size-bounded, protection-aware subtree removal.
//!
//! Naive large-container deletion is the dominant failure mode of boilerplate
//! stripping (an entire article body disappearing with the ad next to it), so
//! every pass here narrows to the smallest qualifying ancestor and refuses to
//! delete above a size-window violation or into protected content. A pass
//! that finds zero qualifying candidates removes nothing and is not an error.

use dom_query::{Document, NodeId, NodeRef, Selection};
use log::debug;

use crate::classifier;
use crate::dom;
use crate::policy::{PipelinePolicy, RemovalPolicy, SizeWindow};

/// Tags scanned by the header/footer pass.
const HEADER_FOOTER_SCAN: &str =
    "header, footer, p, h1, h2, h3, h4, h5, h6, div, section, table, tr, td";

/// Ancestor tags considered by the promotional-link narrowing, nearest-scope
/// first.
const PROMO_LINK_LEVELS: &[&[&str]] = &[&["tr"], &["table"], &["div", "section", "td", "p"]];

/// Window governing one ancestor level, by tag kind.
fn level_window(tag: &str, policy: &RemovalPolicy) -> Option<SizeWindow> {
    match tag {
        "td" | "tr" | "table" => Some(policy.table_window),
        "div" | "section" => Some(policy.container_window),
        _ => None,
    }
}

/// From a keyword-matching text node, delete the smallest size-bounded,
/// non-protected ancestor container; fall back to the immediate textual leaf.
///
/// The ancestor chain is walked in increasing scope (cell, row, container,
/// table as encountered). Protection propagates upward, and so does a size
/// overflow, so the walk stops at the first protected or oversized level;
/// nothing above it is ever deleted.
pub fn remove_if_safe(node: &NodeRef, policy: &RemovalPolicy) -> bool {
    for anc in dom::element_ancestors(node) {
        let Some(tag) = dom::node_tag(&anc) else {
            continue;
        };
        let Some(window) = level_window(&tag, policy) else {
            continue;
        };

        let sel = Selection::from(anc);
        if classifier::has_issue_content(&sel) {
            break;
        }
        let len = dom::text_len(&sel);
        if len > window.max {
            break;
        }
        if window.contains(len) {
            dom::remove(&sel);
            return true;
        }
    }

    remove_leaf_fallback(node, policy)
}

/// Delete the immediate textual leaf (paragraph, heading or cell) holding the
/// match point, if it is itself unprotected and within the leaf window.
fn remove_leaf_fallback(node: &NodeRef, policy: &RemovalPolicy) -> bool {
    let Some(parent) = node.parent().filter(dom_query::NodeRef::is_element) else {
        return false;
    };
    let Some(tag) = dom::node_tag(&parent) else {
        return false;
    };
    if !classifier::is_leaf_tag(&tag) {
        return false;
    }

    let sel = Selection::from(parent);
    if classifier::has_issue_content(&sel) {
        return false;
    }
    if !policy.leaf_window.contains(dom::text_len(&sel)) {
        return false;
    }

    dom::remove(&sel);
    true
}

/// Header/footer pass: remove short blocks matching boilerplate keywords
/// across a fixed set of candidate tags.
pub fn strip_header_footer(doc: &Document, policy: &PipelinePolicy) -> usize {
    let hf = &policy.header_footer;
    let candidates = doc.select(HEADER_FOOTER_SCAN).nodes().to_vec();

    let mut removed = 0;
    for node in candidates {
        if !dom::is_attached(&node) {
            continue;
        }
        let Some(tag) = dom::node_tag(&node) else {
            continue;
        };
        let window = level_window(&tag, hf).unwrap_or(hf.leaf_window);

        let sel = Selection::from(node);
        if classifier::classify(&sel, hf, window).boilerplate_candidate {
            dom::remove(&sel);
            removed += 1;
        }
    }

    if removed == 0 {
        debug!("header/footer pass: no qualifying candidates");
    } else {
        debug!("header/footer pass removed {removed} blocks");
    }
    removed
}

/// Keyword-section pass: generic narrowing removal for a fixed keyword set.
pub fn strip_keyword_sections(doc: &Document, policy: &RemovalPolicy) -> usize {
    let mut removed = 0;
    for node in dom::text_nodes(doc) {
        if !dom::is_attached(&node) {
            continue;
        }
        if !classifier::text_has_any(&node.text(), &policy.keywords) {
            continue;
        }
        if remove_if_safe(&node, policy) {
            removed += 1;
        }
    }

    if removed > 0 {
        debug!("keyword-section pass removed {removed} blocks");
    }
    removed
}

/// Promotional-span pass: delete everything between the promotional marker
/// and the first subsequent issue table.
///
/// Promo block boundaries are not uniformly tagged across issue variants, so
/// the span is bounded by the next protected-content table instead, so the
/// scan can never consume a real article.
pub fn strip_promo_span(doc: &Document, policy: &PipelinePolicy) -> usize {
    let Some(marker) = find_promo_marker(doc, policy) else {
        debug!("promo-span pass: no marker found");
        return 0;
    };
    let Some(table) = first_issue_table_after(doc, marker) else {
        debug!("promo-span pass: no table after marker");
        return 0;
    };

    let removed = remove_marker_span(marker, table);
    if removed > 0 {
        debug!("promo-span pass removed {removed} sibling blocks");
    }
    removed
}

/// Locate the promotional marker: a well-known element id, or a heading or
/// container whose text carries the marker phrase.
fn find_promo_marker<'a>(doc: &'a Document, policy: &PipelinePolicy) -> Option<NodeRef<'a>> {
    let by_id = doc.select(&format!("#{}", policy.promo_marker_id));
    if let Some(node) = by_id.nodes().first().copied() {
        return Some(node);
    }

    let marker_text = policy.promo_marker_text.to_lowercase();
    for text in dom::text_nodes(doc) {
        if !text.text().to_lowercase().contains(&marker_text) {
            continue;
        }
        if let Some(heading) = dom::find_ancestor(&text, &["h1", "h2", "h3", "h4", "h5", "h6"]) {
            return Some(heading);
        }
        if let Some(container) = dom::find_ancestor(&text, &["div", "section"]) {
            return Some(container);
        }
        return text.parent().filter(dom_query::NodeRef::is_element);
    }
    None
}

/// First issue table following the marker in document order, falling back to
/// the first table of any kind.
fn first_issue_table_after<'a>(doc: &'a Document, marker: NodeRef<'a>) -> Option<NodeRef<'a>> {
    let root = doc.select("html").nodes().first().copied()?;

    let mut past_marker = false;
    let mut first_table = None;
    for node in root.descendants() {
        if node.id == marker.id {
            past_marker = true;
            continue;
        }
        if !past_marker || !node.is_element() {
            continue;
        }
        if dom::node_tag(&node).as_deref() != Some("table") {
            continue;
        }
        if first_table.is_none() {
            first_table = Some(node);
        }
        if classifier::is_issue_table(&Selection::from(node)) {
            return Some(node);
        }
    }
    first_table
}

/// Remove the sibling range between the marker's branch and the issue table's
/// branch under their lowest common ancestor. The table's branch itself is
/// the stop condition and is never removed.
fn remove_marker_span(marker: NodeRef, table: NodeRef) -> usize {
    let mut marker_chain: Vec<NodeId> = vec![marker.id];
    marker_chain.extend(marker.ancestors(None).into_iter().map(|anc| anc.id));

    // Degenerate nesting: marker inside the table, or table inside the marker.
    if marker_chain.contains(&table.id) {
        return 0;
    }

    let mut common = None;
    for anc in table.ancestors(None) {
        if marker_chain.contains(&anc.id) {
            common = Some(anc);
            break;
        }
    }
    let Some(common) = common else {
        return 0;
    };
    if common.id == marker.id {
        return 0;
    }

    let Some(start) = branch_child(common, marker) else {
        return 0;
    };
    let Some(end) = branch_child(common, table) else {
        return 0;
    };
    if start.id == end.id {
        return 0;
    }

    let children = Selection::from(common).children().nodes().to_vec();
    let Some(i) = children.iter().position(|c| c.id == start.id) else {
        return 0;
    };
    let Some(j) = children.iter().position(|c| c.id == end.id) else {
        return 0;
    };
    if i >= j {
        return 0;
    }

    let mut removed = 0;
    for child in &children[i..j] {
        let sel = Selection::from(*child);
        if classifier::has_issue_content(&sel) {
            continue;
        }
        dom::remove(&sel);
        removed += 1;
    }
    removed
}

/// Child of `common` on the path down to `node`.
fn branch_child<'a>(common: NodeRef<'a>, node: NodeRef<'a>) -> Option<NodeRef<'a>> {
    let mut cur = node;
    loop {
        let parent = cur.parent()?;
        if parent.id == common.id {
            return Some(cur);
        }
        cur = parent;
    }
}

/// Remove secondary promotional blocks identified by well-known element ids,
/// together with their enclosing table row.
pub fn strip_spotlight_blocks(doc: &Document, policy: &PipelinePolicy) -> usize {
    let mut removed = 0;
    for id in &policy.spotlight_ids {
        let sel = doc.select(&format!("#{id}"));
        let Some(node) = sel.nodes().first().copied() else {
            continue;
        };
        if !dom::is_attached(&node) {
            continue;
        }

        if let Some(row) = dom::find_ancestor(&node, &["tr"]) {
            let row_sel = Selection::from(row);
            if !classifier::has_issue_content(&row_sel) {
                dom::remove(&row_sel);
                removed += 1;
                continue;
            }
        }
        let block = Selection::from(node);
        if !classifier::has_issue_content(&block) {
            dom::remove(&block);
            removed += 1;
        }
    }
    removed
}

/// Remove remaining promotional blocks around repeated marker phrases, up to
/// the policy's block budget.
pub fn strip_promo_markers(doc: &Document, policy: &PipelinePolicy) -> usize {
    let marker_text = policy.promo_marker_text.to_lowercase();

    let mut removed = 0;
    for _ in 0..policy.max_promo_blocks {
        let Some(node) = dom::text_nodes(doc)
            .into_iter()
            .find(|n| n.text().to_lowercase().contains(&marker_text))
        else {
            break;
        };

        if remove_if_safe(&node, &policy.promo) {
            removed += 1;
            continue;
        }
        // Nothing around the marker qualified; drop the marker text itself so
        // the scan terminates.
        dom::remove_node(&node);
        break;
    }
    removed
}

/// Remove promotional blocks identified by their link host.
///
/// Protection here is table-based only: these promos carry marker emoji of
/// their own, which must not shield them.
pub fn strip_promo_links(doc: &Document, policy: &PipelinePolicy) -> usize {
    if policy.promo_link_hosts.is_empty() {
        return 0;
    }
    let anchors = doc.select("a[href]").nodes().to_vec();

    let mut removed = 0;
    for node in anchors {
        if !dom::is_attached(&node) {
            continue;
        }
        let Some(href) = dom::get_attribute(&Selection::from(node), "href") else {
            continue;
        };
        if !policy.promo_link_hosts.iter().any(|host| href.contains(host.as_str())) {
            continue;
        }
        if remove_anchor_block(&node) {
            removed += 1;
        }
    }

    if removed > 0 {
        debug!("promo-link pass removed {removed} blocks");
    }
    removed
}

fn remove_anchor_block(node: &NodeRef) -> bool {
    for tags in PROMO_LINK_LEVELS {
        if let Some(anc) = dom::find_ancestor(node, tags) {
            let sel = Selection::from(anc);
            if classifier::has_issue_tables(&sel) {
                continue;
            }
            dom::remove(&sel);
            return true;
        }
    }
    false
}

/// Remove explicitly tagged ad nodes by CSS selector.
pub fn strip_ad_selectors(doc: &Document, policy: &PipelinePolicy) -> usize {
    let nodes = doc.select(&policy.ad_selectors).nodes().to_vec();

    let mut removed = 0;
    for node in nodes {
        if !dom::is_attached(&node) {
            continue;
        }
        let sel = Selection::from(node);
        if classifier::has_issue_content(&sel) {
            continue;
        }
        dom::remove(&sel);
        removed += 1;
    }
    removed
}
