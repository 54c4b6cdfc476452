//! Structured record extraction from a sanitized issue document.
//!
//! Extraction is read-only and best-effort: candidates missing a title or a
//! parseable link are discarded silently, and an issue without any qualifying
//! records yields an empty digest rather than an error. Callers run this on a
//! document that already went through the removal passes.

use dom_query::{Document, Selection};
use log::{debug, warn};
use url::Url;

use crate::classifier;
use crate::dom;
use crate::policy::PipelinePolicy;
use crate::record::{ArticleRecord, IssueDigest, OtherNewsRecord};

/// Extract article and secondary-link records from a sanitized document.
#[must_use]
pub fn extract(doc: &Document, policy: &PipelinePolicy) -> IssueDigest {
    let digest = IssueDigest {
        issues: collect_issues(doc, policy),
        other_news: collect_other_news(doc, policy),
    };

    if digest.is_empty() {
        warn!("extraction yielded no records");
    } else {
        debug!(
            "extracted {} articles, {} secondary links",
            digest.issues.len(),
            digest.other_news.len()
        );
    }
    digest
}

/// One record per innermost issue table, in document order.
fn collect_issues(doc: &Document, policy: &PipelinePolicy) -> Vec<ArticleRecord> {
    let tables = doc.select("table").nodes().to_vec();

    let mut issues = Vec::new();
    for table in tables {
        let sel = Selection::from(table);
        if !classifier::is_issue_table(&sel) {
            continue;
        }
        // Layout wrappers can match the signature around a real story table;
        // the innermost matching table is the record.
        if classifier::has_issue_tables(&sel) {
            continue;
        }
        if let Some(record) = article_record(&sel, policy) {
            issues.push(record);
        }
    }
    issues
}

/// Build one record from a story table: title and link from the first cell,
/// bullets from an adjacent list.
fn article_record(table: &Selection, policy: &PipelinePolicy) -> Option<ArticleRecord> {
    let cells = table.select("td");
    let cell = cells.nodes().first().copied()?;
    let cell_sel = Selection::from(cell);

    let title = dom::flatten_text(&cell_sel);
    if title.is_empty() {
        return None;
    }

    let href = dom::get_attribute(&cell_sel.select("a[href]"), "href")?;
    let link = Url::parse(href.trim()).ok()?;

    Some(ArticleRecord {
        title,
        link,
        bullets: adjacent_bullets(table, policy),
    })
}

/// Bullet texts from a `ul` immediately following the story table.
fn adjacent_bullets(table: &Selection, policy: &PipelinePolicy) -> Vec<String> {
    let Some(node) = table.nodes().first() else {
        return Vec::new();
    };
    let Some(sibling) = dom::next_element_sibling(node) else {
        return Vec::new();
    };
    if dom::node_tag(&sibling).as_deref() != Some("ul") {
        return Vec::new();
    }

    Selection::from(sibling)
        .select("li")
        .nodes()
        .iter()
        .map(|li| dom::flatten_node_text(li))
        .filter(|text| !text.is_empty())
        .take(policy.max_bullets)
        .collect()
}

/// Secondary links: list items following the "other news" heading in document
/// order, up to the policy's caps.
fn collect_other_news(doc: &Document, policy: &PipelinePolicy) -> Vec<OtherNewsRecord> {
    let heading = policy.other_news_heading.to_lowercase();
    let Some(marker) = dom::text_nodes(doc)
        .into_iter()
        .find(|n| n.text().to_lowercase().contains(&heading))
    else {
        return Vec::new();
    };

    let Some(root) = doc.select("html").nodes().first().copied() else {
        return Vec::new();
    };

    let mut records = Vec::new();
    let mut past_heading = false;
    let mut scanned = 0;
    for node in root.descendants() {
        if node.id == marker.id {
            past_heading = true;
            continue;
        }
        if !past_heading || !node.is_element() {
            continue;
        }
        if dom::node_tag(&node).as_deref() != Some("li") {
            continue;
        }

        scanned += 1;
        if scanned > policy.other_news_scan_limit {
            break;
        }
        if let Some(record) = other_news_record(&Selection::from(node), policy) {
            records.push(record);
            if records.len() >= policy.max_other_news {
                break;
            }
        }
    }
    records
}

fn other_news_record(item: &Selection, policy: &PipelinePolicy) -> Option<OtherNewsRecord> {
    let href = dom::get_attribute(&item.select("a[href]"), "href")?;
    let link = Url::parse(href.trim()).ok()?;

    let raw = dom::flatten_text(item);
    let title = raw.replace(&policy.title_artifact, "");
    let title = title.trim().to_string();
    if title.is_empty() {
        return None;
    }

    Some(OtherNewsRecord { title, link })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORY_TABLE: &str = "<table style=\"padding-top:50px\"><tr>\
        <td><a href=\"https://x/y\">🚀 Big Launch</a></td>\
        </tr></table>";

    #[test]
    fn test_extracts_article_with_bullets() {
        let doc = dom::parse(&format!(
            "<div>{STORY_TABLE}<ul><li>first point</li><li>second point</li></ul></div>"
        ));
        let digest = extract(&doc, &PipelinePolicy::default());

        assert_eq!(digest.issues.len(), 1);
        let record = &digest.issues[0];
        assert_eq!(record.title, "🚀 Big Launch");
        assert_eq!(record.link.as_str(), "https://x/y");
        assert_eq!(record.bullets, vec!["first point", "second point"]);
    }

    #[test]
    fn test_bullets_capped() {
        let items: String = (0..10).map(|i| format!("<li>point {i}</li>")).collect();
        let doc = dom::parse(&format!("<div>{STORY_TABLE}<ul>{items}</ul></div>"));
        let digest = extract(&doc, &PipelinePolicy::default());

        assert_eq!(digest.issues[0].bullets.len(), 6);
    }

    #[test]
    fn test_innermost_issue_table_wins() {
        let doc = dom::parse(&format!(
            "<table style=\"padding-top: 50px\"><tr><td>\
             <a href=\"https://outer/\">wrapper</a>{STORY_TABLE}\
             </td></tr></table>"
        ));
        let digest = extract(&doc, &PipelinePolicy::default());

        assert_eq!(digest.issues.len(), 1);
        assert_eq!(digest.issues[0].link.as_str(), "https://x/y");
    }

    #[test]
    fn test_discards_record_without_link() {
        let doc = dom::parse(
            "<table style=\"padding-top:50px\"><tr><td>🚀 No link here</td></tr></table>",
        );
        let digest = extract(&doc, &PipelinePolicy::default());
        assert!(digest.issues.is_empty());
    }

    #[test]
    fn test_discards_record_with_unparseable_link() {
        let doc = dom::parse(
            "<table style=\"padding-top:50px\"><tr><td>\
             <a href=\"not a url\">🚀 Broken</a></td></tr></table>",
        );
        let digest = extract(&doc, &PipelinePolicy::default());
        assert!(digest.issues.is_empty());
    }

    #[test]
    fn test_plain_table_is_not_an_article() {
        let doc = dom::parse(
            "<table><tr><td><a href=\"https://x/\">layout cell</a></td></tr></table>",
        );
        let digest = extract(&doc, &PipelinePolicy::default());
        assert!(digest.issues.is_empty());
    }

    #[test]
    fn test_other_news_after_heading() {
        let doc = dom::parse(
            "<ul><li><a href=\"https://early/\">before heading</a></li></ul>\
             <h2>Other news &amp; articles you might like</h2>\
             <ul>\
             <li><a href=\"https://a/\">First story LINK</a></li>\
             <li><a href=\"https://b/\">Second story</a></li>\
             <li>no link here</li>\
             </ul>",
        );
        let digest = extract(&doc, &PipelinePolicy::default());

        assert_eq!(digest.other_news.len(), 2);
        assert_eq!(digest.other_news[0].title, "First story");
        assert_eq!(digest.other_news[0].link.as_str(), "https://a/");
        assert_eq!(digest.other_news[1].title, "Second story");
    }

    #[test]
    fn test_other_news_capped() {
        let items: String = (0..60)
            .map(|i| format!("<li><a href=\"https://s/{i}\">story {i}</a></li>"))
            .collect();
        let doc = dom::parse(&format!(
            "<h2>Other news &amp; articles you might like</h2><ul>{items}</ul>"
        ));
        let digest = extract(&doc, &PipelinePolicy::default());
        assert_eq!(digest.other_news.len(), 40);
    }

    #[test]
    fn test_no_heading_means_no_other_news() {
        let doc = dom::parse("<ul><li><a href=\"https://a/\">story</a></li></ul>");
        let digest = extract(&doc, &PipelinePolicy::default());
        assert!(digest.other_news.is_empty());
        assert!(digest.is_empty());
    }
}
