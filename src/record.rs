//! Structured records extracted from one newsletter issue.
//!
//! These are the persisted output of a run: one dated digest per issue,
//! serializable to JSON for the external retention layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// One extracted newsletter story.
///
/// A record is only produced when both a non-empty title and a parseable link
/// are present; anything less is discarded during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Flattened title text of the story cell.
    pub title: String,

    /// Canonical story link (first hyperlink in the first cell).
    pub link: Url,

    /// Bullet summary, capped at 6 entries.
    pub bullets: Vec<String>,
}

/// One secondary "more stories" link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherNewsRecord {
    /// Link title with the literal artifact suffix stripped.
    pub title: String,

    /// Target of the list-item's hyperlink.
    pub link: Url,
}

/// Structured extraction result for one issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDigest {
    /// Article records in document order.
    pub issues: Vec<ArticleRecord>,

    /// Secondary links in document order, capped at 40.
    pub other_news: Vec<OtherNewsRecord>,
}

impl IssueDigest {
    /// Whether extraction yielded no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.other_news.is_empty()
    }
}

/// A digest keyed by its issue's publish date, as persisted downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedDigest {
    /// Publish date of the issue.
    pub date: NaiveDate,

    /// Extracted records.
    #[serde(flatten)]
    pub digest: IssueDigest,
}

impl DatedDigest {
    /// Key a digest by its issue date.
    #[must_use]
    pub fn new(date: NaiveDate, digest: IssueDigest) -> Self {
        Self { date, digest }
    }
}
