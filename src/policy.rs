//! Tunable policies for classification, removal and translation.
//!
//! The removal heuristics went through many hand-tuned iterations; this module
//! consolidates every keyword set, character-size window and match-count
//! threshold into policy structs so each pass is one configurable algorithm
//! instead of a family of near-duplicates. Defaults carry the empirically
//! tuned values.

use std::time::Duration;

/// Inclusive character-length window a block must fall into to be a deletion
/// candidate for a given removal context.
///
/// Oversized matches are assumed to encompass legitimate content and are never
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeWindow {
    /// Minimum flattened-text length (characters).
    pub min: usize,
    /// Maximum flattened-text length (characters).
    pub max: usize,
}

impl SizeWindow {
    /// Window covering `min..=max` characters.
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Whether a text length falls inside the window.
    #[must_use]
    pub const fn contains(&self, len: usize) -> bool {
        len >= self.min && len <= self.max
    }
}

/// Keyword set and size bounds governing one classification/removal pass.
#[derive(Debug, Clone)]
pub struct RemovalPolicy {
    /// Boilerplate keywords, matched case-insensitively as substrings.
    pub keywords: Vec<String>,

    /// Keyword matches required before a container (div, section, table, row)
    /// becomes a candidate. Leaf tags are candidates at a single match.
    pub container_min_matches: usize,

    /// Window for div/section containers.
    pub container_window: SizeWindow,

    /// Window for table-family ancestors (table, tr, td).
    pub table_window: SizeWindow,

    /// Window for the leaf fallback (p, headings, cells).
    pub leaf_window: SizeWindow,
}

impl RemovalPolicy {
    /// Policy with the given keyword set and the default windows.
    #[must_use]
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Default for RemovalPolicy {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            container_min_matches: 2,
            container_window: SizeWindow::new(1, 2500),
            table_window: SizeWindow::new(1, 1800),
            leaf_window: SizeWindow::new(1, 1600),
        }
    }
}

/// Header/footer boilerplate keywords of the source newsletter.
const HEADER_FOOTER_KEYWORDS: &[&str] = &[
    "Join Free",
    "Upgrade",
    "Together with",
    "this is your daily",
    "Not subscribed to",
    "Subscribe for free",
    "Advertise",
    "Feedback",
    "Read Online",
];

/// Keywords marking cross-sell sections pushed between articles. Issues ship
/// the pitch in English or Korean depending on the edition.
const CROSS_SELL_KEYWORDS: &[&str] = &[
    "Want to master the AI tools we cover every day?",
    "매일 다루는 AI 도구를 마스터하고 싶으신가요?",
    "AI 아카데미",
];

/// Keywords marking sponsored-partner sections.
const PARTNER_KEYWORDS: &[&str] = &["FROM OUR PARTNER"];

/// Full configuration of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelinePolicy {
    /// Header/footer pass: short-block removal over a fixed tag set.
    pub header_footer: RemovalPolicy,

    /// Keyword-section pass for sponsored-partner text.
    pub partner_sections: RemovalPolicy,

    /// Keyword-section pass for cross-sell sections.
    pub cross_sell_sections: RemovalPolicy,

    /// Narrowing policy for promotional-marker removal. Promo blocks are
    /// larger than ordinary boilerplate, so the windows are wider.
    pub promo: RemovalPolicy,

    /// Element id of the main promotional marker.
    pub promo_marker_id: String,

    /// Lowercased text identifying a promotional marker heading.
    pub promo_marker_text: String,

    /// Element ids of secondary promotional blocks removed with their
    /// enclosing table row.
    pub spotlight_ids: Vec<String>,

    /// Link hosts identifying promotional blocks regardless of wording.
    pub promo_link_hosts: Vec<String>,

    /// CSS selectors for explicitly tagged ad nodes.
    pub ad_selectors: String,

    /// Upper bound on repeated promotional-marker removals per run.
    pub max_promo_blocks: usize,

    /// Brand term to replace in visible text.
    pub brand_from: String,

    /// Replacement brand term.
    pub brand_to: String,

    /// Heading text introducing the secondary-links section.
    pub other_news_heading: String,

    /// Literal artifact suffix stripped from secondary-link titles.
    pub title_artifact: String,

    /// Hard cap on bullets per article record.
    pub max_bullets: usize,

    /// Hard cap on secondary-link records.
    pub max_other_news: usize,

    /// List items scanned past the secondary-links heading before giving up.
    pub other_news_scan_limit: usize,

    /// Minimum visible-text length of viable output; below this the run is
    /// retried with [`PipelinePolicy::relaxed`] and aborts if still short.
    pub min_viable_text: usize,

    /// Run the header/footer pass.
    pub run_header_footer: bool,

    /// Run the promotional-span passes (marker span, spotlight ids, repeated
    /// markers).
    pub run_promo_span: bool,

    /// Fail the run with `TranslationUnavailable` when no translation service
    /// is configured. When false, the translation stage is skipped instead.
    pub require_translation: bool,
}

impl PipelinePolicy {
    /// Reduced removal configuration used as a fallback when the aggressive
    /// pass yields unviably small output.
    ///
    /// Skips the header/footer pass and the promotional-span deletion, retains
    /// keyword-section removal.
    #[must_use]
    pub fn relaxed(&self) -> Self {
        Self {
            run_header_footer: false,
            run_promo_span: false,
            ..self.clone()
        }
    }
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self {
            header_footer: RemovalPolicy {
                keywords: HEADER_FOOTER_KEYWORDS.iter().map(ToString::to_string).collect(),
                container_min_matches: 2,
                container_window: SizeWindow::new(1, 1600),
                table_window: SizeWindow::new(1, 1600),
                leaf_window: SizeWindow::new(1, 1600),
            },
            partner_sections: RemovalPolicy::with_keywords(PARTNER_KEYWORDS.iter().copied()),
            cross_sell_sections: RemovalPolicy::with_keywords(CROSS_SELL_KEYWORDS.iter().copied()),
            promo: RemovalPolicy {
                keywords: vec!["from our partner".to_string()],
                container_min_matches: 1,
                container_window: SizeWindow::new(1, 3000),
                table_window: SizeWindow::new(1, 3000),
                leaf_window: SizeWindow::new(1, 1600),
            },
            promo_marker_id: "main-ad-title".to_string(),
            promo_marker_text: "from our partner".to_string(),
            spotlight_ids: vec![
                "spotlight-ad-block".to_string(),
                "spotlight-ad-title".to_string(),
            ],
            promo_link_hosts: vec!["academy.techpresso.co".to_string()],
            ad_selectors: "[data-testid='ad'], .sponsor, .advertisement".to_string(),
            max_promo_blocks: 5,
            brand_from: "Techpresso".to_string(),
            brand_to: "OneSip".to_string(),
            other_news_heading: "Other news & articles you might like".to_string(),
            title_artifact: "LINK".to_string(),
            max_bullets: 6,
            max_other_news: 40,
            other_news_scan_limit: 80,
            min_viable_text: 200,
            run_header_footer: true,
            run_promo_span: true,
            require_translation: true,
        }
    }
}

/// Limits and protected terms governing one `translate()` call and the
/// per-node document pass.
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Target language code passed to the service.
    pub target_lang: String,

    /// Terms shielded from the service by reversible placeholders.
    pub protected_terms: Vec<String>,

    /// Chunk size ceiling (characters) for paragraph-boundary splitting.
    pub max_chunk_chars: usize,

    /// Text nodes longer than this are skipped to bound cost and failure
    /// risk.
    pub max_node_chars: usize,

    /// Text nodes with fewer alphabetic characters than this are skipped.
    pub min_alpha_chars: usize,

    /// Attempts per chunk before degrading to the original text.
    pub retries: usize,

    /// Base backoff between attempts; attempt `n` sleeps `backoff * n`.
    pub backoff: Duration,

    /// Containers whose text is never visible and never translated.
    pub skip_containers: Vec<String>,

    /// Emphasis contexts used for proper-noun callouts; their text is left
    /// untranslated.
    pub no_translate: Vec<String>,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            target_lang: "KO".to_string(),
            protected_terms: vec!["OneSip".to_string()],
            max_chunk_chars: 4500,
            max_node_chars: 2000,
            min_alpha_chars: 2,
            retries: 3,
            backoff: Duration::from_secs(2),
            skip_containers: vec!["script".to_string(), "style".to_string()],
            no_translate: vec!["strong".to_string(), "b".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_window_bounds() {
        let w = SizeWindow::new(1, 100);
        assert!(!w.contains(0));
        assert!(w.contains(1));
        assert!(w.contains(100));
        assert!(!w.contains(101));
    }

    #[test]
    fn test_relaxed_drops_aggressive_passes_only() {
        let policy = PipelinePolicy::default();
        let relaxed = policy.relaxed();

        assert!(!relaxed.run_header_footer);
        assert!(!relaxed.run_promo_span);
        // Keyword-section removal and the viability threshold are retained.
        assert_eq!(relaxed.partner_sections.keywords, policy.partner_sections.keywords);
        assert_eq!(relaxed.min_viable_text, policy.min_viable_text);
    }

    #[test]
    fn test_cross_sell_keywords_cover_both_languages() {
        let policy = PipelinePolicy::default();
        let keywords = &policy.cross_sell_sections.keywords;
        assert!(keywords.iter().any(|k| k.starts_with("Want to master")));
        assert!(keywords.iter().any(|k| k == "매일 다루는 AI 도구를 마스터하고 싶으신가요?"));
        assert!(keywords.iter().any(|k| k == "AI 아카데미"));
    }

    #[test]
    fn test_default_windows_match_tuned_values() {
        let policy = PipelinePolicy::default();
        assert_eq!(policy.header_footer.container_window.max, 1600);
        assert_eq!(policy.partner_sections.container_window.max, 2500);
        assert_eq!(policy.partner_sections.table_window.max, 1800);
        assert_eq!(policy.promo.container_window.max, 3000);
    }
}
