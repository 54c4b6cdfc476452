//! Run orchestration: staged sanitization with a relaxed fallback pass.
//!
//! A run moves one issue through a fixed stage order. The removal stages are
//! destructive and heuristic, so the finalized output is checked against a
//! viability threshold: too little visible text triggers one retry with the
//! relaxed policy, and a second failure aborts the run instead of shipping a
//! gutted issue.

use dom_query::{Document, Selection};
use log::{debug, info, warn};

use crate::dom;
use crate::error::{Error, Result};
use crate::extractor;
use crate::patterns::{CONTENT_MARKER, EMPTY_PARENS, MULTI_SPACE, VISIBLE_URL};
use crate::policy::PipelinePolicy;
use crate::record::IssueDigest;
use crate::remover;
use crate::translator::{self, Translator};

/// Processing stages of one run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Raw,
    HeaderFooterStripped,
    PromoStripped,
    Branded,
    UrlStripped,
    Translated,
    Finalized,
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!("stage {stage:?} -> {next:?}");
    *stage = next;
}

/// Result of one completed run.
#[derive(Debug)]
pub struct IssueOutput {
    /// Sanitized (and, when configured, translated) issue body markup.
    pub html: String,

    /// Structured records extracted from the sanitized document.
    pub digest: IssueDigest,

    /// Visible-text length of the output body, in characters.
    pub visible_text_len: usize,

    /// Whether the aggressive pass fell through to the relaxed policy.
    pub relaxed_fallback: bool,
}

/// Process one issue with the default policy.
pub fn process_issue(html: &str, translator: &Translator) -> Result<IssueOutput> {
    process_issue_with_policy(html, translator, &PipelinePolicy::default())
}

/// Process one issue: sanitize, extract records, translate, serialize. The
/// finalized output is checked against the viability threshold with one
/// relaxed retry.
pub fn process_issue_with_policy(
    html: &str,
    translator: &Translator,
    policy: &PipelinePolicy,
) -> Result<IssueOutput> {
    if html.trim().is_empty() {
        return Err(Error::NoInput);
    }

    let (doc, digest, relaxed_fallback) =
        with_relaxed_fallback(policy, |p| run_pipeline(html, translator, p))?;

    Ok(IssueOutput {
        html: dom::body_html(&doc),
        digest,
        visible_text_len: dom::visible_text_len(&doc),
        relaxed_fallback,
    })
}

/// Extract structured records from raw issue markup without translating.
pub fn extract_digest(html: &str, policy: &PipelinePolicy) -> Result<IssueDigest> {
    if html.trim().is_empty() {
        return Err(Error::NoInput);
    }
    let (_, digest, _) = with_relaxed_fallback(policy, |p| Ok(run_sanitize(html, p)))?;
    Ok(digest)
}

/// Run one full pass; if the finalized output has too little visible text,
/// retry once from the original markup with the relaxed policy.
fn with_relaxed_fallback<F>(
    policy: &PipelinePolicy,
    run: F,
) -> Result<(Document, IssueDigest, bool)>
where
    F: Fn(&PipelinePolicy) -> Result<(Document, IssueDigest)>,
{
    let (doc, digest) = run(policy)?;
    let len = dom::visible_text_len(&doc);
    if len >= policy.min_viable_text {
        return Ok((doc, digest, false));
    }
    warn!(
        "finalized output has {len} chars of visible text (minimum {}), retrying with relaxed policy",
        policy.min_viable_text
    );

    let relaxed = policy.relaxed();
    let (doc, digest) = run(&relaxed)?;
    let len = dom::visible_text_len(&doc);
    if len >= policy.min_viable_text {
        return Ok((doc, digest, true));
    }
    Err(Error::OutputTooSmall {
        len,
        min: policy.min_viable_text,
    })
}

/// Sanitization stages plus the translation stage under one policy.
fn run_pipeline(
    html: &str,
    translator: &Translator,
    policy: &PipelinePolicy,
) -> Result<(Document, IssueDigest)> {
    let (doc, digest) = run_sanitize(html, policy);

    let mut stage = Stage::UrlStripped;
    if translator.is_configured() {
        translator::translate_document(&doc, translator)?;
        advance(&mut stage, Stage::Translated);
    } else if policy.require_translation {
        return Err(Error::TranslationUnavailable);
    } else {
        info!("no translation service configured, skipping translation stage");
    }
    advance(&mut stage, Stage::Finalized);

    Ok((doc, digest))
}

/// All pre-translation stages, in order.
///
/// Structured records are extracted from a snapshot taken right after the
/// removal stages: branding and URL stripping rewrite visible text, and the
/// records must keep the source wording.
fn run_sanitize(html: &str, policy: &PipelinePolicy) -> (Document, IssueDigest) {
    let doc = dom::parse(html);
    let mut stage = Stage::Raw;

    if policy.run_header_footer {
        remover::strip_header_footer(&doc, policy);
    }
    advance(&mut stage, Stage::HeaderFooterStripped);

    if policy.run_promo_span {
        remover::strip_promo_span(&doc, policy);
        remover::strip_spotlight_blocks(&doc, policy);
        remover::strip_promo_markers(&doc, policy);
    }
    remover::strip_promo_links(&doc, policy);
    remover::strip_keyword_sections(&doc, &policy.partner_sections);
    remover::strip_keyword_sections(&doc, &policy.cross_sell_sections);
    remover::strip_ad_selectors(&doc, policy);
    advance(&mut stage, Stage::PromoStripped);

    let snapshot = dom::clone_document(&doc);
    let digest = extractor::extract(&snapshot, policy);

    replace_brand(&doc, policy);
    advance(&mut stage, Stage::Branded);

    strip_visible_urls(&doc);
    align_first_issue(&doc);
    advance(&mut stage, Stage::UrlStripped);

    (doc, digest)
}

/// Replace the source brand term in visible text nodes.
fn replace_brand(doc: &Document, policy: &PipelinePolicy) {
    if policy.brand_from.is_empty() {
        return;
    }
    for node in dom::text_nodes(doc) {
        if !dom::is_attached(&node) || skip_invisible(&node) {
            continue;
        }
        let text = node.text().to_string();
        if !text.contains(&policy.brand_from) {
            continue;
        }
        dom::replace_text_node(&node, &text.replace(&policy.brand_from, &policy.brand_to));
    }
}

/// Strip URLs displayed as visible text, then tidy the remnants. Hyperlink
/// `href` attributes are never touched; links stay clickable.
fn strip_visible_urls(doc: &Document) {
    for node in dom::text_nodes(doc) {
        if !dom::is_attached(&node) || skip_invisible(&node) {
            continue;
        }
        let text = node.text().to_string();
        if !VISIBLE_URL.is_match(&text) {
            continue;
        }
        let cleaned = VISIBLE_URL.replace_all(&text, "");
        let cleaned = EMPTY_PARENS.replace_all(&cleaned, "");
        let cleaned = MULTI_SPACE.replace_all(&cleaned, " ");
        dom::replace_text_node(&node, cleaned.trim());
    }
}

fn skip_invisible(node: &dom::NodeRef) -> bool {
    matches!(
        dom::parent_tag(node).as_deref(),
        Some("script" | "style" | "head" | "title")
    )
}

/// Left-align the first story cell. Issue templates center the lead story,
/// which reads poorly after boilerplate around it is gone.
fn align_first_issue(doc: &Document) {
    let Some(marker) = dom::text_nodes(doc)
        .into_iter()
        .find(|n| dom::is_attached(n) && CONTENT_MARKER.is_match(&n.text()))
    else {
        return;
    };
    let Some(cell) = dom::find_ancestor(&marker, &["td"]) else {
        return;
    };

    let sel = Selection::from(cell);
    let style = dom::get_attribute(&sel, "style").unwrap_or_default();
    if style.to_lowercase().contains("text-align") {
        return;
    }

    let style = style.trim().trim_end_matches(';');
    let aligned = if style.is_empty() {
        "text-align: left".to_string()
    } else {
        format!("{style}; text-align: left")
    };
    dom::set_attribute(&sel, "style", &aligned);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PipelinePolicy;
    use crate::translator::Translator;

    fn no_translation_policy() -> PipelinePolicy {
        PipelinePolicy {
            require_translation: false,
            ..PipelinePolicy::default()
        }
    }

    fn skip_translator() -> Translator {
        Translator::unconfigured(crate::policy::TranslationOptions::default())
    }

    /// An issue body comfortably above the viability threshold.
    fn viable_issue() -> String {
        let filler = "The launch brings a broad set of workflow changes for readers. ".repeat(6);
        format!(
            "<table style=\"padding-top: 50px\"><tr>\
             <td><a href=\"https://x/y\">🚀 Big Launch</a></td>\
             </tr></table>\
             <p>{filler}</p>"
        )
    }

    #[test]
    fn test_blank_input_is_an_error() {
        let err = process_issue_with_policy("  \n ", &skip_translator(), &no_translation_policy());
        assert!(matches!(err, Err(Error::NoInput)));
    }

    #[test]
    fn test_required_translation_without_service_fails() {
        let err = process_issue(&viable_issue(), &skip_translator());
        assert!(matches!(err, Err(Error::TranslationUnavailable)));
    }

    #[test]
    fn test_run_without_translation_when_not_required() {
        let out = process_issue_with_policy(
            &viable_issue(),
            &skip_translator(),
            &no_translation_policy(),
        )
        .unwrap();

        assert!(!out.relaxed_fallback);
        assert!(out.visible_text_len >= 200);
        assert_eq!(out.digest.issues.len(), 1);
        assert_eq!(out.digest.issues[0].title, "🚀 Big Launch");
    }

    #[test]
    fn test_brand_replacement_in_visible_text() {
        let html = format!("{}<p>Techpresso thanks its readers.</p>", viable_issue());
        let out =
            process_issue_with_policy(&html, &skip_translator(), &no_translation_policy()).unwrap();

        assert!(out.html.contains("OneSip thanks its readers."));
        assert!(!out.html.contains("Techpresso"));
    }

    #[test]
    fn test_visible_urls_stripped_but_hrefs_kept() {
        let html = format!(
            "{}<p>Read it (https://example.com/post) today.</p>",
            viable_issue()
        );
        let out =
            process_issue_with_policy(&html, &skip_translator(), &no_translation_policy()).unwrap();

        assert!(out.html.contains("Read it today."));
        assert!(!out.html.contains("example.com"));
        // The story link attribute survives untouched.
        assert!(out.html.contains("href=\"https://x/y\""));
    }

    #[test]
    fn test_first_story_cell_left_aligned() {
        let out = process_issue_with_policy(
            &viable_issue(),
            &skip_translator(),
            &no_translation_policy(),
        )
        .unwrap();

        assert!(out.html.contains("text-align: left"));
    }

    #[test]
    fn test_relaxed_fallback_recovers_short_output() {
        // Every paragraph matches header/footer keywords, so the aggressive
        // pass strips nearly everything and the relaxed pass must rescue it.
        let paragraphs = "<p>Subscribe for free to keep reading our daily letter.</p>".repeat(8);
        let html = format!(
            "<table style=\"padding-top:50px\"><tr>\
             <td><a href=\"https://x/y\">🚀 Lead</a></td></tr></table>{paragraphs}"
        );

        let out =
            process_issue_with_policy(&html, &skip_translator(), &no_translation_policy()).unwrap();
        assert!(out.relaxed_fallback);
        assert!(out.visible_text_len >= 200);
    }

    #[test]
    fn test_output_too_small_aborts() {
        let html = "<p>Subscribe for free.</p><p>tiny body</p>";
        let err = process_issue_with_policy(html, &skip_translator(), &no_translation_policy());
        assert!(matches!(err, Err(Error::OutputTooSmall { min: 200, .. })));
    }

    #[test]
    fn test_records_extracted_before_rebranding() {
        let filler = "The launch brings a broad set of workflow changes for readers. ".repeat(6);
        let html = format!(
            "<table style=\"padding-top: 50px\"><tr>\
             <td><a href=\"https://x/y\">🚀 Techpresso Launch</a></td>\
             </tr></table><p>{filler}</p>"
        );

        let out =
            process_issue_with_policy(&html, &skip_translator(), &no_translation_policy()).unwrap();

        // Records keep the source wording; the output markup is rebranded.
        assert_eq!(out.digest.issues[0].title, "🚀 Techpresso Launch");
        assert!(out.html.contains("OneSip Launch"));
        assert!(!out.html.contains("Techpresso"));
    }

    #[test]
    fn test_records_keep_visible_urls_stripped_from_output() {
        let html = format!(
            "{}<h2>Other news &amp; articles you might like</h2>\
             <ul><li><a href=\"https://a/\">Read www.example.com coverage</a></li></ul>",
            viable_issue()
        );

        let out =
            process_issue_with_policy(&html, &skip_translator(), &no_translation_policy()).unwrap();

        assert_eq!(
            out.digest.other_news[0].title,
            "Read www.example.com coverage"
        );
        assert!(!out.html.contains("www.example.com"));
    }

    #[test]
    fn test_viability_measured_on_translated_output() {
        struct Shrinking;

        impl crate::translator::TranslationService for Shrinking {
            fn translate(
                &self,
                _text: &str,
                _lang: &str,
            ) -> std::result::Result<String, crate::translator::ServiceError> {
                Ok("x".to_string())
            }
        }

        let translator = Translator::new(
            Box::new(Shrinking),
            crate::policy::TranslationOptions::default(),
        );

        // Viable before translation, gutted by it; the relaxed retry cannot
        // help, so the run aborts instead of shipping a near-empty issue.
        let err = process_issue(&viable_issue(), &translator);
        assert!(matches!(err, Err(Error::OutputTooSmall { .. })));
    }

    #[test]
    fn test_extract_digest_skips_translation_entirely() {
        let digest = extract_digest(&viable_issue(), &no_translation_policy()).unwrap();
        assert_eq!(digest.issues.len(), 1);
        assert_eq!(digest.issues[0].link.as_str(), "https://x/y");
    }
}
