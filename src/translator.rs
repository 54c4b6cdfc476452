//! Chunked, placeholder-protected text translation.
//!
//! Brand names and other protected terms are swapped for opaque placeholders
//! before the text leaves the process, so the service can neither translate
//! nor transliterate them; the placeholders are reversed on the way back.
//! Long texts are split at paragraph boundaries into size-bounded chunks, and
//! a chunk that exhausts its retries degrades to its original text instead of
//! failing the run.

use std::thread;

use log::{debug, warn};
use serde::Deserialize;

use crate::dom::{self, Document};
use crate::error::{Error, Result};
use crate::patterns::{NON_ALNUM, PARAGRAPH_BREAK, VISIBLE_URL};
use crate::policy::TranslationOptions;

/// Failure of a single service call. Retried per chunk; never aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Network-level failure reaching the service.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status from the service.
    #[error("service returned status {0}")]
    Status(u16),

    /// Response body did not carry a translation.
    #[error("malformed service response: {0}")]
    Malformed(String),
}

/// A synchronous machine-translation backend.
pub trait TranslationService: Send + Sync {
    /// Translate `text` into `target_lang`, preserving formatting.
    fn translate(&self, text: &str, target_lang: &str) -> std::result::Result<String, ServiceError>;
}

/// DeepL REST backend over the blocking HTTP client.
pub struct DeepLClient {
    http: reqwest::blocking::Client,
    api_key: String,
    server_url: String,
}

#[derive(Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Deserialize)]
struct DeepLTranslation {
    text: String,
}

impl DeepLClient {
    /// Default endpoint of the free-tier API.
    pub const DEFAULT_SERVER_URL: &'static str = "https://api-free.deepl.com";

    /// Client against the free-tier endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_server_url(api_key, Self::DEFAULT_SERVER_URL)
    }

    /// Client against a specific endpoint (pro tier, or a test server).
    #[must_use]
    pub fn with_server_url(api_key: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            api_key: api_key.into(),
            server_url: server_url.into(),
        }
    }
}

impl TranslationService for DeepLClient {
    fn translate(&self, text: &str, target_lang: &str) -> std::result::Result<String, ServiceError> {
        let url = format!("{}/v2/translate", self.server_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .form(&[
                ("auth_key", self.api_key.as_str()),
                ("text", text),
                ("target_lang", target_lang),
                ("preserve_formatting", "1"),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let body: DeepLResponse = response.json()?;
        body.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| ServiceError::Malformed("empty translations array".to_string()))
    }
}

enum Backend {
    /// No service configured; translation calls fail explicitly.
    Unconfigured,
    Service(Box<dyn TranslationService>),
}

/// Translation front-end: term protection, chunking, retry and degradation.
pub struct Translator {
    backend: Backend,
    options: TranslationOptions,
}

impl Translator {
    /// Translator backed by a service.
    #[must_use]
    pub fn new(service: Box<dyn TranslationService>, options: TranslationOptions) -> Self {
        Self {
            backend: Backend::Service(service),
            options,
        }
    }

    /// Translator without a backing service. Every translation call returns
    /// [`Error::TranslationUnavailable`]; pipelines configured to not require
    /// translation skip the stage instead of calling in.
    #[must_use]
    pub fn unconfigured(options: TranslationOptions) -> Self {
        Self {
            backend: Backend::Unconfigured,
            options,
        }
    }

    /// Whether a backing service is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!(self.backend, Backend::Service(_))
    }

    /// Options governing chunking and the per-node document pass.
    #[must_use]
    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    /// Translate one text, protecting terms and chunking at paragraph
    /// boundaries. Blank input is returned unchanged without a service call.
    pub fn translate(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        let Backend::Service(service) = &self.backend else {
            return Err(Error::TranslationUnavailable);
        };

        let protected = protect_terms(text, &self.options.protected_terms);
        let chunks = split_paragraph_chunks(&protected, self.options.max_chunk_chars);

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            translated.push(self.translate_chunk(service.as_ref(), chunk));
        }

        Ok(restore_terms(
            &translated.join("\n\n"),
            &self.options.protected_terms,
        ))
    }

    /// One chunk with retry and backoff; degrades to the original chunk after
    /// the final attempt fails.
    fn translate_chunk(&self, service: &dyn TranslationService, chunk: &str) -> String {
        let attempts = self.options.retries.max(1);
        for attempt in 1..=attempts {
            match service.translate(chunk, &self.options.target_lang) {
                Ok(text) => return text,
                Err(err) => {
                    warn!("translation attempt {attempt}/{attempts} failed: {err}");
                    if attempt < attempts {
                        thread::sleep(self.options.backoff * u32::try_from(attempt).unwrap_or(1));
                    }
                }
            }
        }
        warn!("keeping untranslated chunk after {attempts} failed attempts");
        chunk.to_string()
    }
}

/// Placeholder for one protected term: uppercase alphanumerics of the term
/// wrapped in a marker no translation service will touch.
fn term_placeholder(term: &str) -> String {
    let key = NON_ALNUM.replace_all(term, "").to_uppercase();
    format!("__PROTECT_{key}__")
}

/// Swap protected terms for their placeholders.
#[must_use]
pub fn protect_terms(text: &str, terms: &[String]) -> String {
    let mut out = text.to_string();
    for term in terms {
        out = out.replace(term.as_str(), &term_placeholder(term));
    }
    out
}

/// Swap placeholders back for their protected terms.
#[must_use]
pub fn restore_terms(text: &str, terms: &[String]) -> String {
    let mut out = text.to_string();
    for term in terms {
        out = out.replace(&term_placeholder(term), term);
    }
    out
}

/// Split text into chunks of at most `max_chars` characters, preferring
/// paragraph boundaries. A single oversized paragraph is force-split at
/// character offsets.
#[must_use]
pub fn split_paragraph_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in PARAGRAPH_BREAK.split(text) {
        let para_len = paragraph.chars().count();
        if current_len > 0 && current_len + 2 + para_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if para_len > max_chars {
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(force_split(paragraph, max_chars));
            continue;
        }

        if current_len > 0 {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(paragraph);
        current_len += para_len;
    }

    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}

/// Split one oversized paragraph at fixed character offsets.
fn force_split(paragraph: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}

/// Translate every eligible text node of the document in place.
///
/// A node is skipped when its parent is a non-visible or no-translate
/// container, when it carries too little alphabetic content to be prose, or
/// when it exceeds the per-node size ceiling. Returns the number of nodes
/// rewritten.
pub fn translate_document(doc: &Document, translator: &Translator) -> Result<usize> {
    let options = translator.options();

    let mut translated = 0;
    for node in dom::text_nodes(doc) {
        if !dom::is_attached(&node) {
            continue;
        }
        if let Some(tag) = dom::parent_tag(&node) {
            if options.skip_containers.contains(&tag) || options.no_translate.contains(&tag) {
                continue;
            }
        }

        let original = node.text().to_string();
        // Visible URL remnants confuse the service and carry no prose.
        let input = VISIBLE_URL.replace_all(&original, "").to_string();

        let alpha = input.chars().filter(|c| c.is_alphabetic()).count();
        if alpha < options.min_alpha_chars {
            continue;
        }
        if input.chars().count() > options.max_node_chars {
            debug!("skipping oversized text node ({} chars)", input.chars().count());
            continue;
        }

        let output = translator.translate(&input)?;
        if output != original {
            dom::replace_text_node(&node, &output);
            translated += 1;
        }
    }

    debug!("translated {translated} text nodes");
    Ok(translated)
}
