//! Newsletter sanitization, record extraction and protected-term translation.
//!
//! The crate takes one raw newsletter issue as HTML and produces a rebranded,
//! boilerplate-free, optionally machine-translated issue plus structured
//! article records. Removal is heuristic and deliberately conservative: every
//! deletion narrows to the smallest qualifying block, refuses to cross a size
//! ceiling, and never touches protected article content. An aggressive run
//! that strips too much falls back once to a relaxed policy before aborting.
//!
//! # Example
//!
//! ```
//! use onesip::{PipelinePolicy, TranslationOptions, Translator};
//!
//! // No translation service configured for this run; the stage is skipped.
//! let policy = PipelinePolicy {
//!     require_translation: false,
//!     ..PipelinePolicy::default()
//! };
//! let translator = Translator::unconfigured(TranslationOptions::default());
//!
//! let body = "A longer body of editorial text follows the lead story. ".repeat(6);
//! let html = format!(
//!     "<table style=\"padding-top: 50px\"><tr>\
//!      <td><a href=\"https://example.com/launch\">🚀 Big Launch</a></td>\
//!      </tr></table><p>{body}</p>"
//! );
//!
//! let output = onesip::process_issue_with_policy(&html, &translator, &policy)?;
//! assert_eq!(output.digest.issues[0].title, "🚀 Big Launch");
//! assert!(output.visible_text_len >= 200);
//! # Ok::<(), onesip::Error>(())
//! ```

pub mod classifier;
pub mod dom;
mod error;
pub mod extractor;
pub mod patterns;
pub mod pipeline;
pub mod policy;
pub mod record;
pub mod remover;
pub mod translator;

pub use error::{Error, Result};
pub use pipeline::{
    extract_digest, process_issue, process_issue_with_policy, IssueOutput, Stage,
};
pub use policy::{PipelinePolicy, RemovalPolicy, SizeWindow, TranslationOptions};
pub use record::{ArticleRecord, DatedDigest, IssueDigest, OtherNewsRecord};
pub use translator::{DeepLClient, ServiceError, TranslationService, Translator};
