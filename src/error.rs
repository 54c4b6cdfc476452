//! Error types for the sanitization pipeline.
//!
//! Almost every heuristic failure in this crate recovers locally: a removal
//! pass that finds no qualifying candidate removes nothing, and a translation
//! chunk that exhausts its retries is kept untranslated. The variants below
//! are the few conditions that abort a run.

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No issue markup was supplied for this run.
    #[error("no issue markup available")]
    NoInput,

    /// Translation was required but no backing service is configured.
    #[error("translation service is not configured")]
    TranslationUnavailable,

    /// Both the aggressive and the relaxed sanitization pass produced output
    /// below the viability threshold.
    #[error("sanitized output too small: {len} chars of visible text (minimum {min})")]
    OutputTooSmall {
        /// Visible-text length of the relaxed-pass output.
        len: usize,
        /// Minimum viable visible-text length.
        min: usize,
    },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
