//! Error type shared by every component of the engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by loading and querying.
///
/// Lexicon misses and unparseable dates are not errors: the first falls back
/// to the input token, the second drops the offending document.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of the inverted index file does not follow `term,doc:field,...`.
    #[error("malformed index row {line}: {reason}")]
    MalformedIndexRow { line: usize, reason: String },

    /// A lexicon line without the surface/lemma separator.
    #[error("malformed lexicon row {line}")]
    MalformedLexiconRow { line: usize },

    #[error("unknown field tag: {0}")]
    UnknownFieldTag(String),

    /// A date pattern that is neither `YYYY`, `YYYY-MM` nor `YYYY-MM-DD` once
    /// its wildcards are removed.
    #[error("invalid date format: {0}")]
    DateFormat(String),

    /// A parsed section with no entry in the normalization table.
    #[error("unknown section: {0}")]
    UnknownSection(String),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
