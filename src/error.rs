//! Crate-wide error and diagnostic taxonomy.
//!
//! Startup failures abort construction (`StartupError`). Everything else a
//! query can encounter is recovered inside the executor and reported back
//! as a `SearchWarning` riding along with a normal result, never as a
//! panic or an early return with no results.

use thiserror::Error;

/// Fatal failure while opening a [`crate::processor::QueryProcessor`].
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {file} at byte offset {offset}: {reason}")]
    MalformedRecord {
        file: String,
        offset: u64,
        reason: String,
    },

    #[error("invalid UTF-8 in {field} of {file}")]
    InvalidUtf8 { file: String, field: &'static str },
}

/// Non-fatal condition surfaced alongside a search result.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchWarning {
    /// A query term does not appear in the lexicon at all.
    UnknownTerm(String),
    /// Every query term was discarded by tokenization or unknown.
    EmptyQuery,
    /// A posting list could not be read; that cursor was invalidated.
    IoError { term: String, reason: String },
    /// The query was cancelled cooperatively before completion.
    Cancelled,
}

impl std::fmt::Display for SearchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTerm(term) => write!(f, "unknown term: {term}"),
            Self::EmptyQuery => write!(f, "empty query"),
            Self::IoError { term, reason } => {
                write!(f, "I/O error reading postings for '{term}': {reason}")
            }
            Self::Cancelled => write!(f, "query cancelled"),
        }
    }
}
