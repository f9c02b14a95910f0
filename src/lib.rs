//! Query execution engine for a precomputed, on-disk inverted index.
//!
//! Given a whitespace-separated query and a boolean mode, returns the
//! top-K documents ranked by a BM25-style score. Index construction, the
//! interactive front-end, and tokenization policy beyond the minimal
//! contract in [`tokenizer`] are all external collaborators — this crate
//! only executes queries against an index already built elsewhere.

pub mod corpus;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod lexicon;
pub mod processor;
pub mod tokenizer;
pub mod varbyte;

pub use corpus::{CorpusStats, DocLengths, PageTable};
pub use cursor::PostingsCursor;
pub use error::{SearchWarning, StartupError};
pub use executor::{CancellationToken, EngineConfig, Hit, Mode};
pub use lexicon::{Lexicon, LexiconEntry};
pub use processor::{Processor, QueryProcessor, SearchOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
