//! Facade: opens the on-disk index/lexicon/corpus files once, then serves
//! `search` calls concurrently against the immutable, shared state.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::corpus::{CorpusStats, DocLengths, PageTable};
use crate::cursor::PostingsCursor;
use crate::error::{SearchWarning, StartupError};
use crate::executor::{self, CancellationToken, EngineConfig, Hit, Mode};
use crate::lexicon::Lexicon;
use crate::tokenizer;

/// Entry point: opens the four on-disk artifacts and returns a ready
/// [`Processor`]. All startup failures are fatal — a corrupted or missing
/// file aborts construction rather than producing a half-usable engine.
pub struct QueryProcessor;

impl QueryProcessor {
    pub fn open(
        index_path: impl AsRef<Path>,
        lexicon_path: impl AsRef<Path>,
        page_table_path: impl AsRef<Path>,
        doc_lengths_path: impl AsRef<Path>,
    ) -> Result<Processor, StartupError> {
        Self::open_with_config(
            index_path,
            lexicon_path,
            page_table_path,
            doc_lengths_path,
            EngineConfig::default(),
        )
    }

    pub fn open_with_config(
        index_path: impl AsRef<Path>,
        lexicon_path: impl AsRef<Path>,
        page_table_path: impl AsRef<Path>,
        doc_lengths_path: impl AsRef<Path>,
        config: EngineConfig,
    ) -> Result<Processor, StartupError> {
        // Doc lengths load first: N governs lexicon IDF, so lexicon load follows.
        let doc_lengths = DocLengths::load(&doc_lengths_path)?;
        let stats = doc_lengths.stats();

        let lexicon = Lexicon::load(&lexicon_path, stats.n)?;
        let page_table = PageTable::load(&page_table_path)?;

        let index_path_ref = index_path.as_ref();
        let file = File::open(index_path_ref).map_err(|source| StartupError::Io {
            path: index_path_ref.display().to_string(),
            source,
        })?;
        // Safety: the mapping is read-only and outlives every cursor via Arc;
        // the file is not expected to be mutated out from under the process.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| StartupError::Io {
            path: index_path_ref.display().to_string(),
            source,
        })?;

        log::info!(
            "query processor opened: {} terms, N={}, avgdl={:.3}",
            lexicon.len(),
            stats.n,
            stats.avgdl
        );

        Ok(Processor {
            mmap: Arc::new(mmap),
            lexicon,
            page_table,
            stats,
            config,
        })
    }
}

/// A loaded index ready to serve `search` calls. Immutable after
/// construction: safe to share across threads (e.g. behind an `Arc`)
/// without any internal locking, since every field is read-only and every
/// `search` call opens its own cursors.
pub struct Processor {
    mmap: Arc<Mmap>,
    lexicon: Lexicon,
    page_table: PageTable,
    stats: CorpusStats,
    config: EngineConfig,
}

/// Full result envelope: ranked hits plus any non-fatal diagnostics
/// collected along the way (§7).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub hits: Vec<Hit>,
    pub warnings: Vec<SearchWarning>,
}

impl Processor {
    /// The literal programmatic surface from §6: ranked hits, no
    /// diagnostics. Warnings (unknown terms, I/O errors) are logged at
    /// `warn` level rather than surfaced; use [`Processor::search_verbose`]
    /// to see them directly.
    pub fn search(&self, query: &str, mode: Mode, k: u32) -> Vec<Hit> {
        let outcome = self.search_verbose(query, mode, k);
        for warning in &outcome.warnings {
            log::warn!("{warning}");
        }
        outcome.hits
    }

    /// Same as [`Processor::search`] but using the engine's configured
    /// default `top_k` (10 unless overridden at open time).
    pub fn search_default(&self, query: &str, mode: Mode) -> Vec<Hit> {
        self.search(query, mode, self.config.top_k)
    }

    /// `search`, but returning the full diagnostic envelope instead of
    /// logging and discarding warnings.
    pub fn search_verbose(&self, query: &str, mode: Mode, k: u32) -> SearchOutcome {
        self.search_with_cancellation(query, mode, k, None)
    }

    /// `search_verbose`, additionally checking `cancellation` between
    /// outer DAAT iterations. On cancellation, returns an empty result
    /// with a [`SearchWarning::Cancelled`] warning, per §5.
    pub fn search_with_cancellation(
        &self,
        query: &str,
        mode: Mode,
        k: u32,
        cancellation: Option<&CancellationToken>,
    ) -> SearchOutcome {
        let terms = tokenizer::parse_query(query);
        let mut warnings = Vec::new();

        if terms.is_empty() {
            warnings.push(SearchWarning::EmptyQuery);
            return SearchOutcome {
                hits: Vec::new(),
                warnings,
            };
        }

        let mut cursors: Vec<PostingsCursor> = Vec::with_capacity(terms.len());
        for term in &terms {
            match self.lexicon.get(term) {
                Some(entry) => match PostingsCursor::open(Arc::clone(&self.mmap), entry) {
                    Some(cursor) => cursors.push(cursor),
                    None => warnings.push(SearchWarning::IoError {
                        term: term.clone(),
                        reason: "posting range falls outside the mapped index file".to_string(),
                    }),
                },
                None => warnings.push(SearchWarning::UnknownTerm(term.clone())),
            }
        }

        if cursors.is_empty() {
            warnings.push(SearchWarning::EmptyQuery);
            return SearchOutcome {
                hits: Vec::new(),
                warnings,
            };
        }

        let (scores, cancelled) = executor::execute(cursors, mode, cancellation);
        if cancelled {
            warnings.push(SearchWarning::Cancelled);
        }

        let hits = executor::rank(scores, k, &self.page_table);
        SearchOutcome { hits, warnings }
    }

    /// Corpus size and average document length, derived once at startup.
    pub fn stats(&self) -> CorpusStats {
        self.stats
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Builds the §8 seed-suite toy corpus on disk and returns an open
    /// `Processor` over it:
    ///   doc 1 "the quick brown fox" (len 4)
    ///   doc 2 "quick brown dog" (len 3)
    ///   doc 3 "lazy fox jumps" (len 3)
    ///   doc 4 "the lazy dog" (len 3)
    fn toy_corpus() -> (tempfile::TempDir, Processor) {
        let dir = tempfile::tempdir().unwrap();

        // df=2 terms score tfs such that idf(df=2)=0 zeroes them out anyway,
        // so their tfs values are irrelevant to ranking; only "jumps" (df=1)
        // needs a realistic value to exercise a nonzero score.
        let mut index_bytes = Vec::new();
        let mut lexicon_bytes = Vec::new();

        // tfs for tf=1, dl=3 (doc 3's length), k1=1.5, b=0.75, avgdl=3.25:
        // K = 1.5*(0.25 + 0.75*3/3.25) = 1.413462; tfs = 2.5/(K+1) = 1.035867.
        let tfs_jumps_doc3 = 1.035_867_f32;

        let terms: Vec<(&str, Vec<u32>, Vec<f32>)> = vec![
            ("the", vec![1, 3], vec![1.0, 1.0]), // docs 1, 4 (gaps: 1, 4-1=3)
            ("quick", vec![1, 1], vec![1.0, 1.0]), // docs 1, 2
            ("brown", vec![1, 1], vec![1.0, 1.0]), // docs 1, 2
            ("fox", vec![1, 2], vec![1.0, 1.0]),  // docs 1, 3
            ("dog", vec![2, 2], vec![1.0, 1.0]),  // docs 2, 4
            ("lazy", vec![3, 1], vec![1.0, 1.0]), // docs 3, 4
            ("jumps", vec![3], vec![tfs_jumps_doc3]), // doc 3 only
        ];

        for (term, gaps, tfs) in &terms {
            let offset = index_bytes.len() as u64;
            let gap_bytes = crate::varbyte::encode_list(gaps);
            let length = gap_bytes.len() as u32;
            index_bytes.extend_from_slice(&gap_bytes);
            for &t in tfs {
                index_bytes.extend_from_slice(&t.to_le_bytes());
            }

            lexicon_bytes.extend_from_slice(&(term.len() as u16).to_le_bytes());
            lexicon_bytes.extend_from_slice(term.as_bytes());
            lexicon_bytes.extend_from_slice(&offset.to_le_bytes());
            lexicon_bytes.extend_from_slice(&length.to_le_bytes());
            lexicon_bytes.extend_from_slice(&(gaps.len() as u32).to_le_bytes());
            lexicon_bytes.extend_from_slice(&0u32.to_le_bytes()); // block_count
        }

        let mut page_table_bytes = Vec::new();
        for (id, name) in [(1u32, "doc1.html"), (2, "doc2.html"), (3, "doc3.html"), (4, "doc4.html")] {
            page_table_bytes.extend_from_slice(&id.to_le_bytes());
            page_table_bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
            page_table_bytes.extend_from_slice(name.as_bytes());
        }

        let mut doc_lengths_bytes = Vec::new();
        for (id, len) in [(1u32, 4u32), (2, 3), (3, 3), (4, 3)] {
            doc_lengths_bytes.extend_from_slice(&id.to_le_bytes());
            doc_lengths_bytes.extend_from_slice(&len.to_le_bytes());
        }

        let index_path = dir.path().join("index.bin");
        let lexicon_path = dir.path().join("lexicon.bin");
        let page_table_path = dir.path().join("page_table.bin");
        let doc_lengths_path = dir.path().join("doc_lengths.bin");
        File::create(&index_path).unwrap().write_all(&index_bytes).unwrap();
        File::create(&lexicon_path).unwrap().write_all(&lexicon_bytes).unwrap();
        File::create(&page_table_path).unwrap().write_all(&page_table_bytes).unwrap();
        File::create(&doc_lengths_path).unwrap().write_all(&doc_lengths_bytes).unwrap();

        let processor =
            QueryProcessor::open(&index_path, &lexicon_path, &page_table_path, &doc_lengths_path)
                .unwrap();
        (dir, processor)
    }

    #[test]
    fn stats_match_worked_example() {
        let (_dir, processor) = toy_corpus();
        let stats = processor.stats();
        assert_eq!(stats.n, 4);
        assert!((stats.avgdl - 3.25).abs() < 1e-9);
    }

    #[test]
    fn scenario_1_fox_or_ties_break_ascending() {
        let (_dir, processor) = toy_corpus();
        let hits = processor.search("fox", Mode::Or, 10);
        assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![1, 3]);
        for hit in &hits {
            assert!((hit.score).abs() < 1e-9);
        }
    }

    #[test]
    fn scenario_2_jumps_or_scores_positive() {
        let (_dir, processor) = toy_corpus();
        let hits = processor.search("jumps", Mode::Or, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 3);
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn scenario_3_quick_brown_and_matches_only_shared_docs() {
        let (_dir, processor) = toy_corpus();
        let hits = processor.search("quick brown", Mode::And, 10);
        assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn scenario_4_quick_brown_or_matches_union() {
        let (_dir, processor) = toy_corpus();
        let hits = processor.search("quick brown", Mode::Or, 10);
        assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn scenario_5_lazy_jumps_and_yields_doc3_with_positive_score() {
        let (_dir, processor) = toy_corpus();
        let hits = processor.search("lazy jumps", Mode::And, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 3);
        assert!(hits[0].score > 0.0);
    }

    #[test]
    fn scenario_6_unknown_term_diagnostic_does_not_change_result() {
        let (_dir, processor) = toy_corpus();
        let outcome = processor.search_verbose("xyzzy fox", Mode::Or, 10);
        assert_eq!(
            outcome.hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, SearchWarning::UnknownTerm(t) if t == "xyzzy")));
    }

    #[test]
    fn all_terms_unknown_returns_empty_not_an_error() {
        let (_dir, processor) = toy_corpus();
        let outcome = processor.search_verbose("xyzzy plugh", Mode::Or, 10);
        assert!(outcome.hits.is_empty());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, SearchWarning::EmptyQuery)));
    }

    #[test]
    fn empty_query_returns_empty_result() {
        let (_dir, processor) = toy_corpus();
        let outcome = processor.search_verbose("   ", Mode::Or, 10);
        assert!(outcome.hits.is_empty());
        assert!(outcome.warnings.contains(&SearchWarning::EmptyQuery));
    }
}
