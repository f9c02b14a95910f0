//! Document-At-A-Time executor: conjunctive and disjunctive merge loops
//! that drive postings cursors, accumulate BM25 scores, and rank results.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::corpus::PageTable;
use crate::cursor::PostingsCursor;

/// Boolean mode for query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    And,
    Or,
}

/// Tuning constants, exposed per §9 rather than hard-coded globals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub k1: f64,
    pub b: f64,
    pub top_k: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            top_k: 10,
        }
    }
}

/// A single ranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub doc_id: u32,
    pub doc_name: String,
    pub score: f64,
}

/// Cooperative cancellation flag shared between a query's caller and the
/// executor. Checked between outer DAAT iterations only — there is no
/// preemption mid-posting.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Newtype giving `f64` a total order for heap/sort use, mirroring the
/// teacher's local `OrderedFloat` helper. Scores here are always finite
/// sums of finite idf/tfs products, so `partial_cmp` never returns `None`
/// in practice; ties fall back to `Equal` rather than panicking.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedScore(f64);

impl Eq for OrderedScore {}

impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.partial_cmp(other).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Run the DAAT merge for `cursors` under `mode`, accumulating a
/// `doc_id -> score` map. Returns `(scores, cancelled)`; on cancellation
/// the map is discarded (empty) per §5's "return the empty result" rule.
pub fn execute(
    mut cursors: Vec<PostingsCursor>,
    mode: Mode,
    cancellation: Option<&CancellationToken>,
) -> (FxHashMap<u32, f64>, bool) {
    let mut scores = FxHashMap::default();

    if cursors.is_empty() {
        return (scores, false);
    }

    let cancelled = match mode {
        Mode::And => conjunctive(&mut cursors, &mut scores, cancellation),
        Mode::Or => disjunctive(&mut cursors, &mut scores, cancellation),
    };

    for cursor in &mut cursors {
        cursor.close();
    }

    if cancelled {
        scores.clear();
    }

    (scores, cancelled)
}

fn conjunctive(
    cursors: &mut [PostingsCursor],
    scores: &mut FxHashMap<u32, f64>,
    cancellation: Option<&CancellationToken>,
) -> bool {
    for cursor in cursors.iter_mut() {
        if !cursor.next() {
            return false;
        }
    }

    loop {
        if is_cancelled(cancellation) {
            return true;
        }

        let target = cursors.iter().map(PostingsCursor::doc_id).max().unwrap();

        let mut any_invalid = false;
        for cursor in cursors.iter_mut() {
            if cursor.doc_id() < target && !cursor.next_geq(target) {
                any_invalid = true;
            }
        }
        if any_invalid {
            return false;
        }

        let all_match = cursors.iter().all(|c| c.doc_id() == target);
        if all_match {
            let total: f64 = cursors.iter().map(|c| c.idf() * c.tfs()).sum();
            scores.insert(target, total);

            let mut any_invalid = false;
            for cursor in cursors.iter_mut() {
                if !cursor.next() {
                    any_invalid = true;
                }
            }
            if any_invalid {
                return false;
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct HeapEntry {
    doc_id: u32,
    cursor_idx: usize,
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.doc_id.cmp(&other.doc_id)
    }
}

fn disjunctive(
    cursors: &mut [PostingsCursor],
    scores: &mut FxHashMap<u32, f64>,
    cancellation: Option<&CancellationToken>,
) -> bool {
    let mut heap = BinaryHeap::new();
    for (idx, cursor) in cursors.iter_mut().enumerate() {
        if cursor.next() {
            heap.push(Reverse(HeapEntry {
                doc_id: cursor.doc_id(),
                cursor_idx: idx,
            }));
        }
    }

    while let Some(Reverse(HeapEntry { cursor_idx, .. })) = heap.pop() {
        if is_cancelled(cancellation) {
            return true;
        }

        let cursor = &mut cursors[cursor_idx];
        let doc_id = cursor.doc_id();
        *scores.entry(doc_id).or_insert(0.0) += cursor.idf() * cursor.tfs();

        if cursor.next() {
            heap.push(Reverse(HeapEntry {
                doc_id: cursor.doc_id(),
                cursor_idx,
            }));
        }
    }

    false
}

fn is_cancelled(token: Option<&CancellationToken>) -> bool {
    token.map(CancellationToken::is_cancelled).unwrap_or(false)
}

/// Select the top `k` scores (descending; ties ascending by doc_id) and
/// join each with the page table.
pub fn rank(scores: FxHashMap<u32, f64>, k: u32, page_table: &PageTable) -> Vec<Hit> {
    let mut entries: Vec<(u32, f64)> = scores.into_iter().collect();
    entries.sort_by(|a, b| {
        OrderedScore(b.1)
            .cmp(&OrderedScore(a.1))
            .then_with(|| a.0.cmp(&b.0))
    });
    entries.truncate(k as usize);

    entries
        .into_iter()
        .map(|(doc_id, score)| Hit {
            doc_id,
            doc_name: page_table.name_or_fallback(doc_id),
            score,
        })
        .collect()
}
