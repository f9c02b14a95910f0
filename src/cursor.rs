//! Postings cursor: per-term iterator over (doc-id, tfs) pairs.

use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;

use crate::lexicon::LexiconEntry;
use crate::varbyte;

/// Transient, per-query iterator over one term's posting list.
///
/// Holds an `Arc` clone of the index file's memory mapping so it can read
/// its gap run and tfs run as zero-copy subslices; the cursor never
/// outlives the mapping because the `Arc` keeps it alive regardless of
/// what happens to the `Processor` that opened it.
pub struct PostingsCursor {
    mmap: Arc<Mmap>,
    gap_start: usize,
    gap_len: usize,
    tfs_start: usize,
    df: u32,
    idf: f64,
    block_max_doc_ids: Vec<u32>,
    block_offsets: Vec<u64>,
    buffer_pos: usize,
    idx: i64,
    last_doc_id: u32,
    current_doc_id: u32,
    valid: bool,
}

impl PostingsCursor {
    /// Open a cursor for `entry` against the shared index mapping.
    ///
    /// Reads no bytes eagerly beyond what the mapping already holds in
    /// memory; construction just records offsets. Returns `None` if the
    /// entry's byte range falls outside the mapped file (a malformed
    /// index), in which case the caller should treat the term as if it had
    /// no postings rather than panicking.
    pub fn open(mmap: Arc<Mmap>, entry: &LexiconEntry) -> Option<Self> {
        let gap_start = usize::try_from(entry.offset).ok()?;
        let gap_len = entry.length as usize;
        let tfs_len = (entry.doc_frequency as usize).checked_mul(4)?;
        let tfs_start = gap_start.checked_add(gap_len)?;
        if tfs_start.checked_add(tfs_len)? > mmap.len() {
            return None;
        }

        Some(Self {
            mmap,
            gap_start,
            gap_len,
            tfs_start,
            df: entry.doc_frequency,
            idf: entry.idf,
            block_max_doc_ids: entry.block_max_doc_ids.clone(),
            block_offsets: entry.block_offsets.clone(),
            buffer_pos: 0,
            idx: -1,
            last_doc_id: 0,
            current_doc_id: 0,
            valid: true,
        })
    }

    /// Advance to the next posting. Returns `false` once the list is exhausted.
    pub fn next(&mut self) -> bool {
        if !self.valid {
            return false;
        }
        if self.buffer_pos >= self.gap_len || self.idx + 1 >= i64::from(self.df) {
            self.valid = false;
            return false;
        }

        let gap_bytes = &self.mmap[self.gap_start..self.gap_start + self.gap_len];
        let Some((gap, new_pos)) = varbyte::decode(gap_bytes, self.buffer_pos) else {
            self.valid = false;
            return false;
        };

        self.buffer_pos = new_pos;
        self.last_doc_id += gap;
        self.idx += 1;
        self.current_doc_id = self.last_doc_id;
        true
    }

    /// Advance until `doc_id() >= target` or the cursor is invalidated.
    ///
    /// Implemented as a linear scan. `block_max_doc_ids`/`block_offsets`
    /// are retained on the cursor and available for an optimized jump, but
    /// the on-disk schema doesn't record per-block posting counts, so a
    /// byte-offset jump can't recover the `idx` needed to stay aligned
    /// with the tfs array. Skipping that way would violate the
    /// requirement that the observed doc-id sequence match repeated
    /// `next()` exactly, so this scans instead — correct always, and
    /// `next_geq` is idempotent when already at or past `target`.
    pub fn next_geq(&mut self, target: u32) -> bool {
        while self.valid && self.current_doc_id < target {
            if !self.next() {
                return false;
            }
        }
        self.valid && self.current_doc_id >= target
    }

    /// Current doc-id. Meaningless before the first successful `next`.
    pub fn doc_id(&self) -> u32 {
        self.current_doc_id
    }

    /// Precomputed TF-normalization factor for the current posting.
    pub fn tfs(&self) -> f64 {
        debug_assert!(self.idx >= 0, "tfs() called before first next()");
        let i = self.idx as usize;
        let pos = self.tfs_start + i * 4;
        f64::from(LittleEndian::read_f32(&self.mmap[pos..pos + 4]))
    }

    /// This term's precomputed IDF.
    pub fn idf(&self) -> f64 {
        self.idf
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Document frequency of this term (number of postings in the list).
    pub fn doc_frequency(&self) -> u32 {
        self.df
    }

    /// Number of skip blocks recorded for this term (may be 0).
    pub fn block_count(&self) -> usize {
        self.block_max_doc_ids.len()
    }

    /// Mark the cursor invalid and release its hold on further reads.
    pub fn close(&mut self) {
        self.valid = false;
    }
}
