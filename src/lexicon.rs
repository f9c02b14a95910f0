//! Lexicon: term -> posting-list location, precomputed IDF, skip metadata.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use rustc_hash::FxHashMap;

use crate::error::StartupError;

/// A single lexicon record.
#[derive(Debug, Clone)]
pub struct LexiconEntry {
    /// Byte offset in the index file where this term's posting block begins.
    pub offset: u64,
    /// Compressed byte length of the doc-id gap run.
    pub length: u32,
    /// Document frequency.
    pub doc_frequency: u32,
    /// Precomputed `ln((N - df + 0.5) / (df + 0.5))`, using N at lexicon load time.
    pub idf: f64,
    /// Per-block largest doc-id, `len() == block_count`.
    pub block_max_doc_ids: Vec<u32>,
    /// Per-block file offset, `len() == block_count`.
    pub block_offsets: Vec<u64>,
}

impl LexiconEntry {
    pub(crate) fn block_count(&self) -> u32 {
        self.block_max_doc_ids.len() as u32
    }
}

/// Immutable, in-memory term -> [`LexiconEntry`] map.
#[derive(Debug, Default)]
pub struct Lexicon {
    entries: FxHashMap<String, LexiconEntry>,
}

impl Lexicon {
    /// Stream a lexicon file to EOF, precomputing IDF against `corpus_size`.
    pub fn load(path: impl AsRef<Path>, corpus_size: u32) -> Result<Self, StartupError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.display().to_string();
        let file = File::open(path_ref).map_err(|source| StartupError::Io {
            path: path_str.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let mut entries = FxHashMap::default();
        let mut offset: u64 = 0;

        loop {
            let term_length = match read_u16_or_eof(&mut reader, &path_str)? {
                Some(v) => v,
                None => break,
            };
            offset += 2;

            let mut term_buf = vec![0u8; term_length as usize];
            reader
                .read_exact(&mut term_buf)
                .map_err(|source| StartupError::Io {
                    path: path_str.clone(),
                    source,
                })?;
            let term = String::from_utf8(term_buf).map_err(|_| StartupError::InvalidUtf8 {
                file: path_str.clone(),
                field: "term",
            })?;
            offset += u64::from(term_length);

            let entry_offset = reader
                .read_u64::<LittleEndian>()
                .map_err(|source| io_to_malformed(&path_str, offset, "offset", source))?;
            let length = reader
                .read_u32::<LittleEndian>()
                .map_err(|source| io_to_malformed(&path_str, offset, "length", source))?;
            let doc_frequency = reader
                .read_u32::<LittleEndian>()
                .map_err(|source| io_to_malformed(&path_str, offset, "doc_frequency", source))?;
            let block_count = reader
                .read_u32::<LittleEndian>()
                .map_err(|source| io_to_malformed(&path_str, offset, "block_count", source))?;
            offset += 8 + 4 + 4 + 4;

            let mut block_max_doc_ids = Vec::with_capacity(block_count as usize);
            for _ in 0..block_count {
                block_max_doc_ids.push(reader.read_u32::<LittleEndian>().map_err(|source| {
                    io_to_malformed(&path_str, offset, "block_max_doc_ids", source)
                })?);
                offset += 4;
            }
            let mut block_offsets = Vec::with_capacity(block_count as usize);
            for _ in 0..block_count {
                block_offsets.push(reader.read_u64::<LittleEndian>().map_err(|source| {
                    io_to_malformed(&path_str, offset, "block_offsets", source)
                })?);
                offset += 8;
            }

            let idf = compute_idf(corpus_size, doc_frequency);

            entries.insert(
                term,
                LexiconEntry {
                    offset: entry_offset,
                    length,
                    doc_frequency,
                    idf,
                    block_max_doc_ids,
                    block_offsets,
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries.contains_key(term)
    }

    pub fn get(&self, term: &str) -> Option<&LexiconEntry> {
        self.entries.get(term)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `idf = ln((N - df + 0.5) / (df + 0.5))`, unclamped (see DESIGN.md).
fn compute_idf(corpus_size: u32, doc_frequency: u32) -> f64 {
    let n = f64::from(corpus_size);
    let df = f64::from(doc_frequency);
    ((n - df + 0.5) / (df + 0.5)).ln()
}

fn read_u16_or_eof(reader: &mut impl Read, path: &str) -> Result<Option<u16>, StartupError> {
    let mut buf = [0u8; 2];
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) if read == 0 => return Ok(None),
            Ok(0) => {
                return Err(StartupError::MalformedRecord {
                    file: path.to_string(),
                    offset: 0,
                    reason: "truncated term_length field".to_string(),
                })
            }
            Ok(n) => read += n,
            Err(source) => {
                return Err(StartupError::Io {
                    path: path.to_string(),
                    source,
                })
            }
        }
    }
    Ok(Some(u16::from_le_bytes(buf)))
}

fn io_to_malformed(file: &str, offset: u64, field: &str, source: std::io::Error) -> StartupError {
    StartupError::MalformedRecord {
        file: file.to_string(),
        offset,
        reason: format!("failed to read {field}: {source}"),
    }
}
