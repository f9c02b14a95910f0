//! Corpus metadata: the page table (doc-id -> external name) and the
//! doc-length table (doc-id -> length in tokens), plus derived corpus stats.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use rustc_hash::FxHashMap;

use crate::error::StartupError;

/// doc-id -> external document name.
#[derive(Debug, Default)]
pub struct PageTable {
    names: FxHashMap<u32, String>,
}

impl PageTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StartupError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.display().to_string();
        let file = File::open(path_ref).map_err(|source| StartupError::Io {
            path: path_str.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let mut names = FxHashMap::default();

        loop {
            let doc_id = match read_u32_or_eof(&mut reader, &path_str)? {
                Some(v) => v,
                None => break,
            };
            let name_length = reader
                .read_u16::<LittleEndian>()
                .map_err(|source| StartupError::MalformedRecord {
                    file: path_str.clone(),
                    offset: 0,
                    reason: format!("failed to read name_length: {source}"),
                })?;
            let mut name_buf = vec![0u8; name_length as usize];
            reader
                .read_exact(&mut name_buf)
                .map_err(|source| StartupError::Io {
                    path: path_str.clone(),
                    source,
                })?;
            let name = String::from_utf8(name_buf).map_err(|_| StartupError::InvalidUtf8 {
                file: path_str.clone(),
                field: "name",
            })?;
            names.insert(doc_id, name);
        }

        Ok(Self { names })
    }

    /// Look up a document's external name, falling back to its numeric
    /// doc-id stringified when the page table doesn't have an entry.
    pub fn name_or_fallback(&self, doc_id: u32) -> String {
        self.names
            .get(&doc_id)
            .cloned()
            .unwrap_or_else(|| doc_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// doc-id -> length in tokens, plus derived `N` and `avgdl`.
#[derive(Debug, Default)]
pub struct DocLengths {
    lengths: FxHashMap<u32, u32>,
}

impl DocLengths {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StartupError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.display().to_string();
        let file = File::open(path_ref).map_err(|source| StartupError::Io {
            path: path_str.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let mut lengths = FxHashMap::default();

        loop {
            let doc_id = match read_u32_or_eof(&mut reader, &path_str)? {
                Some(v) => v,
                None => break,
            };
            let length = reader
                .read_u32::<LittleEndian>()
                .map_err(|source| StartupError::MalformedRecord {
                    file: path_str.clone(),
                    offset: 0,
                    reason: format!("failed to read length: {source}"),
                })?;
            lengths.insert(doc_id, length);
        }

        Ok(Self { lengths })
    }

    pub fn get(&self, doc_id: u32) -> Option<u32> {
        self.lengths.get(&doc_id).copied()
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// `N` (corpus size) and `avgdl` (mean document length). `N == 0` gives
    /// `avgdl == 0.0` rather than dividing by zero.
    pub fn stats(&self) -> CorpusStats {
        let n = self.lengths.len() as u32;
        if n == 0 {
            return CorpusStats { n: 0, avgdl: 0.0 };
        }
        let total: u64 = self.lengths.values().map(|&l| u64::from(l)).sum();
        CorpusStats {
            n,
            avgdl: total as f64 / f64::from(n),
        }
    }
}

/// Derived corpus-wide statistics, computed once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorpusStats {
    pub n: u32,
    pub avgdl: f64,
}

fn read_u32_or_eof(reader: &mut impl Read, path: &str) -> Result<Option<u32>, StartupError> {
    let mut buf = [0u8; 4];
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) if read == 0 => return Ok(None),
            Ok(0) => {
                return Err(StartupError::MalformedRecord {
                    file: path.to_string(),
                    offset: 0,
                    reason: "truncated doc_id field".to_string(),
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
    Ok(Some(u32::from_le_bytes(buf)))
}
