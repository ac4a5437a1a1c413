//! Journal Reader — Sequential reader with corruption detection
//!
//! Features:
//! - CRC32C checksum validation on every frame
//! - Torn-tail detection with byte-offset reporting
//! - Partial recovery: stop at the first bad frame, keep the valid prefix
//! - Gapless / monotonic sequence validation

use crate::journal::{FrameError, JournalError, JournalRecord};
use std::fs;
use std::io;
use std::path::Path;

// ── Corruption Log Entry ────────────────────────────────────────────

/// Where and why replay stopped early.
#[derive(Debug, Clone, PartialEq)]
pub struct CorruptionRecord {
    /// Byte offset of the first frame that failed to decode
    pub byte_offset: u64,
    pub error: FrameError,
    /// Bytes from `byte_offset` to the end of the file
    pub discarded_bytes: u64,
}

// ── Journal Reader ──────────────────────────────────────────────────

/// Sequential journal reader over one journal file.
pub struct JournalReader {
    data: Vec<u8>,
    /// Current read position within `data`
    pos: usize,
    last_sequence: Option<u64>,
    corruption: Option<CorruptionRecord>,
}

impl JournalReader {
    /// Read a journal file. A missing file reads as an empty journal.
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            last_sequence: None,
            corruption: None,
        }
    }

    /// Read the next valid record.
    ///
    /// Returns `None` at the end of the journal or at the first frame that
    /// fails to decode; `corruption()` tells the two apart. A sequence gap
    /// between intact frames is an error.
    pub fn next_record(&mut self) -> Result<Option<JournalRecord>, JournalError> {
        if self.pos >= self.data.len() || self.corruption.is_some() {
            return Ok(None);
        }

        match JournalRecord::from_frame(&self.data[self.pos..]) {
            Ok((record, consumed)) => {
                let expected = self.last_sequence.map_or(1, |seq| seq + 1);
                if record.sequence != expected {
                    return Err(JournalError::SequenceError {
                        expected,
                        got: record.sequence,
                    });
                }

                self.pos += consumed;
                self.last_sequence = Some(record.sequence);
                Ok(Some(record))
            }
            Err(error) => {
                self.corruption = Some(CorruptionRecord {
                    byte_offset: self.pos as u64,
                    error,
                    discarded_bytes: (self.data.len() - self.pos) as u64,
                });
                Ok(None)
            }
        }
    }

    /// Read all valid records.
    pub fn read_all(&mut self) -> Result<Vec<JournalRecord>, JournalError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }

    /// Length in bytes of the valid prefix read so far
    pub fn valid_len(&self) -> u64 {
        self.pos as u64
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    pub fn corruption(&self) -> Option<&CorruptionRecord> {
        self.corruption.as_ref()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
