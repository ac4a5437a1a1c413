//! Journal Writer — Append-only commit journal with checksums
//!
//! One record per engine commit, holding every order snapshot and fill the
//! commit touched.
//!
//! # Binary Format (per frame)
//! ```text
//! [payload_len: u32 LE]
//! [checksum:    u32 LE]  // CRC32C over payload
//! [payload:     bincode(JournalRecord)]
//! ```

use crc32c::crc32c;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, warn};
use types::errors::StorageError;
use types::fill::Fill;
use types::order::Order;

/// Size of the `[payload_len][checksum]` header
pub const FRAME_HEADER_LEN: usize = 8;

/// Frames claiming a larger payload are treated as corruption
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024 * 1024;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Sequence error: expected {expected}, got {got}")]
    SequenceError { expected: u64, got: u64 },

    #[error("Corruption at byte offset {offset}: {detail}")]
    Corrupted { offset: u64, detail: String },
}

impl From<JournalError> for StorageError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::Io(e) => StorageError::Io(e.to_string()),
            JournalError::Serialization(msg) => StorageError::Serialization(msg),
            JournalError::SequenceError { .. } | JournalError::Corrupted { .. } => {
                StorageError::Corrupted(err.to_string())
            }
        }
    }
}

// ── Journal Record ──────────────────────────────────────────────────

/// Everything one engine commit persisted.
///
/// Records are all-or-nothing on replay: a frame either decodes and
/// verifies completely or the journal ends before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    /// Gapless, starting at 1
    pub sequence: u64,
    /// Latest exchange timestamp among the record's contents
    pub timestamp: i64,
    pub orders: Vec<Order>,
    pub fills: Vec<Fill>,
}

impl JournalRecord {
    pub fn new(sequence: u64, orders: Vec<Order>, fills: Vec<Fill>) -> Self {
        let timestamp = orders
            .iter()
            .map(|o| o.updated_at)
            .chain(fills.iter().map(|f| f.executed_at))
            .max()
            .unwrap_or_default();

        Self {
            sequence,
            timestamp,
            orders,
            fills,
        }
    }

    /// Encode into a checksummed frame.
    pub fn to_frame(&self) -> Result<Vec<u8>, JournalError> {
        let payload =
            bincode::serialize(self).map_err(|e| JournalError::Serialization(e.to_string()))?;
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(JournalError::Serialization(format!(
                "Record {} too large: {} bytes",
                self.sequence,
                payload.len()
            )));
        }

        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&crc32c(&payload).to_le_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Decode one frame from the start of `data`.
    ///
    /// Returns `(record, bytes_consumed)`. Never panics on corrupt input.
    pub fn from_frame(data: &[u8]) -> Result<(Self, usize), FrameError> {
        if data.len() < FRAME_HEADER_LEN {
            return Err(FrameError::Truncated {
                needed: FRAME_HEADER_LEN,
                available: data.len(),
            });
        }

        let payload_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let checksum = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

        if payload_len > MAX_PAYLOAD_LEN {
            return Err(FrameError::ImplausibleLength(payload_len));
        }

        let total = FRAME_HEADER_LEN + payload_len;
        if data.len() < total {
            return Err(FrameError::Truncated {
                needed: total,
                available: data.len(),
            });
        }

        let payload = &data[FRAME_HEADER_LEN..total];
        let actual = crc32c(payload);
        if actual != checksum {
            return Err(FrameError::ChecksumMismatch {
                stored: checksum,
                actual,
            });
        }

        let record = bincode::deserialize(payload).map_err(|e| FrameError::Decode(e.to_string()))?;
        Ok((record, total))
    }
}

/// Why a frame could not be decoded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Truncated frame: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Implausible payload length {0}")]
    ImplausibleLength(usize),

    #[error("CRC32C mismatch: stored={stored:#010x}, actual={actual:#010x}")]
    ChecksumMismatch { stored: u32, actual: u32 },

    #[error("Payload decode failed: {0}")]
    Decode(String),
}

// ── Fsync Policy ────────────────────────────────────────────────────

/// Controls when `fsync` (durable write) is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsyncPolicy {
    /// Fsync after every record.
    EveryWrite,
    /// Fsync every N records.
    EveryN(usize),
    /// Leave it to the OS.
    Never,
}

// ── Journal Writer Configuration ────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Journal file; parent directories are created on open.
    pub path: PathBuf,
    pub fsync_policy: FsyncPolicy,
}

impl JournalConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fsync_policy: FsyncPolicy::EveryWrite,
        }
    }

    pub fn with_fsync_policy(mut self, fsync_policy: FsyncPolicy) -> Self {
        self.fsync_policy = fsync_policy;
        self
    }
}

// ── Journal File ────────────────────────────────────────────────────

/// File operations the writer relies on beyond `Write`
pub trait JournalFile: Write + Send {
    fn sync_data(&self) -> io::Result<()>;
    fn sync_all(&self) -> io::Result<()>;
    fn set_len(&self, len: u64) -> io::Result<()>;
}

impl JournalFile for File {
    fn sync_data(&self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn sync_all(&self) -> io::Result<()> {
        File::sync_all(self)
    }

    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

// ── Journal Writer ──────────────────────────────────────────────────

/// Append-only journal writer.
///
/// An append that fails anywhere, including the fsync, truncates the file
/// back to its last complete frame and leaves the sequence where it was.
/// If that truncation fails too, the writer refuses further appends.
pub struct JournalWriter<F: JournalFile = File> {
    config: JournalConfig,
    file: F,
    /// Length of the valid prefix
    len: u64,
    next_sequence: u64,
    writes_since_fsync: usize,
    /// A failed append could not be undone
    broken: bool,
}

impl JournalWriter<File> {
    /// Open for appending, creating the file if needed.
    pub fn open(config: JournalConfig) -> Result<Self, JournalError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;
        let len = file.metadata()?.len();

        Ok(Self::with_file(config, file, len))
    }
}

impl<F: JournalFile> JournalWriter<F> {
    /// Wrap an already open append-mode file of `len` bytes.
    pub fn with_file(config: JournalConfig, file: F, len: u64) -> Self {
        Self {
            config,
            file,
            len,
            next_sequence: 1,
            writes_since_fsync: 0,
            broken: false,
        }
    }

    /// Set the next expected sequence number (used after replay).
    pub fn set_next_sequence(&mut self, seq: u64) {
        self.next_sequence = seq;
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Bytes of complete frames written so far
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a record. Its sequence must be the next expected one.
    ///
    /// On error nothing of the record is left in the file.
    pub fn append(&mut self, record: &JournalRecord) -> Result<(), JournalError> {
        if self.broken {
            return Err(JournalError::Io(io::Error::new(
                io::ErrorKind::Other,
                "journal tail is unknown after a failed append",
            )));
        }
        if record.sequence != self.next_sequence {
            return Err(JournalError::SequenceError {
                expected: self.next_sequence,
                got: record.sequence,
            });
        }

        let frame = record.to_frame()?;
        if let Err(err) = self.write_durably(&frame) {
            self.discard_tail(record.sequence, &err);
            return Err(err);
        }

        self.len += frame.len() as u64;
        self.next_sequence = record.sequence + 1;
        Ok(())
    }

    /// Build the next record from a commit batch and append it.
    pub fn write_commit(&mut self, orders: &[Order], fills: &[Fill]) -> Result<JournalRecord, JournalError> {
        let record = JournalRecord::new(self.next_sequence, orders.to_vec(), fills.to_vec());
        self.append(&record)?;
        Ok(record)
    }

    /// Force flush + fsync.
    pub fn sync(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        self.writes_since_fsync = 0;
        Ok(())
    }

    /// Write one frame and fsync it as the policy asks.
    fn write_durably(&mut self, frame: &[u8]) -> Result<(), JournalError> {
        self.file.write_all(frame)?;
        self.file.flush()?;

        let should_fsync = match self.config.fsync_policy {
            FsyncPolicy::EveryWrite => true,
            FsyncPolicy::EveryN(n) => self.writes_since_fsync + 1 >= n,
            FsyncPolicy::Never => false,
        };
        if should_fsync {
            self.file.sync_data()?;
            self.writes_since_fsync = 0;
        } else {
            self.writes_since_fsync += 1;
        }
        Ok(())
    }

    /// Cut the file back to the last complete frame.
    fn discard_tail(&mut self, sequence: u64, cause: &JournalError) {
        warn!(
            path = %self.config.path.display(),
            sequence,
            error = %cause,
            "Journal append failed, truncating to last complete frame"
        );
        let truncated = self.file.set_len(self.len).and_then(|()| self.file.sync_data());
        if let Err(err) = truncated {
            self.broken = true;
            error!(
                path = %self.config.path.display(),
                valid_len = self.len,
                error = %err,
                "Could not truncate journal after failed append"
            );
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
