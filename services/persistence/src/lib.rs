//! Persistence Service
//!
//! Storage adapters for the matching engine: a volatile in-memory store and
//! a durable append-only journal with checksummed frames, torn-tail
//! truncation and replay.

pub mod journal;
pub mod reader;
pub mod memory;
pub mod store;

pub use journal::{FsyncPolicy, JournalConfig, JournalError, JournalFile, JournalRecord, JournalWriter};
pub use memory::{MemoryStorage, OrderTable};
pub use reader::{CorruptionRecord, JournalReader};
pub use store::{JournalStorage, ReplaySummary};
