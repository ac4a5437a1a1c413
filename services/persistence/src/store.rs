//! Journal-backed storage
//!
//! Every `commit` becomes one journal record. Opening the store replays the
//! journal into an in-memory `OrderTable` that serves all reads.

use std::sync::{Mutex, RwLock};
use tracing::{info, warn};
use types::errors::StorageError;
use types::fill::Fill;
use types::ids::OrderId;
use types::order::Order;
use types::storage::StorageAdapter;

use crate::journal::{JournalConfig, JournalError, JournalWriter};
use crate::memory::OrderTable;
use crate::reader::JournalReader;

/// Durable `StorageAdapter` over an append-only journal file
pub struct JournalStorage {
    writer: Mutex<JournalWriter>,
    table: RwLock<OrderTable>,
}

/// What `JournalStorage::open` found on disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    pub records: usize,
    pub orders: usize,
    pub fills: usize,
    /// Bytes cut from a torn or corrupt tail
    pub truncated_bytes: u64,
}

impl JournalStorage {
    /// Replay the journal at `config.path` and open it for appending.
    ///
    /// A torn or corrupt tail is truncated away before the writer opens.
    pub fn open(config: JournalConfig) -> Result<Self, JournalError> {
        Self::open_with_summary(config).map(|(storage, _)| storage)
    }

    pub fn open_with_summary(config: JournalConfig) -> Result<(Self, ReplaySummary), JournalError> {
        let mut reader = JournalReader::open(&config.path)?;
        let records = reader.read_all()?;

        let mut summary = ReplaySummary {
            records: records.len(),
            ..ReplaySummary::default()
        };

        if let Some(corruption) = reader.corruption() {
            warn!(
                path = %config.path.display(),
                offset = corruption.byte_offset,
                discarded_bytes = corruption.discarded_bytes,
                error = %corruption.error,
                "Journal tail is damaged, truncating"
            );
            summary.truncated_bytes = corruption.discarded_bytes;
            let file = std::fs::OpenOptions::new().write(true).open(&config.path)?;
            file.set_len(reader.valid_len())?;
            file.sync_all()?;
        }

        let mut table = OrderTable::new();
        for record in &records {
            table.apply(&record.orders, &record.fills);
        }
        summary.orders = table.order_count();
        summary.fills = table.fill_count();

        let mut writer = JournalWriter::open(config)?;
        writer.set_next_sequence(reader.last_sequence().map_or(1, |seq| seq + 1));

        info!(
            path = %writer.path().display(),
            records = summary.records,
            orders = summary.orders,
            fills = summary.fills,
            "Journal replayed"
        );

        Ok((
            Self {
                writer: Mutex::new(writer),
                table: RwLock::new(table),
            },
            summary,
        ))
    }

    fn with_table<T>(&self, f: impl FnOnce(&OrderTable) -> T) -> Result<T, StorageError> {
        let table = self
            .table
            .read()
            .map_err(|_| StorageError::Unavailable("journal table lock poisoned".into()))?;
        Ok(f(&table))
    }
}

impl StorageAdapter for JournalStorage {
    fn save_order(&self, order: &Order) -> Result<(), StorageError> {
        self.commit(std::slice::from_ref(order), &[])
    }

    fn save_fill(&self, fill: &Fill) -> Result<(), StorageError> {
        self.commit(&[], std::slice::from_ref(fill))
    }

    /// Append one record, then make it visible to reads
    fn commit(&self, orders: &[Order], fills: &[Fill]) -> Result<(), StorageError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Unavailable("journal writer lock poisoned".into()))?;

        writer.write_commit(orders, fills)?;

        self.table
            .write()
            .map_err(|_| StorageError::Unavailable("journal table lock poisoned".into()))?
            .apply(orders, fills);
        Ok(())
    }

    fn get_order(&self, order_id: &OrderId) -> Result<Option<Order>, StorageError> {
        self.with_table(|table| table.get(order_id).cloned())
    }

    fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        self.with_table(|table| table.orders().to_vec())
    }

    fn list_fills(&self) -> Result<Vec<Fill>, StorageError> {
        self.with_table(|table| table.fills().to_vec())
    }
}
