//! In-memory stores for testing.
//!
//! Thread-safe implementations of `LedgerStore` and `WatermarkStore`,
//! primarily for use in unit tests and embedding.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::GameRecord;
use crate::error::Result;
use crate::storage::{LedgerStore, WatermarkStore};

/// In-memory ledger.
///
/// Records are lost when the ledger is dropped.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: RwLock<Vec<GameRecord>>,
}

impl MemoryLedger {
    /// Create a new empty in-memory ledger.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    // A panicking writer leaves the records as they were, so poison is ignored
    fn read(&self) -> RwLockReadGuard<'_, Vec<GameRecord>> {
        self.read()
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<GameRecord>> {
        self.write()
    }

    /// Get the number of records in the ledger.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl LedgerStore for MemoryLedger {
    fn append(&self, record: &GameRecord) -> Result<()> {
        self.write().push(*record);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<GameRecord>> {
        Ok(self.read().clone())
    }

    fn delete_all(&self) -> Result<()> {
        self.write().clear();
        Ok(())
    }

    fn replace_all(&self, records: &[GameRecord]) -> Result<()> {
        *self.write() = records.to_vec();
        Ok(())
    }
}

/// In-memory watermark.
#[derive(Debug, Default)]
pub struct MemoryWatermark {
    value: RwLock<u64>,
}

impl MemoryWatermark {
    /// Create a watermark starting at 0.
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatermarkStore for MemoryWatermark {
    fn get(&self) -> Result<u64> {
        Ok(*self.value.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn set(&self, value: u64) -> Result<()> {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value;
        Ok(())
    }
}
