//! Storage traits for minestats.
//!
//! `LedgerStore` is the append-only record sequence; `WatermarkStore`
//! persists the base id below which records are logically deleted.

use std::sync::Arc;

use crate::core::GameRecord;
use crate::error::Result;

/// Trait for append-only record ledgers.
///
/// Implementations never rewrite or reorder records on `append`. Reads
/// return records in append order.
pub trait LedgerStore: Send + Sync {
    /// Append one record at the end of the ledger.
    fn append(&self, record: &GameRecord) -> Result<()>;

    /// Read every decodable record, in append order.
    ///
    /// Returns an empty list when the ledger does not exist.
    fn read_all(&self) -> Result<Vec<GameRecord>>;

    /// Remove the whole ledger.
    ///
    /// Returns `Ok(())` even if there is nothing to remove.
    fn delete_all(&self) -> Result<()>;

    /// Replace the ledger contents in one step.
    ///
    /// Used by compaction; `records` must already be in ledger order.
    fn replace_all(&self, records: &[GameRecord]) -> Result<()>;

    /// Read records whose id is at least `min_id`.
    fn read_since(&self, min_id: u64) -> Result<Vec<GameRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.id >= min_id)
            .collect())
    }
}

/// Trait for persisting the logical-deletion watermark.
pub trait WatermarkStore: Send + Sync {
    /// Current watermark; 0 when never set.
    fn get(&self) -> Result<u64>;

    /// Persist a new watermark.
    fn set(&self, value: u64) -> Result<()>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    fn append(&self, record: &GameRecord) -> Result<()> {
        (**self).append(record)
    }

    fn read_all(&self) -> Result<Vec<GameRecord>> {
        (**self).read_all()
    }

    fn delete_all(&self) -> Result<()> {
        (**self).delete_all()
    }

    fn replace_all(&self, records: &[GameRecord]) -> Result<()> {
        (**self).replace_all(records)
    }
}

impl<T: WatermarkStore + ?Sized> WatermarkStore for Arc<T> {
    fn get(&self) -> Result<u64> {
        (**self).get()
    }

    fn set(&self, value: u64) -> Result<()> {
        (**self).set(value)
    }
}
