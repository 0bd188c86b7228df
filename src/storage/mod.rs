//! Ledger and watermark storage for minestats.
//!
//! This module provides the append-only record ledger, the record codec it
//! frames records with, and the persisted watermark, with file-based and
//! in-memory backends.

pub mod codec;
pub mod file;
pub mod memory;
pub mod traits;
pub mod watermark;

pub use codec::{Decoded, JsonLinesCodec, RecordCodec};
pub use file::{FileLedger, LedgerScan, ReadMode, ScanTail};
pub use memory::{MemoryLedger, MemoryWatermark};
pub use traits::{LedgerStore, WatermarkStore};
pub use watermark::FileWatermark;
