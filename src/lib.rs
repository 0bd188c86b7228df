//! minestats - minesweeper game statistics
//!
//! minestats keeps an append-only ledger of finished games, classifies
//! them into difficulty categories relative to a configured standard board
//! and folds each category into summary statistics. Clearing statistics
//! moves a watermark instead of rewriting history.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod stats;
pub mod storage;

pub use config::Config;
pub use core::{Difficulty, GameRecord, StandardSize, RECORD_SCHEMA_VERSION};
pub use error::{Result, StatsError};
pub use stats::{
    build_report, categories_of, classify, fold, Category, StatsService, StatsSummary, Tally,
};
pub use storage::{
    FileLedger, FileWatermark, JsonLinesCodec, LedgerStore, MemoryLedger, MemoryWatermark,
    ReadMode, RecordCodec, WatermarkStore,
};

// CLI commands
pub use cli::{MaintainCommand, RecordCommand, RecordsCommand, ReportCommand};
