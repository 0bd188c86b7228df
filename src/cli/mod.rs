//! CLI commands for minestats.
//!
//! Each command is a `*Command` struct over a [`StatsService`] with
//! `*Options` in and a serializable `*Output` back, so the binary stays a
//! thin argument-parsing layer.

pub mod maintain;
pub mod record;
pub mod records;
pub mod report;

use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::stats::StatsService;
use crate::storage::{FileLedger, FileWatermark, ReadMode};

pub use maintain::{MaintainAction, MaintainCommand};
pub use record::RecordCommand;
pub use records::RecordsCommand;
pub use report::ReportCommand;

/// A service backed by the ledger and watermark files.
pub type FileStatsService = StatsService<FileLedger, FileWatermark>;

/// Open the file-backed service in the default home directory.
pub fn open_service(config: &Config) -> Result<FileStatsService> {
    let ledger = FileLedger::new()?;
    let watermark = FileWatermark::new()?;
    Ok(StatsService::new(configure_ledger(ledger, config), watermark))
}

/// Open the file-backed service rooted at `home`.
pub fn open_service_in(config: &Config, home: &Path) -> FileStatsService {
    let ledger = FileLedger::with_path(home.join("stats"));
    let watermark = FileWatermark::with_path(home.join("stats-base.json"));
    StatsService::new(configure_ledger(ledger, config), watermark)
}

fn configure_ledger(ledger: FileLedger, config: &Config) -> FileLedger {
    let read_mode = if config.storage.strict_reads {
        ReadMode::Strict
    } else {
        ReadMode::Lenient
    };
    ledger
        .with_read_mode(read_mode)
        .with_sync_writes(config.storage.sync_writes)
}
