//! Records command for minestats.
//!
//! Lists raw ledger records, visible ones by default.

use serde::{Deserialize, Serialize};

use crate::core::GameRecord;
use crate::error::Result;
use crate::stats::StatsService;
use crate::storage::{LedgerStore, WatermarkStore};

/// Options for the records command.
#[derive(Debug, Clone, Default)]
pub struct RecordsOptions {
    /// Include records hidden by the watermark.
    pub all: bool,
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the records command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsOutput {
    /// Whether the ledger was read successfully.
    pub success: bool,
    /// Lowest visible record id.
    pub watermark: u64,
    /// Records in ledger order.
    pub records: Vec<GameRecord>,
    /// Error message if reading failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordsOutput {
    /// Create a successful output.
    pub fn success(watermark: u64, records: Vec<GameRecord>) -> Self {
        Self {
            success: true,
            watermark,
            records,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            watermark: 0,
            records: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The records command implementation.
pub struct RecordsCommand<L: LedgerStore, W: WatermarkStore> {
    service: StatsService<L, W>,
}

impl<L: LedgerStore, W: WatermarkStore> RecordsCommand<L, W> {
    /// Create a new records command.
    pub fn new(service: StatsService<L, W>) -> Self {
        Self { service }
    }

    /// Run the records command.
    pub fn run(&self, options: &RecordsOptions) -> RecordsOutput {
        match self.load(options) {
            Ok((watermark, records)) => RecordsOutput::success(watermark, records),
            Err(e) => RecordsOutput::failure(e.to_string()),
        }
    }

    fn load(&self, options: &RecordsOptions) -> Result<(u64, Vec<GameRecord>)> {
        let watermark = self.service.watermark()?;
        let records = if options.all {
            self.service.records_since(0)?
        } else {
            self.service.records_since(watermark)?
        };
        Ok((watermark, records))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &RecordsOutput, options: &RecordsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Listing records failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.records.is_empty() {
            return "No records.\n".to_string();
        }

        let mut lines = vec![format!(
            "{:>6}  {:>9}  {:>5}  {:>8}  {:>6}  {:>6}",
            "id", "board", "mines", "time", "result", "opened"
        )];
        for record in &output.records {
            let marker = if record.id < output.watermark { " (cleared)" } else { "" };
            lines.push(format!(
                "{:>6}  {:>9}  {:>5}  {:>7}s  {:>6}  {:>6}{}",
                record.id,
                format!("{}x{}", record.width, record.height),
                record.mines,
                record.duration,
                if record.is_victory() { "won" } else { "lost" },
                record.open_area,
                marker
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}
