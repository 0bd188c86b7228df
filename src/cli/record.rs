//! Record command for minestats.
//!
//! Appends one finished game to the ledger.

use serde::{Deserialize, Serialize};

use crate::core::{GameRecord, StandardSize};
use crate::stats::{categories_of, Category, StatsService};
use crate::storage::{LedgerStore, WatermarkStore};

/// Options for the record command.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    /// Board width in cells.
    pub width: u32,
    /// Board height in cells.
    pub height: u32,
    /// Number of mines.
    pub mines: u32,
    /// Game duration in seconds.
    pub duration: u64,
    /// Whether the game was won.
    pub won: bool,
    /// Cells revealed by the end of the game.
    pub open_area: u32,
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the record command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutput {
    /// Whether the record was stored.
    pub success: bool,
    /// The stored record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<GameRecord>,
    /// Categories the record counts towards.
    pub categories: Vec<Category>,
    /// Error message if recording failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordOutput {
    /// Create a successful output.
    pub fn success(record: GameRecord, categories: Vec<Category>) -> Self {
        Self {
            success: true,
            record: Some(record),
            categories,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            record: None,
            categories: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The record command implementation.
pub struct RecordCommand<L: LedgerStore, W: WatermarkStore> {
    service: StatsService<L, W>,
    standard: StandardSize,
}

impl<L: LedgerStore, W: WatermarkStore> RecordCommand<L, W> {
    /// Create a new record command.
    pub fn new(service: StatsService<L, W>, standard: StandardSize) -> Self {
        Self { service, standard }
    }

    /// Get the underlying service.
    pub fn service(&self) -> &StatsService<L, W> {
        &self.service
    }

    /// Run the record command.
    pub fn run(&self, options: &RecordOptions) -> RecordOutput {
        match self.service.record_game(
            options.width,
            options.height,
            options.mines,
            options.duration,
            options.won,
            options.open_area,
        ) {
            Ok(record) => {
                let categories = categories_of(&self.standard, &record);
                RecordOutput::success(record, categories)
            }
            Err(e) => RecordOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &RecordOutput, options: &RecordOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        match (&output.record, &output.error) {
            (Some(record), _) => {
                let categories: Vec<&str> = output.categories.iter().map(|c| c.title()).collect();
                format!(
                    "Recorded game #{} ({}x{}, {} mines, {}, {}s)\nCounts towards: {}\n",
                    record.id,
                    record.width,
                    record.height,
                    record.mines,
                    if record.is_victory() { "won" } else { "lost" },
                    record.duration,
                    categories.join(", ")
                )
            }
            (None, error) => format!(
                "Record failed: {}\n",
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryLedger, MemoryWatermark};

    fn command() -> RecordCommand<MemoryLedger, MemoryWatermark> {
        RecordCommand::new(
            StatsService::new(MemoryLedger::new(), MemoryWatermark::new()),
            StandardSize::default(),
        )
    }

    fn options(width: u32, height: u32, mines: u32) -> RecordOptions {
        RecordOptions {
            width,
            height,
            mines,
            duration: 42,
            won: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_record_assigns_sequential_ids() {
        let cmd = command();

        let first = cmd.run(&options(9, 9, 10));
        let second = cmd.run(&options(16, 16, 40));

        assert!(first.success && second.success);
        assert_eq!(first.record.unwrap().id, 0);
        assert_eq!(second.record.unwrap().id, 1);
        assert_eq!(cmd.service().ledger().len(), 2);
    }

    #[test]
    fn test_record_reports_categories() {
        let cmd = command();
        let output = cmd.run(&options(16, 9, 20));

        assert_eq!(
            output.categories,
            vec![Category::General, Category::Progressive, Category::FixedSize]
        );

        let text = cmd.format_output(&output, &options(16, 9, 20));
        assert!(text.starts_with("Recorded game #0 (16x9, 20 mines, won, 42s)"));
        assert!(text.contains("Counts towards: General, Progressive, Fixed Size"));
    }

    #[test]
    fn test_record_rejects_invalid_board() {
        let cmd = command();
        let output = cmd.run(&options(0, 9, 10));

        assert!(!output.success);
        assert!(output.record.is_none());
        assert!(cmd.service().ledger().is_empty());

        let text = cmd.format_output(&output, &options(0, 9, 10));
        assert!(text.starts_with("Record failed:"));
    }

    #[test]
    fn test_record_json() {
        let cmd = command();
        let mut opts = options(24, 24, 99);
        opts.json = true;
        let output = cmd.run(&opts);

        let parsed: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &opts)).unwrap();
        assert_eq!(parsed["record"]["victory"], 1);
        assert_eq!(parsed["categories"][1], "expert");
    }
}
