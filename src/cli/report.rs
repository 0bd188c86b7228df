//! Report command for minestats.
//!
//! Displays one statistics block per non-empty category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::StandardSize;
use crate::stats::{StatsService, StatsSummary};
use crate::storage::{LedgerStore, WatermarkStore};

/// Options for the report command.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the report command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    /// Whether the report was built successfully.
    pub success: bool,
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
    /// Standard size the report was classified against.
    pub standard: StandardSize,
    /// Lowest visible record id.
    pub watermark: u64,
    /// Per-category summaries in display order.
    pub categories: Vec<StatsSummary>,
    /// Error message if the report failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportOutput {
    /// Create a successful output.
    pub fn success(standard: StandardSize, watermark: u64, categories: Vec<StatsSummary>) -> Self {
        Self {
            success: true,
            generated_at: Utc::now(),
            standard,
            watermark,
            categories,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(standard: StandardSize, error: impl Into<String>) -> Self {
        Self {
            success: false,
            generated_at: Utc::now(),
            standard,
            watermark: 0,
            categories: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The report command implementation.
pub struct ReportCommand<L: LedgerStore, W: WatermarkStore> {
    service: StatsService<L, W>,
    standard: StandardSize,
}

impl<L: LedgerStore, W: WatermarkStore> ReportCommand<L, W> {
    /// Create a new report command.
    pub fn new(service: StatsService<L, W>, standard: StandardSize) -> Self {
        Self { service, standard }
    }

    /// Run the report command.
    pub fn run(&self, _options: &ReportOptions) -> ReportOutput {
        let watermark = match self.service.watermark() {
            Ok(w) => w,
            Err(e) => return ReportOutput::failure(self.standard, e.to_string()),
        };

        match self.service.report(&self.standard) {
            Ok(categories) => ReportOutput::success(self.standard, watermark, categories),
            Err(e) => ReportOutput::failure(self.standard, e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ReportOutput, options: &ReportOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &ReportOutput) -> String {
        if !output.success {
            return format!(
                "Report failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.categories.is_empty() {
            return "No games recorded.\n".to_string();
        }

        let mut lines = Vec::new();
        lines.push(format!(
            "=== Minesweeper Statistics (standard {}) ===\n",
            output.standard
        ));

        for summary in &output.categories {
            lines.push(format!("{}", summary.category));
            lines.push(format!(
                "   Games: {} | Won: {} | Win rate: {:.1}%",
                summary.total_games,
                summary.victory_count,
                win_rate(summary) * 100.0
            ));
            lines.push(format!(
                "   Total time: {}s | Average win: {}s | Best win: {}s",
                summary.total_time, summary.average_victory_time, summary.shortest_victory_time
            ));
            lines.push(format!(
                "   Mines: {} | Cells opened: {}\n",
                summary.total_mines, summary.total_open_area
            ));
        }

        lines.join("\n")
    }
}

fn win_rate(summary: &StatsSummary) -> f64 {
    if summary.total_games == 0 {
        0.0
    } else {
        summary.victory_count as f64 / summary.total_games as f64
    }
}
