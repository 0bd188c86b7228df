//! Maintain commands for minestats.
//!
//! Clearing statistics, compacting the ledger and purging it.

use serde::{Deserialize, Serialize};

use crate::stats::StatsService;
use crate::storage::{LedgerStore, WatermarkStore};

/// Options for the maintain commands.
#[derive(Debug, Clone, Default)]
pub struct MaintainOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Confirm destructive actions.
    pub yes: bool,
}

/// Actions available in maintain.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaintainAction {
    /// Hide every current record from reports.
    Clear,
    /// Drop hidden records from the ledger file.
    Compact,
    /// Delete the whole ledger.
    Purge,
}

impl MaintainAction {
    fn as_str(&self) -> &'static str {
        match self {
            MaintainAction::Clear => "clear",
            MaintainAction::Compact => "compact",
            MaintainAction::Purge => "purge",
        }
    }
}

/// Output format for the maintain commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintainOutput {
    /// Whether the action succeeded.
    pub success: bool,
    /// The action performed.
    pub action: MaintainAction,
    /// Watermark after the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<u64>,
    /// Records removed by compaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
    /// Error message if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MaintainOutput {
    fn done(action: MaintainAction, watermark: Option<u64>, removed: Option<usize>) -> Self {
        Self {
            success: true,
            action,
            watermark,
            removed,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(action: MaintainAction, error: impl Into<String>) -> Self {
        Self {
            success: false,
            action,
            watermark: None,
            removed: None,
            error: Some(error.into()),
        }
    }
}

/// The maintain command implementation.
pub struct MaintainCommand<L: LedgerStore, W: WatermarkStore> {
    service: StatsService<L, W>,
}

impl<L: LedgerStore, W: WatermarkStore> MaintainCommand<L, W> {
    /// Create a new maintain command.
    pub fn new(service: StatsService<L, W>) -> Self {
        Self { service }
    }

    /// Get the underlying service.
    pub fn service(&self) -> &StatsService<L, W> {
        &self.service
    }

    /// Run a maintain action.
    pub fn run(&self, action: MaintainAction, options: &MaintainOptions) -> MaintainOutput {
        let result = match action {
            MaintainAction::Clear => self
                .service
                .clear_report()
                .map(|w| MaintainOutput::done(action, Some(w), None)),
            MaintainAction::Compact => self.service.compact().and_then(|removed| {
                Ok(MaintainOutput::done(
                    action,
                    Some(self.service.watermark()?),
                    Some(removed),
                ))
            }),
            MaintainAction::Purge => {
                if !options.yes {
                    return MaintainOutput::failure(
                        action,
                        "purge deletes every record; pass --yes to confirm",
                    );
                }
                self.service
                    .purge()
                    .map(|()| MaintainOutput::done(action, None, None))
            }
        };

        result.unwrap_or_else(|e| MaintainOutput::failure(action, e.to_string()))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &MaintainOutput, options: &MaintainOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "{} failed: {}\n",
                output.action.as_str(),
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        match output.action {
            MaintainAction::Clear => format!(
                "Statistics cleared. Records below #{} are hidden.\n",
                output.watermark.unwrap_or(0)
            ),
            MaintainAction::Compact => format!(
                "Compacted ledger, removed {} hidden record(s).\n",
                output.removed.unwrap_or(0)
            ),
            MaintainAction::Purge => "Ledger purged.\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameRecord;
    use crate::storage::{MemoryLedger, MemoryWatermark};

    fn command() -> MaintainCommand<MemoryLedger, MemoryWatermark> {
        let service = StatsService::new(MemoryLedger::new(), MemoryWatermark::new());
        for id in 0..3 {
            service
                .append_record(&GameRecord::new(id, 9, 9, 10))
                .unwrap();
        }
        MaintainCommand::new(service)
    }

    #[test]
    fn test_clear() {
        let cmd = command();
        let options = MaintainOptions::default();
        let output = cmd.run(MaintainAction::Clear, &options);

        assert!(output.success);
        assert_eq!(output.watermark, Some(3));
        assert_eq!(cmd.service().ledger().len(), 3);
        assert_eq!(
            cmd.format_output(&output, &options),
            "Statistics cleared. Records below #3 are hidden.\n"
        );
    }

    #[test]
    fn test_compact_after_clear() {
        let cmd = command();
        let options = MaintainOptions::default();
        cmd.run(MaintainAction::Clear, &options);

        let output = cmd.run(MaintainAction::Compact, &options);
        assert!(output.success);
        assert_eq!(output.removed, Some(3));
        assert_eq!(output.watermark, Some(3));
        assert!(cmd.service().ledger().is_empty());
    }

    #[test]
    fn test_purge_requires_confirmation() {
        let cmd = command();
        let output = cmd.run(MaintainAction::Purge, &MaintainOptions::default());

        assert!(!output.success);
        assert_eq!(cmd.service().ledger().len(), 3);
    }

    #[test]
    fn test_purge_confirmed() {
        let cmd = command();
        let options = MaintainOptions {
            yes: true,
            ..Default::default()
        };
        let output = cmd.run(MaintainAction::Purge, &options);

        assert!(output.success);
        assert!(cmd.service().ledger().is_empty());
        assert_eq!(cmd.format_output(&output, &options), "Ledger purged.\n");
    }

    #[test]
    fn test_json_output() {
        let cmd = command();
        let options = MaintainOptions {
            json: true,
            ..Default::default()
        };
        let output = cmd.run(MaintainAction::Clear, &options);

        let parsed: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &options)).unwrap();
        assert_eq!(parsed["action"], "clear");
        assert_eq!(parsed["watermark"], 3);
        assert!(parsed.get("removed").is_none());
    }
}
