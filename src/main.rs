//! minestats - minesweeper game statistics
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use minestats::cli::{open_service, FileStatsService, MaintainAction};
use minestats::config::{crash_log_path, Config};
use minestats::error::exit_codes;

// =============================================================================
// CLI Definition
// =============================================================================

/// minestats - record finished minesweeper games and report statistics
#[derive(Parser)]
#[command(name = "minestats")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a finished game
    Record {
        /// Board width in cells
        width: u32,
        /// Board height in cells
        height: u32,
        /// Number of mines
        mines: u32,
        /// Game duration in seconds
        duration: u64,
        /// The game was won
        #[arg(long)]
        won: bool,
        /// Cells revealed by the end of the game
        #[arg(long, default_value_t = 0)]
        open_area: u32,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show statistics per category
    Report {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List recorded games
    Records {
        /// Include cleared records
        #[arg(long, short)]
        all: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Hide every recorded game from reports
    Clear {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Drop cleared games from the ledger file
    Compact {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Delete the whole ledger
    Purge {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("minestats error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.minestats/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("minestats panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Some(parent) = crash_log.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load_fail_open();
    let service = open_service(&config)?;

    match cli.command {
        Commands::Record {
            width,
            height,
            mines,
            duration,
            won,
            open_area,
            json,
            quiet,
        } => {
            use minestats::cli::record::RecordOptions;

            let options = RecordOptions {
                width,
                height,
                mines,
                duration,
                won,
                open_area,
                json,
                quiet,
            };
            run_record(service, &config, &options)
        }
        Commands::Report { json, quiet } => run_report(service, &config, json, quiet),
        Commands::Records { all, json, quiet } => run_records(service, all, json, quiet),
        Commands::Clear { json, quiet } => {
            run_maintain(service, MaintainAction::Clear, false, json, quiet)
        }
        Commands::Compact { json, quiet } => {
            run_maintain(service, MaintainAction::Compact, false, json, quiet)
        }
        Commands::Purge { yes, json, quiet } => {
            run_maintain(service, MaintainAction::Purge, yes, json, quiet)
        }
    }
}

/// Map command success to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

fn print_output(formatted: &str) {
    if !formatted.is_empty() {
        print!("{}", formatted);
        if !formatted.ends_with('\n') {
            println!();
        }
    }
}

fn run_record(
    service: FileStatsService,
    config: &Config,
    options: &minestats::cli::record::RecordOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use minestats::cli::record::RecordCommand;

    let cmd = RecordCommand::new(service, config.standard_size()?);

    let output = cmd.run(options);
    print_output(&cmd.format_output(&output, options));

    Ok(success_to_exit_code(output.success))
}

fn run_records(
    service: FileStatsService,
    all: bool,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use minestats::cli::records::{RecordsCommand, RecordsOptions};

    let cmd = RecordsCommand::new(service);
    let options = RecordsOptions { all, json, quiet };

    let output = cmd.run(&options);
    print_output(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_report(
    service: FileStatsService,
    config: &Config,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use minestats::cli::report::{ReportCommand, ReportOptions};

    let cmd = ReportCommand::new(service, config.standard_size()?);
    let options = ReportOptions { json, quiet };

    let output = cmd.run(&options);
    print_output(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_maintain(
    service: FileStatsService,
    action: MaintainAction,
    yes: bool,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use minestats::cli::maintain::{MaintainCommand, MaintainOptions};

    let cmd = MaintainCommand::new(service);
    let options = MaintainOptions { json, quiet, yes };

    let output = cmd.run(action, &options);
    print_output(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::ERROR, 1);
        assert_eq!(exit_codes::CRASH, 3);
    }

    #[test]
    fn test_success_to_exit_code() {
        assert_eq!(
            success_to_exit_code(true),
            ExitCode::from(exit_codes::SUCCESS as u8)
        );
        assert_eq!(
            success_to_exit_code(false),
            ExitCode::from(exit_codes::ERROR as u8)
        );
    }

    #[test]
    fn test_cli_parse_record() {
        let cli = Cli::parse_from([
            "minestats",
            "record",
            "9",
            "9",
            "10",
            "55",
            "--won",
            "--open-area",
            "71",
        ]);
        match cli.command {
            Commands::Record {
                width,
                height,
                mines,
                duration,
                won,
                open_area,
                ..
            } => {
                assert_eq!((width, height, mines, duration), (9, 9, 10, 55));
                assert!(won);
                assert_eq!(open_area, 71);
            }
            _ => panic!("Expected Record command"),
        }
    }

    #[test]
    fn test_cli_parse_record_defaults() {
        let cli = Cli::parse_from(["minestats", "record", "16", "16", "40", "120"]);
        match cli.command {
            Commands::Record { won, open_area, .. } => {
                assert!(!won);
                assert_eq!(open_area, 0);
            }
            _ => panic!("Expected Record command"),
        }
    }

    #[test]
    fn test_cli_parse_report() {
        let cli = Cli::parse_from(["minestats", "report", "--json"]);
        match cli.command {
            Commands::Report { json, quiet } => {
                assert!(json);
                assert!(!quiet);
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_cli_parse_records_all() {
        let cli = Cli::parse_from(["minestats", "records", "--all"]);
        assert!(matches!(cli.command, Commands::Records { all: true, .. }));
    }

    #[test]
    fn test_cli_parse_purge() {
        let cli = Cli::parse_from(["minestats", "purge", "--yes"]);
        assert!(matches!(cli.command, Commands::Purge { yes: true, .. }));

        let cli = Cli::parse_from(["minestats", "purge"]);
        assert!(matches!(cli.command, Commands::Purge { yes: false, .. }));
    }

    #[test]
    fn test_cli_parse_clear_and_compact() {
        assert!(matches!(
            Cli::parse_from(["minestats", "clear"]).command,
            Commands::Clear { .. }
        ));
        assert!(matches!(
            Cli::parse_from(["minestats", "compact", "-q"]).command,
            Commands::Compact { quiet: true, .. }
        ));
    }
}
