//! Statistics for minestats.
//!
//! Records are classified into nine categories and folded into one
//! summary per category. Reports are always rebuilt from the ledger;
//! nothing derived is persisted except the watermark.

pub mod aggregate;
pub mod classify;
pub mod service;

pub use aggregate::{fold, StatsSummary, Tally};
pub use classify::{categories_of, classify, Category};
pub use service::{build_report, StatsService};
