//! Folding records into statistics summaries.
//!
//! [`Tally`] is the accumulator. Every field is a sum, a count or a
//! minimum, so tallies can be built in any order and merged.

use serde::{Deserialize, Serialize};

use crate::core::GameRecord;
use crate::stats::Category;

/// Running totals over a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Number of records.
    pub games: u64,
    /// Sum of all durations.
    pub total_time: u64,
    /// Sum of durations of won games.
    pub victory_time: u64,
    /// Shortest won game; `None` until a victory is seen.
    pub shortest_victory: Option<u64>,
    /// Sum of mine counts.
    pub mines: u64,
    /// Number of won games.
    pub victories: u64,
    /// Sum of revealed cells.
    pub open_area: u64,
}

impl Tally {
    /// Create an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally a sequence of records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a GameRecord>) -> Self {
        records.into_iter().fold(Self::new(), |mut tally, record| {
            tally.add(record);
            tally
        })
    }

    /// Add one record.
    pub fn add(&mut self, record: &GameRecord) {
        self.games += 1;
        self.total_time = self.total_time.saturating_add(record.duration);
        self.mines += u64::from(record.mines);
        self.open_area += u64::from(record.open_area);

        if record.is_victory() {
            self.victories += 1;
            self.victory_time = self.victory_time.saturating_add(record.duration);
            self.shortest_victory = min_option(self.shortest_victory, Some(record.duration));
        }
    }

    /// Combine two tallies as if their records had been tallied together.
    pub fn merge(self, other: Tally) -> Tally {
        Tally {
            games: self.games + other.games,
            total_time: self.total_time.saturating_add(other.total_time),
            victory_time: self.victory_time.saturating_add(other.victory_time),
            shortest_victory: min_option(self.shortest_victory, other.shortest_victory),
            mines: self.mines + other.mines,
            victories: self.victories + other.victories,
            open_area: self.open_area + other.open_area,
        }
    }

    /// Produce the summary for `category`.
    pub fn summarize(&self, category: Category) -> StatsSummary {
        let average_victory_time = if self.victories > 0 {
            self.victory_time / self.victories
        } else {
            0
        };

        StatsSummary {
            category,
            total_games: self.games,
            total_time: self.total_time,
            victory_time_sum: self.victory_time,
            average_victory_time,
            shortest_victory_time: self.shortest_victory.unwrap_or(0),
            total_mines: self.mines,
            victory_count: self.victories,
            total_open_area: self.open_area,
        }
    }
}

fn min_option(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Aggregate statistics for one category.
///
/// Computed on demand and never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSummary {
    /// Which bucket this summarizes.
    pub category: Category,
    /// Number of games.
    pub total_games: u64,
    /// Sum of all durations.
    pub total_time: u64,
    /// Sum of durations of won games.
    pub victory_time_sum: u64,
    /// `victory_time_sum / victory_count`, or 0 with no victories.
    pub average_victory_time: u64,
    /// Shortest won game, or 0 with no victories.
    pub shortest_victory_time: u64,
    /// Sum of mine counts.
    pub total_mines: u64,
    /// Number of won games.
    pub victory_count: u64,
    /// Sum of revealed cells.
    pub total_open_area: u64,
}

impl StatsSummary {
    /// Whether any game was counted.
    pub fn is_empty(&self) -> bool {
        self.total_games == 0
    }
}

/// Fold records into a summary for `category`.
///
/// Zero records fold to an all-zero summary.
pub fn fold<'a>(
    category: Category,
    records: impl IntoIterator<Item = &'a GameRecord>,
) -> StatsSummary {
    Tally::from_records(records).summarize(category)
}
