//! Difficulty classification for game records.
//!
//! Categories are independent predicates, not a partition: every record is
//! in `General`, and a record may also sit in several specific buckets at
//! once (an exact standard-size board is both `FixedSize` and, unless it is
//! a named board, `Progressive`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Difficulty, GameRecord, StandardSize};

/// A named statistics bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    General,
    Progressive,
    FixedSize,
    Legend,
    Master,
    Expert,
    Intermediate,
    Beginner,
    Custom,
}

impl Category {
    /// All categories in report display order.
    pub const ALL: [Category; 9] = [
        Category::General,
        Category::Progressive,
        Category::FixedSize,
        Category::Legend,
        Category::Master,
        Category::Expert,
        Category::Intermediate,
        Category::Beginner,
        Category::Custom,
    ];

    /// Whether `record` belongs to this category.
    pub fn matches(&self, standard: &StandardSize, record: &GameRecord) -> bool {
        match self {
            Category::General => true,
            Category::Progressive => {
                standard.is_family_member(record)
                    && !Difficulty::ALL.iter().any(|d| d.matches(record))
            }
            Category::FixedSize => standard.same_board(record),
            Category::Legend => Difficulty::Legend.matches(record),
            Category::Master => Difficulty::Master.matches(record),
            Category::Expert => Difficulty::Expert.matches(record),
            Category::Intermediate => Difficulty::Intermediate.matches(record),
            Category::Beginner => Difficulty::Beginner.matches(record),
            // Master and Legend boards are not excluded here.
            Category::Custom => {
                !Difficulty::Expert.matches(record)
                    && !Difficulty::Intermediate.matches(record)
                    && !Difficulty::Beginner.matches(record)
                    && !standard.same_dimensions(record)
            }
        }
    }

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Progressive => "Progressive",
            Category::FixedSize => "Fixed Size",
            Category::Legend => "Legend",
            Category::Master => "Master",
            Category::Expert => "Expert",
            Category::Intermediate => "Intermediate",
            Category::Beginner => "Beginner",
            Category::Custom => "Custom",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Every category the record belongs to, in display order.
pub fn categories_of(standard: &StandardSize, record: &GameRecord) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| c.matches(standard, record))
        .collect()
}

/// Group records by category, evaluating each category independently.
///
/// Returns one entry per category in display order, including empty ones.
pub fn classify<'a>(
    standard: &StandardSize,
    records: &'a [GameRecord],
) -> Vec<(Category, Vec<&'a GameRecord>)> {
    Category::ALL
        .into_iter()
        .map(|category| {
            let members = records
                .iter()
                .filter(|r| category.matches(standard, r))
                .collect();
            (category, members)
        })
        .collect()
}
