//! Board shapes: the configured standard size and the named difficulties.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::GameRecord;
use crate::error::{Result, StatsError};

/// The configured "preferred" board shape.
///
/// Progressive and fixed-size classification are measured relative to it.
/// Construct through [`StandardSize::new`] so the shape is always a legal
/// board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct StandardSize {
    /// Board width in cells.
    pub width: u32,
    /// Board height in cells.
    pub height: u32,
    /// Number of mines.
    pub mines: u32,
}

impl StandardSize {
    /// Create a validated standard size.
    pub fn new(width: u32, height: u32, mines: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(StatsError::config(format!(
                "standard size must have positive dimensions, got {}x{}",
                width, height
            )));
        }
        if u64::from(mines) > u64::from(width) * u64::from(height) {
            return Err(StatsError::config(format!(
                "standard size {}x{} cannot hold {} mines",
                width, height, mines
            )));
        }
        Ok(Self {
            width,
            height,
            mines,
        })
    }

    /// Whether the record's board has these dimensions, in either orientation.
    pub fn same_dimensions(&self, record: &GameRecord) -> bool {
        (record.width == self.width && record.height == self.height)
            || (record.width == self.height && record.height == self.width)
    }

    /// Whether the record is exactly this board, in either orientation.
    pub fn same_board(&self, record: &GameRecord) -> bool {
        record.mines == self.mines && self.same_dimensions(record)
    }

    /// Whether the record is an even, non-shrinking expansion of this size.
    ///
    /// Both axes must grow by an even (possibly zero) number of cells. The
    /// check is tried with the record as-is and with its axes swapped.
    pub fn is_family_member(&self, record: &GameRecord) -> bool {
        let width = i64::from(record.width);
        let height = i64::from(record.height);
        let std_width = i64::from(self.width);
        let std_height = i64::from(self.height);

        even_growth(width - std_width, height - std_height)
            || even_growth(height - std_width, width - std_height)
    }

    /// The named difficulty this size coincides with, if any.
    ///
    /// When the standard size is itself a named board, progressive and
    /// named buckets can no longer be told apart for that board.
    pub fn named_difficulty(&self) -> Option<Difficulty> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.matches_shape(self.width, self.height, self.mines))
    }
}

fn even_growth(d_width: i64, d_height: i64) -> bool {
    d_width >= 0 && d_width % 2 == 0 && d_height >= 0 && d_height % 2 == 0
}

impl Default for StandardSize {
    fn default() -> Self {
        Self {
            width: 9,
            height: 16,
            mines: 20,
        }
    }
}

impl fmt::Display for StandardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} ({} mines)", self.width, self.height, self.mines)
    }
}

/// The fixed, named difficulties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
    Master,
    Legend,
}

impl Difficulty {
    /// All named difficulties, smallest board first.
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Expert,
        Difficulty::Master,
        Difficulty::Legend,
    ];

    /// Whether the record was played on this difficulty's board.
    ///
    /// Named boards are square, so orientation does not matter.
    pub fn matches(&self, record: &GameRecord) -> bool {
        self.matches_shape(record.width, record.height, record.mines)
    }

    fn matches_shape(&self, width: u32, height: u32, mines: u32) -> bool {
        match self {
            Difficulty::Beginner => mines == 10 && width == 9 && height == 9,
            Difficulty::Intermediate => mines == 40 && width == 16 && height == 16,
            Difficulty::Expert => mines == 99 && width == 24 && height == 24,
            Difficulty::Master => matches!(mines, 200 | 300 | 400) && width == 50 && height == 50,
            Difficulty::Legend => mines == 2000 && width == 100 && height == 100,
        }
    }

    /// Get the difficulty name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Expert => "expert",
            Difficulty::Master => "master",
            Difficulty::Legend => "legend",
        }
    }
}
