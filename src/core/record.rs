//! Game record entity for minestats.
//!
//! A `GameRecord` is one completed (or abandoned) game attempt. Records are
//! immutable once appended to the ledger.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// Schema version for record frames.
///
/// Increment when the record layout changes. Older frames keep decoding;
/// frames newer than this version are treated as malformed.
pub const RECORD_SCHEMA_VERSION: u8 = 1;

/// One completed game attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GameRecord {
    /// Unique, strictly increasing identifier.
    pub id: u64,
    /// Board width in cells.
    pub width: u32,
    /// Board height in cells.
    pub height: u32,
    /// Number of mines on the board.
    pub mines: u32,
    /// Elapsed time units.
    pub duration: u64,
    /// Non-zero when the game was won.
    pub victory: u32,
    /// Non-mine cells revealed.
    pub open_area: u32,
}

impl GameRecord {
    /// Create a record for a board of the given shape.
    ///
    /// Duration, victory and open area start at zero; use the `with_*`
    /// methods to fill them in.
    pub fn new(id: u64, width: u32, height: u32, mines: u32) -> Self {
        Self {
            id,
            width,
            height,
            mines,
            duration: 0,
            victory: 0,
            open_area: 0,
        }
    }

    /// Set the elapsed duration.
    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    /// Mark the game as won or lost.
    pub fn with_victory(mut self, won: bool) -> Self {
        self.victory = u32::from(won);
        self
    }

    /// Set the number of revealed non-mine cells.
    pub fn with_open_area(mut self, open_area: u32) -> Self {
        self.open_area = open_area;
        self
    }

    /// Whether the game was won.
    pub fn is_victory(&self) -> bool {
        self.victory != 0
    }

    /// Total number of cells on the board.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Check the record invariants before it is appended.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StatsError::invalid_record(format!(
                "record {}: board dimensions must be positive ({}x{})",
                self.id, self.width, self.height
            )));
        }

        let area = self.area();
        if u64::from(self.mines) > area {
            return Err(StatsError::invalid_record(format!(
                "record {}: {} mines do not fit on a {}x{} board",
                self.id, self.mines, self.width, self.height
            )));
        }

        let safe_cells = area - u64::from(self.mines);
        if u64::from(self.open_area) > safe_cells {
            return Err(StatsError::invalid_record(format!(
                "record {}: open area {} exceeds {} safe cells",
                self.id, self.open_area, safe_cells
            )));
        }

        Ok(())
    }
}
