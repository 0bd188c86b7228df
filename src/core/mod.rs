//! Core types for minestats.
//!
//! This module contains the game record entity and the board shapes that
//! classification is measured against.

pub mod board;
pub mod record;

pub use board::{Difficulty, StandardSize};
pub use record::{GameRecord, RECORD_SCHEMA_VERSION};
