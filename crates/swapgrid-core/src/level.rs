//! Difficulty ladder.
//!
//! A level fixes the grid shape (`rows = level`) and the number of swap
//! pairs (`ceil(level / 2)`). The ladder runs from 1 to [`MAX_LEVEL`].

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Highest level the engine supports.
pub const MAX_LEVEL: u8 = 5;

/// Default number of grid columns.
pub const DEFAULT_COLUMNS: usize = 4;

/// Widest grid a config may ask for.
pub const MAX_COLUMNS: usize = 16;

/// A validated difficulty level in `1..=MAX_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const FIRST: Self = Self(1);

    /// Validate a raw level number.
    pub fn new(level: u8) -> Result<Self> {
        if (1..=MAX_LEVEL).contains(&level) {
            Ok(Self(level))
        } else {
            Err(EngineError::InvalidLevel { level })
        }
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Grid rows at this level.
    #[inline]
    #[must_use]
    pub const fn rows(self) -> usize {
        self.0 as usize
    }

    /// Total grid cells (`N`) for the given column count.
    #[inline]
    #[must_use]
    pub const fn item_count(self, columns: usize) -> usize {
        self.rows() * columns
    }

    /// Number of swap pairs requested at this level: `ceil(level / 2)`.
    #[inline]
    #[must_use]
    pub const fn pair_count(self) -> usize {
        (self.0 as usize).div_ceil(2)
    }

    /// The following level, or `None` once `last` has been reached.
    #[must_use]
    pub fn next(self, last: Self) -> Option<Self> {
        (self < last).then(|| Self(self.0 + 1))
    }
}

impl TryFrom<u8> for Level {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
