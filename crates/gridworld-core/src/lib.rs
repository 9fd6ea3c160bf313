//! Core types for the GridWorld population model.
//!
//! A [`PopulationGrid`] is a fixed `rows x cols` array of districts. Each
//! district keeps its residents in a doubly-linked list threaded through the
//! person table, so births append in O(1), deaths unlink in O(1), and the
//! list order always reflects seniority (oldest continuous resident first).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

mod grid;
mod roster;

pub use grid::{District, Members, PopulationGrid};
pub use roster::{Person, Roster};

/// Stable identifier for a person.
///
/// The value is the person's slot in the roster. Slots are never released, so
/// an identifier keeps pointing at the same slot for the lifetime of the grid;
/// after a death the value may be handed out again by a later birth.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct PersonId(pub u32);

impl PersonId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Row/column address of a district.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl From<(u32, u32)> for Cell {
    fn from((row, col): (u32, u32)) -> Self {
        Self { row, col }
    }
}

/// Errors reported by grid operations.
///
/// A failed call never leaves partial changes behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Coordinates fall outside the grid.
    #[error("district ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },
    /// Identifier was never issued or refers to a dead person.
    #[error("person {0} is not alive")]
    InvalidId(PersonId),
    /// Internal bookkeeping disagrees with itself; only raised by audits.
    #[error("grid state corrupted: {0}")]
    Corrupted(String),
}

/// Static configuration for a population grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridConfig {
    /// Number of district rows.
    pub rows: u32,
    /// Number of district columns.
    pub cols: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { rows: 8, cols: 8 }
    }
}

impl GridConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GridError::InvalidConfig("grid dimensions must be non-zero"));
        }
        if u64::from(self.rows) * u64::from(self.cols) > u64::from(u32::MAX) {
            return Err(GridError::InvalidConfig(
                "grid must hold at most u32::MAX districts",
            ));
        }
        Ok(())
    }
}
