//! Field coordinates

use crate::error::{RefereeError, Result};
use serde::Serialize;
use std::fmt;

/// Width and height of the field
pub const FIELD_SIZE: usize = 9;

/// Width and height of a sub-board and of the macro-board
pub const BOARD_SIZE: usize = 3;

/// A field coordinate, always within 0..9 on both axes
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct Move {
    row: usize,
    col: usize,
}

impl Move {
    /// Create a move, rejecting coordinates outside the field
    pub fn new(row: usize, col: usize) -> Result<Self> {
        if row >= FIELD_SIZE || col >= FIELD_SIZE {
            return Err(RefereeError::OutOfBounds { row, col });
        }
        Ok(Self { row, col })
    }

    /// For coordinates the engine derives itself
    pub(crate) fn on_field(row: usize, col: usize) -> Self {
        debug_assert!(row < FIELD_SIZE && col < FIELD_SIZE);
        Self { row, col }
    }

    pub fn row(self) -> usize {
        self.row
    }

    pub fn col(self) -> usize {
        self.col
    }

    /// Macro-board coordinate of the sub-board containing this cell
    pub fn sub_board(self) -> (usize, usize) {
        (self.row / BOARD_SIZE, self.col / BOARD_SIZE)
    }

    /// Macro-board coordinate the opponent is sent to
    pub fn forced_target(self) -> (usize, usize) {
        (self.row % BOARD_SIZE, self.col % BOARD_SIZE)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(row {}, col {})", self.row, self.col)
    }
}
