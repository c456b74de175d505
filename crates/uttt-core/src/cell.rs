//! Players, field cells and macro-board cells

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two seats in a match
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Wire id (1 or 2)
    pub fn id(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    /// Player for a wire id
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Zero-based seat index
    pub fn index(self) -> usize {
        usize::from(self.id() - 1)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A single square of the 9x9 field
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum Cell {
    #[default]
    Empty,
    Occupied(Player),
}

impl Cell {
    /// Wire encoding: 0 empty, 1 or 2 for the owning player
    pub fn wire_value(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Occupied(player) => player.id(),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// Status of one sub-board on the macro-board
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum MacroCell {
    /// Playable on the next move
    #[default]
    Available,
    /// Undecided but not playable on the next move
    Blocked,
    /// Three in a row claimed by a player
    Won(Player),
    /// Full with no winner
    Dead,
}

impl MacroCell {
    /// Wire encoding: -1 available, 0 blocked, 1/2 won, 9 dead
    pub fn wire_value(self) -> i8 {
        match self {
            MacroCell::Available => -1,
            MacroCell::Blocked => 0,
            MacroCell::Won(player) => player.id() as i8,
            MacroCell::Dead => 9,
        }
    }

    /// Won or dead; never changes again
    pub fn is_terminal(self) -> bool {
        matches!(self, MacroCell::Won(_) | MacroCell::Dead)
    }

    pub fn is_available(self) -> bool {
        self == MacroCell::Available
    }
}
