//! Board state and the rule engine
//!
//! The field is a 9x9 grid split into nine 3x3 sub-boards. Each sub-board
//! has a matching cell on the 3x3 macro-board that records whether it is
//! playable, blocked, won or dead. [`BoardState::apply`] is the only way the
//! state changes.

use crate::cell::{Cell, MacroCell, Player};
use crate::error::{RefereeError, Result};
use crate::moves::{BOARD_SIZE, FIELD_SIZE, Move};
use serde::Serialize;
use std::fmt;

/// Every three-in-a-row on a 3x3 grid
const LINES: [[(usize, usize); 3]; 8] = [
    // Rows
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    // Columns
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    // Diagonals
    [(0, 0), (1, 1), (2, 2)],
    [(2, 0), (1, 1), (0, 2)],
];

fn has_line(owns: impl Fn(usize, usize) -> bool) -> bool {
    LINES
        .iter()
        .any(|line| line.iter().all(|&(r, c)| owns(r, c)))
}

/// Overall match status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum MatchStatus {
    Ongoing,
    Won(Player),
    Draw,
}

impl MatchStatus {
    pub fn is_finished(self) -> bool {
        self != MatchStatus::Ongoing
    }
}

/// Complete state of a match board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    field: [[Cell; FIELD_SIZE]; FIELD_SIZE],
    macro_board: [[MacroCell; BOARD_SIZE]; BOARD_SIZE],
    player_just_moved: Player,
    status: MatchStatus,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Empty board with every sub-board available and player one to move
    pub fn new() -> Self {
        Self {
            field: [[Cell::Empty; FIELD_SIZE]; FIELD_SIZE],
            macro_board: [[MacroCell::Available; BOARD_SIZE]; BOARD_SIZE],
            player_just_moved: Player::Two,
            status: MatchStatus::Ongoing,
        }
    }

    /// The cell at `(row, col)`, `None` off the field
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.field.get(row)?.get(col).copied()
    }

    /// The state of sub-board `(macro_row, macro_col)`, `None` off the macro board
    pub fn macro_cell(&self, macro_row: usize, macro_col: usize) -> Option<MacroCell> {
        self.macro_board.get(macro_row)?.get(macro_col).copied()
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn player_just_moved(&self) -> Player {
        self.player_just_moved
    }

    pub fn player_to_move(&self) -> Player {
        self.player_just_moved.opponent()
    }

    /// Apply a move for the player to move.
    ///
    /// Illegal moves are rejected without touching the state.
    pub fn apply(&mut self, mv: Move) -> Result<()> {
        self.check_legal(mv)?;

        let mover = self.player_just_moved.opponent();
        self.player_just_moved = mover;
        self.field[mv.row()][mv.col()] = Cell::Occupied(mover);

        let (macro_row, macro_col) = mv.sub_board();
        if self.sub_board_has_line(macro_row, macro_col, mover) {
            self.macro_board[macro_row][macro_col] = MacroCell::Won(mover);
            if has_line(|r, c| self.macro_board[r][c] == MacroCell::Won(mover)) {
                self.status = MatchStatus::Won(mover);
                return Ok(());
            }
        } else if self.sub_board_is_full(macro_row, macro_col) {
            self.macro_board[macro_row][macro_col] = MacroCell::Dead;
        }

        self.open_next_boards(mv.forced_target());
        Ok(())
    }

    fn check_legal(&self, mv: Move) -> Result<()> {
        if self.is_finished() {
            return Err(RefereeError::MatchOver);
        }
        let (macro_row, macro_col) = mv.sub_board();
        if !self.macro_board[macro_row][macro_col].is_available() {
            return Err(RefereeError::IllegalMove {
                row: mv.row(),
                col: mv.col(),
                reason: format!("sub-board ({}, {}) is not playable", macro_row, macro_col),
            });
        }
        if let Cell::Occupied(owner) = self.field[mv.row()][mv.col()] {
            return Err(RefereeError::IllegalMove {
                row: mv.row(),
                col: mv.col(),
                reason: format!("cell already taken by player {}", owner),
            });
        }
        Ok(())
    }

    /// Point the next player at the forced sub-board, or open every
    /// undecided sub-board when the forced one is already decided.
    fn open_next_boards(&mut self, (target_row, target_col): (usize, usize)) {
        if !self.macro_board[target_row][target_col].is_terminal() {
            for cell in self.macro_board.iter_mut().flatten() {
                if !cell.is_terminal() {
                    *cell = MacroCell::Blocked;
                }
            }
            self.macro_board[target_row][target_col] = MacroCell::Available;
            return;
        }

        let mut available = 0;
        for cell in self.macro_board.iter_mut().flatten() {
            if !cell.is_terminal() {
                *cell = MacroCell::Available;
                available += 1;
            }
        }
        if available == 0 {
            self.status = MatchStatus::Draw;
        }
    }

    fn sub_board_has_line(&self, macro_row: usize, macro_col: usize, player: Player) -> bool {
        let base_row = macro_row * BOARD_SIZE;
        let base_col = macro_col * BOARD_SIZE;
        has_line(|r, c| self.field[base_row + r][base_col + c] == Cell::Occupied(player))
    }

    fn sub_board_is_full(&self, macro_row: usize, macro_col: usize) -> bool {
        sub_board_cells(macro_row, macro_col).all(|(r, c)| !self.field[r][c].is_empty())
    }

    /// Every empty cell inside an available sub-board.
    ///
    /// Sub-boards are visited in row-major macro order and cells in
    /// row-major order within each sub-board.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(FIELD_SIZE);
        for macro_row in 0..BOARD_SIZE {
            for macro_col in 0..BOARD_SIZE {
                if !self.macro_board[macro_row][macro_col].is_available() {
                    continue;
                }
                for (r, c) in sub_board_cells(macro_row, macro_col) {
                    if self.field[r][c].is_empty() {
                        moves.push(Move::on_field(r, c));
                    }
                }
            }
        }
        moves
    }

    /// Score for `player` once the match is over: 1.0 win, 0.5 draw, 0.0 loss
    pub fn result(&self, player: Player) -> Result<f64> {
        match self.status {
            MatchStatus::Ongoing => Err(RefereeError::NotFinished),
            MatchStatus::Draw => Ok(0.5),
            MatchStatus::Won(winner) if winner == player => Ok(1.0),
            MatchStatus::Won(_) => Ok(0.0),
        }
    }

    /// Mark every blocked sub-board with no empty cell as dead.
    ///
    /// Returns how many sub-boards changed. `apply` already marks the board it
    /// plays into, so on states produced by `apply` this returns 0.
    pub fn audit_dead_boards(&mut self) -> usize {
        let mut marked = 0;
        for macro_row in 0..BOARD_SIZE {
            for macro_col in 0..BOARD_SIZE {
                if self.macro_board[macro_row][macro_col] == MacroCell::Blocked
                    && self.sub_board_is_full(macro_row, macro_col)
                {
                    self.macro_board[macro_row][macro_col] = MacroCell::Dead;
                    marked += 1;
                }
            }
        }
        marked
    }

    /// The 81 field values, row-major and comma-separated
    pub fn field_wire(&self) -> String {
        join_wire(self.field.iter().flatten().map(|cell| cell.wire_value()))
    }

    /// The 9 macro-board values, row-major and comma-separated
    pub fn macroboard_wire(&self) -> String {
        join_wire(self.macro_board.iter().flatten().map(|cell| cell.wire_value()))
    }

    #[cfg(test)]
    pub(crate) fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        self.field[row][col] = cell;
    }

    #[cfg(test)]
    pub(crate) fn set_macro_cell(&mut self, macro_row: usize, macro_col: usize, cell: MacroCell) {
        self.macro_board[macro_row][macro_col] = cell;
    }
}

/// Field coordinates of a sub-board, row-major
fn sub_board_cells(macro_row: usize, macro_col: usize) -> impl Iterator<Item = (usize, usize)> {
    let base_row = macro_row * BOARD_SIZE;
    let base_col = macro_col * BOARD_SIZE;
    (0..BOARD_SIZE).flat_map(move |r| (0..BOARD_SIZE).map(move |c| (base_row + r, base_col + c)))
}

fn join_wire<T: ToString>(values: impl Iterator<Item = T>) -> String {
    values
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Status: {:?}, player just moved: {}",
            self.status, self.player_just_moved
        )?;
        writeln!(f, "Macro board:")?;
        for row in &self.macro_board {
            let values: Vec<String> = row
                .iter()
                .map(|cell| format!("{:>2}", cell.wire_value()))
                .collect();
            writeln!(f, "{}", values.join(" "))?;
        }
        writeln!(f, "Field:")?;
        for (i, row) in self.field.iter().enumerate() {
            if i == 3 || i == 6 {
                writeln!(f, "------+-------+------")?;
            }
            let mut line = String::new();
            for (j, cell) in row.iter().enumerate() {
                if j == 3 || j == 6 {
                    line.push_str("| ");
                }
                line.push_str(&cell.wire_value().to_string());
                if j + 1 < FIELD_SIZE {
                    line.push(' ');
                }
            }
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
