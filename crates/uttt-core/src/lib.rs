//! # uttt-core
//!
//! Core types for refereeing ultimate tic-tac-toe.
//!
//! This crate provides:
//! - The board model and rule engine ([`BoardState`])
//! - Player, cell and macro-board cell types
//! - The line protocol spoken with agents
//! - The shared error type

pub mod board;
pub mod cell;
pub mod error;
pub mod moves;
pub mod protocol;

pub use board::{BoardState, MatchStatus};
pub use cell::{Cell, MacroCell, Player};
pub use error::{RefereeError, Result};
pub use moves::{BOARD_SIZE, FIELD_SIZE, Move};
pub use protocol::{AgentReply, Directive, ReplyError};
