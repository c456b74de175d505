//! Line protocol between the referee and an agent
//!
//! Every message is one ASCII line. The referee sends [`Directive`]s and the
//! agent answers an `action move` with a single [`AgentReply`].
//!
//! Note: the reply carries the column before the row, the reverse of
//! [`Move`]'s field order.

use crate::board::BoardState;
use crate::moves::Move;
use std::fmt;
use std::str::FromStr;

/// Messages sent from the referee to an agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `settings timebank <ms>`
    Timebank { max_ms: u64 },
    /// `settings time_per_move <ms>`
    TimePerMove { increment_ms: u64 },
    /// `settings player_names <name1>,<name2>`
    PlayerNames { first: String, second: String },
    /// `settings your_bot <name>`
    YourBot { name: String },
    /// `settings your_botid <id>`
    YourBotId { id: u8 },
    /// `update game round <n>`
    Round { round: u32 },
    /// `update game move <n>`
    MoveNumber { number: u32 },
    /// `update game field <81 values>`
    Field { values: String },
    /// `update game macroboard <9 values>`
    MacroBoard { values: String },
    /// `action move <ms>`
    ActionMove { timebank_ms: u64 },
}

impl Directive {
    /// The two board updates describing `state`
    pub fn board_updates(state: &BoardState) -> [Directive; 2] {
        [
            Directive::Field {
                values: state.field_wire(),
            },
            Directive::MacroBoard {
                values: state.macroboard_wire(),
            },
        ]
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Timebank { max_ms } => write!(f, "settings timebank {}", max_ms),
            Directive::TimePerMove { increment_ms } => {
                write!(f, "settings time_per_move {}", increment_ms)
            }
            Directive::PlayerNames { first, second } => {
                write!(f, "settings player_names {},{}", first, second)
            }
            Directive::YourBot { name } => write!(f, "settings your_bot {}", name),
            Directive::YourBotId { id } => write!(f, "settings your_botid {}", id),
            Directive::Round { round } => write!(f, "update game round {}", round),
            Directive::MoveNumber { number } => write!(f, "update game move {}", number),
            Directive::Field { values } => write!(f, "update game field {}", values),
            Directive::MacroBoard { values } => write!(f, "update game macroboard {}", values),
            Directive::ActionMove { timebank_ms } => write!(f, "action move {}", timebank_ms),
        }
    }
}

/// Why an agent's line could not be understood
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    #[error("empty reply")]
    Empty,
    #[error("unknown command {0:?}, expected place_move")]
    UnknownCommand(String),
    #[error("expected `place_move <col> <row>`, got {0:?}")]
    WrongArity(String),
    #[error("invalid coordinate {0:?}")]
    InvalidCoordinate(String),
    #[error("coordinates out of bounds: col {col}, row {row}")]
    OutOfBounds { col: usize, row: usize },
}

/// Messages sent from an agent to the referee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentReply {
    /// `place_move <col> <row>`
    PlaceMove(Move),
}

impl AgentReply {
    pub fn into_move(self) -> Move {
        match self {
            AgentReply::PlaceMove(mv) => mv,
        }
    }
}

impl FromStr for AgentReply {
    type Err = ReplyError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let command = tokens.next().ok_or(ReplyError::Empty)?;
        if command != "place_move" {
            return Err(ReplyError::UnknownCommand(command.to_string()));
        }

        let args: Vec<&str> = tokens.collect();
        let [col, row] = args.as_slice() else {
            return Err(ReplyError::WrongArity(line.trim().to_string()));
        };
        let col = parse_coordinate(col)?;
        let row = parse_coordinate(row)?;
        let mv = Move::new(row, col).map_err(|_| ReplyError::OutOfBounds { col, row })?;
        Ok(AgentReply::PlaceMove(mv))
    }
}

fn parse_coordinate(token: &str) -> std::result::Result<usize, ReplyError> {
    token
        .parse::<usize>()
        .map_err(|_| ReplyError::InvalidCoordinate(token.to_string()))
}

impl fmt::Display for AgentReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentReply::PlaceMove(mv) => write!(f, "place_move {} {}", mv.col(), mv.row()),
        }
    }
}
