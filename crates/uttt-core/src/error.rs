//! Error types for the referee

use thiserror::Error;

/// Result type for referee operations
pub type Result<T> = std::result::Result<T, RefereeError>;

/// Referee error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefereeError {
    /// Missing or invalid launch configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Agent executable missing or failed to start
    #[error("Failed to launch agent {agent}: {reason}")]
    AgentLaunch { agent: String, reason: String },

    /// Agent did not answer within its timebank
    #[error("Agent {agent} timed out: took {elapsed_ms}ms, allowed {allowed_ms}ms")]
    AgentTimeout {
        agent: String,
        elapsed_ms: u64,
        allowed_ms: u64,
    },

    /// Agent sent something that is not a valid reply
    #[error("Protocol error from agent {agent}: {reason}")]
    AgentProtocol { agent: String, reason: String },

    /// Move targets an occupied cell or a sub-board that is not playable
    #[error("Illegal move at row {row}, col {col}: {reason}")]
    IllegalMove { row: usize, col: usize, reason: String },

    /// Coordinates outside the 9x9 field
    #[error("Coordinates out of bounds: row {row}, col {col}")]
    OutOfBounds { row: usize, col: usize },

    /// Move applied after the match already ended
    #[error("Match is already over")]
    MatchOver,

    /// Result queried while the match is still running
    #[error("Match is not finished")]
    NotFinished,

    /// Writing to or flushing an agent's input failed
    #[error("I/O error talking to agent {agent}: {reason}")]
    AgentIo { agent: String, reason: String },
}

impl RefereeError {
    /// True for faults caused by an agent during play, which forfeit the match
    /// for that agent rather than aborting the referee.
    pub fn is_agent_fault(&self) -> bool {
        matches!(
            self,
            RefereeError::AgentTimeout { .. }
                | RefereeError::AgentProtocol { .. }
                | RefereeError::IllegalMove { .. }
                | RefereeError::OutOfBounds { .. }
                | RefereeError::AgentIo { .. }
        )
    }
}
