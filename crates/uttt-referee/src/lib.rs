//! # uttt-referee
//!
//! Referee for ultimate tic-tac-toe matches between two agent programs.
//!
//! This crate provides:
//! - `AgentLink` and its process-backed implementation
//! - Timebank accounting
//! - The diagnostic stream multiplexer
//! - `MatchOrchestrator`, the turn loop and line protocol driver
//! - `play_match`, which wires the pieces together for two executables

pub mod agent;
pub mod config;
pub mod diagnostics;
pub mod orchestrator;
pub mod session;
pub mod timebank;

pub use agent::{AgentLink, LineAgent, ProcessAgent, ReadOutcome};
pub use config::{AgentSpec, MatchConfig};
pub use diagnostics::{DiagnosticMultiplexer, LogSink, TracingSink};
pub use orchestrator::{MatchOrchestrator, MatchOutcome, MatchReport, PlayedMove};
pub use session::play_match;
pub use timebank::Timebank;
