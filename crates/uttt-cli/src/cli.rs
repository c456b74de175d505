//! Command-line interface for the referee.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use uttt_referee::{AgentSpec, MatchConfig, MatchOutcome};

/// Exit status for configuration, launch and referee errors, usage errors included
pub const ERROR_EXIT: u8 = 1;
/// Exit status when an agent forfeited
pub const FORFEIT_EXIT: u8 = 2;

/// Ultimate tic-tac-toe referee - plays one match between two agent programs
#[derive(Parser, Debug)]
#[command(name = "uttt-referee")]
#[command(about = "Referee an ultimate tic-tac-toe match between two agent executables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Executable playing as player 1
    #[arg(long)]
    pub player1: PathBuf,

    /// Executable playing as player 2
    #[arg(long)]
    pub player2: PathBuf,

    /// Maximum timebank per agent, in milliseconds
    #[arg(long, default_value = "10000")]
    pub timebank_ms: u64,

    /// Time added to an agent's timebank before each of its moves, in milliseconds
    #[arg(long, default_value = "500")]
    pub time_per_move_ms: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the match report as JSON after the result line
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig::default()
            .with_max_timebank(Duration::from_millis(self.timebank_ms))
            .with_time_per_move(Duration::from_millis(self.time_per_move_ms))
    }

    pub fn agents(&self) -> (AgentSpec, AgentSpec) {
        (AgentSpec::new(&self.player1), AgentSpec::new(&self.player2))
    }
}

/// Exit status after a failed parse: 0 for `--help`/`--version`, otherwise an error
pub fn parse_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() { ERROR_EXIT } else { 0 }
}

/// Exit status for a match that ran to an outcome
pub fn outcome_exit_code(outcome: &MatchOutcome) -> u8 {
    if outcome.is_forfeit() { FORFEIT_EXIT } else { 0 }
}
