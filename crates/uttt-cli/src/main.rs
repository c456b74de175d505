//! Ultimate tic-tac-toe referee
//!
//! Launches two agent executables, plays one match over their stdin/stdout
//! and prints the result. Diagnostics (the referee's and the agents' stderr)
//! go to stderr; stdout carries only the result.
//!
//! Exit status: 0 for a completed match, 2 when an agent forfeits, 1 for
//! configuration, launch or referee errors.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uttt_referee::{TracingSink, play_match};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit with ERROR_EXIT, never the forfeit status
            e.print()?;
            return Ok(ExitCode::from(cli::parse_exit_code(&e)));
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("Invalid log level: {}", cli.log_level))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (first, second) = cli.agents();
    info!(
        "Referee starting: {} vs {}",
        first.path.display(),
        second.path.display()
    );

    let report = match play_match(&first, &second, cli.match_config(), TracingSink).await {
        Ok(report) => report,
        Err(e) => {
            error!("Match aborted: {}", e);
            return Err(e.into());
        }
    };

    println!("{}", report.outcome);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(ExitCode::from(cli::outcome_exit_code(&report.outcome)))
}
