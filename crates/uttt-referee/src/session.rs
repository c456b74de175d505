//! Launching two agent processes and refereeing one match between them

use crate::agent::{AgentLink, ProcessAgent};
use crate::config::{AgentSpec, MatchConfig};
use crate::diagnostics::{DiagnosticMultiplexer, LogSink};
use crate::orchestrator::{MatchOrchestrator, MatchReport};
use tracing::{error, info, warn};
use uttt_core::Result;

/// Launch both agents, play the match and tear everything down.
///
/// Diagnostic output of both agents is forwarded to `sink` for the whole
/// match. Either agent failing to launch is an error; nothing is sent to the
/// other agent in that case.
pub async fn play_match<S: LogSink>(
    first: &AgentSpec,
    second: &AgentSpec,
    config: MatchConfig,
    sink: S,
) -> Result<MatchReport> {
    config.validate()?;

    let (mut first_agent, first_log) = ProcessAgent::spawn(first, &config)?;
    let (second_agent, second_log) = match ProcessAgent::spawn(second, &config) {
        Ok(launched) => launched,
        Err(e) => {
            error!("{}", e);
            if let Err(shutdown_err) = first_agent.shutdown().await {
                warn!("Shutting down {} failed: {}", first.name, shutdown_err);
            }
            return Err(e);
        }
    };

    let diagnostics = DiagnosticMultiplexer::start(
        [
            (first.name.clone(), first_log),
            (second.name.clone(), second_log),
        ],
        sink,
    );

    let grace = config.shutdown_grace;
    let report = match MatchOrchestrator::new(first_agent, second_agent, config) {
        Ok(orchestrator) => orchestrator.run().await,
        Err(e) => Err(e),
    };

    // The agents have exited, so their diagnostic streams are closing
    diagnostics.finish(grace).await;
    if let Ok(report) = &report {
        info!("{}", report.outcome);
    }
    report
}
