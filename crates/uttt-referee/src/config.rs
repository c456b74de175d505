//! Match and agent configuration

use std::path::PathBuf;
use std::time::Duration;
use uttt_core::{RefereeError, Result};

/// Timing rules for a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Cap and starting value of each agent's timebank
    pub max_timebank: Duration,
    /// Added to the acting agent's timebank before every move request
    pub time_per_move: Duration,
    /// How long a write to an agent may block before the agent is faulted
    pub send_timeout: Duration,
    /// How long an agent gets to exit after its input closes before it is killed
    pub shutdown_grace: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_timebank: Duration::from_secs(10),
            time_per_move: Duration::from_millis(500),
            send_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(1),
        }
    }
}

impl MatchConfig {
    pub fn with_max_timebank(mut self, max_timebank: Duration) -> Self {
        self.max_timebank = max_timebank;
        self
    }

    pub fn with_time_per_move(mut self, time_per_move: Duration) -> Self {
        self.time_per_move = time_per_move;
        self
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, shutdown_grace: Duration) -> Self {
        self.shutdown_grace = shutdown_grace;
        self
    }

    /// Reject timing rules no match could be played under
    pub fn validate(&self) -> Result<()> {
        if self.max_timebank.is_zero() {
            return Err(RefereeError::Configuration(
                "timebank must be greater than zero".into(),
            ));
        }
        if self.time_per_move > self.max_timebank {
            return Err(RefereeError::Configuration(format!(
                "time per move ({}ms) exceeds the timebank ({}ms)",
                self.time_per_move.as_millis(),
                self.max_timebank.as_millis()
            )));
        }
        if self.send_timeout.is_zero() {
            return Err(RefereeError::Configuration(
                "send timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// How to launch one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    /// Executable to run
    pub path: PathBuf,
    /// Extra command-line arguments
    pub args: Vec<String>,
    /// Name announced to both agents and used in logs
    pub name: String,
}

impl AgentSpec {
    /// Agent named after its path as given
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            path,
            args: Vec::new(),
            name,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatchConfig::default();
        assert_eq!(config.max_timebank, Duration::from_millis(10000));
        assert_eq!(config.time_per_move, Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let zero = MatchConfig::default().with_max_timebank(Duration::ZERO);
        assert!(matches!(
            zero.validate(),
            Err(RefereeError::Configuration(_))
        ));

        let increment_too_large = MatchConfig::default()
            .with_max_timebank(Duration::from_millis(400))
            .with_time_per_move(Duration::from_millis(500));
        assert!(increment_too_large.validate().is_err());

        let no_send_budget = MatchConfig::default().with_send_timeout(Duration::ZERO);
        assert!(no_send_budget.validate().is_err());
    }

    #[test]
    fn test_agent_spec_name_defaults_to_path() {
        let spec = AgentSpec::new("./bots/random");
        assert_eq!(spec.name, "./bots/random");
        assert!(spec.args.is_empty());

        let spec = spec.with_name("random").with_args(["--seed", "7"]);
        assert_eq!(spec.name, "random");
        assert_eq!(spec.args, vec!["--seed".to_string(), "7".to_string()]);
    }
}
