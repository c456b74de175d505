//! Agent links: the line-oriented channel to one agent program
//!
//! [`AgentLink`] is what the orchestrator talks to. [`LineAgent`] implements
//! it over any reader/writer pair and [`ProcessAgent`] wraps a spawned child
//! process around a `LineAgent` on its stdin/stdout.

use crate::config::{AgentSpec, MatchConfig};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uttt_core::{RefereeError, Result};

/// Longest reply line accepted from an agent, terminator included
pub const MAX_LINE_BYTES: usize = 1024;

/// What a bounded read produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line, without its terminator
    Line(String),
    /// The agent closed its output
    Closed,
    /// The deadline passed first; the read was abandoned
    TimedOut,
}

/// Line channel to one agent
#[async_trait]
pub trait AgentLink: Send {
    /// Name used in logs and announced to the agents
    fn name(&self) -> &str;

    /// Write one line (a newline is appended) and flush
    async fn send_line(&mut self, line: &str) -> Result<()>;

    /// Wait for the next line for at most `deadline`
    async fn read_line(&mut self, deadline: Duration) -> Result<ReadOutcome>;

    /// Close the agent's input and release its resources. Safe to call twice.
    async fn shutdown(&mut self) -> Result<()>;
}

/// [`AgentLink`] over an arbitrary reader/writer pair
pub struct LineAgent<R, W> {
    name: String,
    reader: BufReader<R>,
    writer: Option<W>,
    send_timeout: Duration,
    /// Bytes of a line whose read was cut short by a deadline
    pending: Vec<u8>,
}

impl<R, W> LineAgent<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(name: impl Into<String>, reader: R, writer: W, send_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            reader: BufReader::new(reader),
            writer: Some(writer),
            send_timeout,
            pending: Vec::new(),
        }
    }

    fn io_error(&self, reason: impl Into<String>) -> RefereeError {
        RefereeError::AgentIo {
            agent: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn take_line(&mut self) -> String {
        let bytes = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&bytes);
        line.trim_end_matches(['\n', '\r']).to_string()
    }
}

#[async_trait]
impl<R, W> AgentLink for LineAgent<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        debug!("[Referee→{}] {}", self.name, line);
        let send_timeout = self.send_timeout;
        let Some(writer) = self.writer.as_mut() else {
            return Err(self.io_error("input already closed"));
        };

        let write = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        };
        match timeout(send_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(self.io_error(format!("write failed: {}", e))),
            Err(_) => Err(self.io_error(format!(
                "write blocked for more than {}ms",
                send_timeout.as_millis()
            ))),
        }
    }

    async fn read_line(&mut self, deadline: Duration) -> Result<ReadOutcome> {
        let budget = MAX_LINE_BYTES.saturating_sub(self.pending.len()) as u64;
        // `read_until` keeps partial input in `pending` if the deadline cancels it
        let mut limited = (&mut self.reader).take(budget);
        let read = timeout(deadline, limited.read_until(b'\n', &mut self.pending)).await;
        match read {
            Err(_) => Ok(ReadOutcome::TimedOut),
            Ok(Err(e)) => Err(self.io_error(format!("read failed: {}", e))),
            Ok(Ok(0)) if self.pending.is_empty() => Ok(ReadOutcome::Closed),
            Ok(Ok(_))
                if self.pending.len() >= MAX_LINE_BYTES && !self.pending.ends_with(b"\n") =>
            {
                self.pending.clear();
                Err(RefereeError::AgentProtocol {
                    agent: self.name.clone(),
                    reason: format!("line longer than {} bytes", MAX_LINE_BYTES),
                })
            }
            Ok(Ok(_)) => {
                let line = self.take_line();
                debug!("[{}→Referee] {}", self.name, line);
                Ok(ReadOutcome::Line(line))
            }
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            // The agent sees EOF on its input once the writer is dropped
            if let Err(e) = writer.shutdown().await {
                debug!("Closing input of {} failed: {}", self.name, e);
            }
        }
        Ok(())
    }
}

/// An agent running as a child process
pub struct ProcessAgent {
    child: Child,
    link: LineAgent<ChildStdout, ChildStdin>,
    shutdown_grace: Duration,
}

impl ProcessAgent {
    /// Launch the agent with piped stdio.
    ///
    /// Returns the agent together with its diagnostic (stderr) stream.
    pub fn spawn(spec: &AgentSpec, config: &MatchConfig) -> Result<(Self, ChildStderr)> {
        let launch_error = |reason: String| RefereeError::AgentLaunch {
            agent: spec.name.clone(),
            reason,
        };

        let mut child = Command::new(&spec.path)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| launch_error(format!("{}: {}", spec.path.display(), e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| launch_error("no stdin pipe".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| launch_error("no stdout pipe".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| launch_error("no stderr pipe".into()))?;

        info!("Launched {} (pid {:?})", spec.name, child.id());

        let agent = Self {
            child,
            link: LineAgent::new(spec.name.clone(), stdout, stdin, config.send_timeout),
            shutdown_grace: config.shutdown_grace,
        };
        Ok((agent, stderr))
    }
}

#[async_trait]
impl AgentLink for ProcessAgent {
    fn name(&self) -> &str {
        self.link.name()
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        self.link.send_line(line).await
    }

    async fn read_line(&mut self, deadline: Duration) -> Result<ReadOutcome> {
        self.link.read_line(deadline).await
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.link.shutdown().await?;

        match timeout(self.shutdown_grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!("{} exited with {}", self.link.name(), status);
                Ok(())
            }
            Ok(Err(e)) => Err(RefereeError::AgentIo {
                agent: self.link.name().to_string(),
                reason: format!("wait failed: {}", e),
            }),
            Err(_) => {
                warn!(
                    "{} still running {}ms after its input closed, killing it",
                    self.link.name(),
                    self.shutdown_grace.as_millis()
                );
                self.child.kill().await.map_err(|e| RefereeError::AgentIo {
                    agent: self.link.name().to_string(),
                    reason: format!("kill failed: {}", e),
                })
            }
        }
    }
}
