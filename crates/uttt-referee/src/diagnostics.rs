//! Merges the agents' diagnostic streams into one log
//!
//! One reader task per agent pushes prefixed lines into a bounded queue and
//! a single forwarder task drains it into a [`LogSink`]. The queue closes
//! once every reader has finished, which ends the forwarder.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Pending lines the queue holds before readers wait
pub const QUEUE_CAPACITY: usize = 10;

/// Destination for merged diagnostic lines
pub trait LogSink: Send + 'static {
    fn log_line(&mut self, line: String);
}

/// Emits each line as a tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log_line(&mut self, line: String) {
        info!(target: "uttt::agent_log", "{}", line);
    }
}

#[cfg(test)]
impl LogSink for mpsc::UnboundedSender<String> {
    fn log_line(&mut self, line: String) {
        if self.send(line).is_err() {
            debug!("Diagnostic line dropped, receiver closed");
        }
    }
}

/// Running reader and forwarder tasks for one match
pub struct DiagnosticMultiplexer {
    shutdown_tx: watch::Sender<bool>,
    readers: JoinSet<()>,
    forwarder: JoinHandle<()>,
}

impl DiagnosticMultiplexer {
    /// Start one reader per `(agent name, stream)` pair and the forwarder
    pub fn start<R, S, I>(sources: I, sink: S) -> Self
    where
        I: IntoIterator<Item = (String, R)>,
        R: AsyncRead + Unpin + Send + 'static,
        S: LogSink,
    {
        let (line_tx, line_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (shutdown_tx, _) = watch::channel(false);

        let mut readers = JoinSet::new();
        for (name, stream) in sources {
            readers.spawn(drain(
                name,
                stream,
                line_tx.clone(),
                shutdown_tx.subscribe(),
            ));
        }
        // Only the readers hold senders now
        drop(line_tx);

        let forwarder = tokio::spawn(forward(line_rx, sink));

        Self {
            shutdown_tx,
            readers,
            forwarder,
        }
    }

    /// Wait for every stream to reach end-of-stream and the queue to drain
    pub async fn join(mut self) {
        while let Some(result) = self.readers.join_next().await {
            if let Err(e) = result {
                warn!("Diagnostic reader task failed: {}", e);
            }
        }
        self.join_forwarder().await;
    }

    /// Stop reading now, then wait for queued lines to be delivered
    pub async fn shutdown(self) {
        self.shutdown_tx.send_replace(true);
        self.join().await;
    }

    /// Give the streams `grace` to close on their own, then shut down
    pub async fn finish(mut self, grace: Duration) {
        let drained = timeout(grace, async {
            while let Some(result) = self.readers.join_next().await {
                if let Err(e) = result {
                    warn!("Diagnostic reader task failed: {}", e);
                }
            }
        })
        .await;
        if drained.is_err() {
            debug!("Diagnostic streams still open after {}ms", grace.as_millis());
        }
        self.shutdown().await;
    }

    async fn join_forwarder(self) {
        if let Err(e) = self.forwarder.await {
            warn!("Diagnostic forwarder task failed: {}", e);
        }
    }
}

async fn drain<R>(
    name: String,
    stream: R,
    line_tx: mpsc::Sender<String>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    R: AsyncRead + Unpin + Send,
{
    let prefix = format!("{} log: ", name);
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        tokio::select! {
            // Drop the channel guard before the arm runs
            _ = async { shutdown_rx.wait_for(|stop| *stop).await.map(|_| ()) } => {
                debug!("Diagnostic reader for {} stopped", name);
                break;
            }
            read = reader.read_until(b'\n', &mut buf) => match read {
                Ok(0) => {
                    debug!("Diagnostic stream of {} closed", name);
                    break;
                }
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    let line = format!("{}{}", prefix, text.trim_end_matches(['\n', '\r']));
                    if line_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Reading diagnostics of {} failed: {}", name, e);
                    break;
                }
            }
        }
    }
}

async fn forward<S: LogSink>(mut line_rx: mpsc::Receiver<String>, mut sink: S) {
    while let Some(line) = line_rx.recv().await {
        sink.log_line(line);
    }
}
