//! Request/response sessions that feed delimited output to the parser.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use infomon_core::{Infomon, ParseOutcome};
use tokio::sync::{Mutex, broadcast::error::RecvError};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::request::{SyncRequest, standard_requests};
use crate::transcript::Transcript;
use crate::window::{Feed, Window};

/// Sends a command to the game.
pub trait CommandSink: Send + Sync {
    /// Issue `command`. The response arrives on the transcript.
    ///
    /// # Errors
    ///
    /// Any transport failure.
    fn issue(&self, command: &str) -> io::Result<()>;
}

/// Counters for one completed request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Command that was issued.
    pub command: String,
    /// Lines inside the window.
    pub lines_seen: usize,
    /// Lines a shape claimed.
    pub lines_applied: usize,
    /// Lines no shape claimed.
    pub noops: usize,
    /// Lines the transcript dropped because this request fell behind.
    pub lines_lagged: u64,
}

/// Outcome of one command in a full sync.
#[derive(Debug)]
pub struct CommandResult {
    /// Command that was issued.
    pub command: String,
    /// Its report or failure.
    pub outcome: Result<SyncReport>,
}

/// Serialised command/response driver for one character.
pub struct SyncSession<S> {
    infomon: Arc<Infomon>,
    transcript: Transcript,
    sink: S,
    turn: Mutex<()>,
    timeout: Duration,
}

impl<S: CommandSink> SyncSession<S> {
    /// Session using the engine's configured sync timeout.
    pub fn new(infomon: Arc<Infomon>, transcript: Transcript, sink: S) -> Self {
        let timeout = Duration::from_millis(infomon.config().sync.timeout_ms);
        Self {
            infomon,
            transcript,
            sink,
            turn: Mutex::new(()),
            timeout,
        }
    }

    /// The engine facts are written to.
    #[must_use]
    pub fn infomon(&self) -> &Arc<Infomon> {
        &self.infomon
    }

    /// Issue one request and parse its response.
    ///
    /// Requests on one session never overlap. The transcript is subscribed
    /// before the command goes out, so no response line can be missed.
    ///
    /// # Errors
    ///
    /// [`SyncError::Timeout`] if the end marker does not arrive in time (lines
    /// already applied are kept), [`SyncError::Issue`] if the transport
    /// refuses the command, and storage failures from the parser.
    pub async fn request(&self, request: &SyncRequest) -> Result<SyncReport> {
        let _turn = self.turn.lock().await;
        let mut lines = self.transcript.subscribe();

        self.sink
            .issue(&request.command)
            .map_err(|source| SyncError::Issue {
                command: request.command.clone(),
                source,
            })?;
        debug!(command = %request.command, "Sync command issued");

        let started = Instant::now();
        let deadline = started + request.timeout;
        let mut window = Window::new(&request.start, &request.end);
        let mut report = SyncReport {
            command: request.command.clone(),
            ..SyncReport::default()
        };

        loop {
            let line = match timeout_at(deadline, lines.recv()).await {
                Ok(Ok(line)) => line,
                Ok(Err(RecvError::Lagged(skipped))) => {
                    warn!(command = %request.command, skipped, "Transcript lagged");
                    report.lines_lagged += skipped;
                    continue;
                }
                Ok(Err(RecvError::Closed)) => {
                    return Err(SyncError::TranscriptClosed(request.command.clone()));
                }
                Err(_) => {
                    let waited_ms =
                        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    warn!(
                        command = %request.command,
                        waited_ms,
                        lines_applied = report.lines_applied,
                        "Sync window timed out"
                    );
                    return Err(SyncError::Timeout {
                        command: request.command.clone(),
                        waited_ms,
                        lines_applied: report.lines_applied,
                    });
                }
            };

            match window.feed(&line) {
                Feed::Skip => {}
                Feed::Capture => {
                    report.lines_seen += 1;
                    match self.infomon.parse(&line)? {
                        ParseOutcome::Ok { .. } => report.lines_applied += 1,
                        ParseOutcome::Noop => report.noops += 1,
                    }
                }
                Feed::Close => {
                    debug!(
                        command = %report.command,
                        lines = report.lines_seen,
                        applied = report.lines_applied,
                        "Sync window closed"
                    );
                    return Ok(report);
                }
            }
        }
    }

    /// Run the standard catalogue in order. A failed command is recorded and
    /// the rest still run.
    pub async fn sync_all(&self) -> Vec<CommandResult> {
        info!("Infomon sync requested");
        let mut results = Vec::new();
        for request in standard_requests(self.timeout) {
            let outcome = self.request(&request).await;
            if let Err(e) = &outcome {
                warn!(command = %request.command, error = %e, "Sync command failed");
            }
            results.push(CommandResult {
                command: request.command,
                outcome,
            });
        }
        let failed = results.iter().filter(|r| r.outcome.is_err()).count();
        info!(commands = results.len(), failed, "Infomon sync complete");
        results
    }

    /// Wipe every fact, then run a full sync.
    ///
    /// # Errors
    ///
    /// Only the reset can fail here; command failures are reported per
    /// command.
    pub async fn redo(&self) -> Result<Vec<CommandResult>> {
        info!("Infomon full reset requested");
        self.infomon.reset()?;
        Ok(self.sync_all().await)
    }
}

impl<S> std::fmt::Debug for SyncSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("timeout", &self.timeout)
            .field("subscribers", &self.transcript.subscribers())
            .finish_non_exhaustive()
    }
}
