//! Shared, continuously appended feed of game output lines.

use infomon_core::config::SyncConfig;
use tokio::sync::broadcast;

/// Fan-out line feed. The transport pushes; sync requests subscribe.
///
/// Cloning is cheap and every clone feeds the same subscribers.
#[derive(Debug, Clone)]
pub struct Transcript {
    tx: broadcast::Sender<String>,
}

impl Transcript {
    /// Feed buffering up to `capacity` lines per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Feed sized from the sync settings.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.transcript_capacity)
    }

    /// Append one line. Returns how many subscribers will see it; a line
    /// nobody is listening for is simply dropped.
    pub fn push(&self, line: impl Into<String>) -> usize {
        self.tx.send(line.into()).unwrap_or(0)
    }

    /// Start receiving every line pushed from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscribers(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lines_before_subscribe_are_not_seen() {
        let transcript = Transcript::new(8);
        assert_eq!(transcript.push("early"), 0);

        let mut rx = transcript.subscribe();
        assert_eq!(transcript.push("late"), 1);
        assert_eq!(rx.recv().await.expect("line"), "late");
    }

    #[tokio::test]
    async fn clones_share_subscribers() {
        let transcript = Transcript::new(8);
        let feeder = transcript.clone();
        let mut rx = transcript.subscribe();
        feeder.push(">");
        assert_eq!(rx.recv().await.expect("line"), ">");
        assert_eq!(feeder.subscribers(), 1);
    }
}
