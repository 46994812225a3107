//! Sync error types.

use infomon_core::InfomonError;
use thiserror::Error;

/// Errors raised while running a sync request.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The end-of-capture marker never arrived. Lines applied before the
    /// deadline stay applied.
    #[error("`{command}` timed out after {waited_ms}ms ({lines_applied} lines applied)")]
    Timeout {
        /// Command that was issued.
        command: String,
        /// How long the request waited.
        waited_ms: u64,
        /// Lines parsed into facts before giving up.
        lines_applied: usize,
    },

    /// The transport refused the command.
    #[error("Failed to issue `{command}`: {source}")]
    Issue {
        /// Command that was issued.
        command: String,
        /// Transport failure.
        #[source]
        source: std::io::Error,
    },

    /// Every transcript sender was dropped mid-request.
    #[error("Transcript closed while waiting for `{0}`")]
    TranscriptClosed(String),

    /// A boundary pattern did not compile.
    #[error("Invalid boundary pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Storage failure while applying captured lines.
    #[error(transparent)]
    Infomon(#[from] InfomonError),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SyncError>;
