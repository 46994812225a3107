//! Sync requests and the standard request catalogue.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::Result;

/// The game prompt, which ends every command's output.
pub const PROMPT: &str = r"^>";

/// Default wait for the end marker.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// One command to issue and the markers delimiting its output.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Text sent to the game.
    pub command: String,
    /// First line of the response (captured).
    pub start: Regex,
    /// Line after the response (not captured).
    pub end: Regex,
    /// How long to wait for `end`.
    pub timeout: Duration,
}

impl SyncRequest {
    /// Request ending at the prompt with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SyncError::Pattern`] if `start` does not compile.
    pub fn new(command: impl Into<String>, start: &str) -> Result<Self> {
        Ok(Self {
            command: command.into(),
            start: Regex::new(start)?,
            end: Regex::new(PROMPT)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Use a different end marker.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SyncError::Pattern`] if `end` does not compile.
    pub fn with_end(mut self, end: &str) -> Result<Self> {
        self.end = Regex::new(end)?;
        Ok(self)
    }

    /// Use a different timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

const PSM_HEADER: &str = r"^[\w'\-]+, the following .+ are available:|^You (?:do not|don't) have any .+ available";

/// `(command, start marker)` in sync order.
const STANDARD: &[(&str, &str)] = &[
    ("info", r"^\s*Name:\s"),
    ("skill", r"your current skill bonuses and ranks"),
    ("experience", r"^\s*Level:\s+\d+"),
    ("society", r"^Current society status:"),
    ("citizenship", r"^You don't seem|^You currently have .+ in"),
    ("resource", r"^\s*Health:\s+\d+/\d+"),
    ("wealth", r"^You have (?:[\d,]+|no) silver with you\."),
    ("ticket", r"^\s*(?:General|Troubled Waters|Duskruin Arena|Reim|Ebon Gate|Rumor Woods) - |^You have no tickets"),
    ("armor list all", PSM_HEADER),
    ("cman list all", PSM_HEADER),
    ("feat list all", PSM_HEADER),
    ("shield list all", PSM_HEADER),
    ("weapon list all", PSM_HEADER),
    ("ascension list all", PSM_HEADER),
    (
        "warcry",
        r"^You have learned the following War Cries:|^You must be an active member of the Warrior Guild to use this skill",
    ),
];

static STANDARD_REQUESTS: LazyLock<Vec<SyncRequest>> = LazyLock::new(|| {
    STANDARD
        .iter()
        .map(|(command, start)| {
            SyncRequest::new(*command, start).expect("standard sync pattern must compile")
        })
        .collect()
});

/// The full-character sync, in order, each waiting up to `timeout`.
#[must_use]
pub fn standard_requests(timeout: Duration) -> Vec<SyncRequest> {
    STANDARD_REQUESTS
        .iter()
        .cloned()
        .map(|request| request.with_timeout(timeout))
        .collect()
}
