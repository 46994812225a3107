//! Capture window over a line stream: waits for a start marker, captures
//! until an end marker.
//!
//! The start line belongs to the response (it is usually the first line of
//! the command output and often carries data). The end marker, normally the
//! prompt, does not.

use regex::Regex;

/// Where the window is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Ignoring lines until the start marker.
    AwaitingStart,
    /// Passing lines through.
    Capturing,
    /// End marker seen; nothing more is captured.
    Closed,
}

/// What to do with a fed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// Not part of the response.
    Skip,
    /// Part of the response.
    Capture,
    /// End marker; the response is complete.
    Close,
}

/// Start/end delimited capture state machine.
#[derive(Debug)]
pub struct Window<'a> {
    start: &'a Regex,
    end: &'a Regex,
    state: WindowState,
}

impl<'a> Window<'a> {
    /// A window awaiting `start`.
    #[must_use]
    pub fn new(start: &'a Regex, end: &'a Regex) -> Self {
        Self {
            start,
            end,
            state: WindowState::AwaitingStart,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Classify the next line and advance.
    pub fn feed(&mut self, line: &str) -> Feed {
        match self.state {
            WindowState::AwaitingStart if self.start.is_match(line) => {
                self.state = WindowState::Capturing;
                Feed::Capture
            }
            WindowState::AwaitingStart | WindowState::Closed => Feed::Skip,
            WindowState::Capturing if self.end.is_match(line) => {
                self.state = WindowState::Closed;
                Feed::Close
            }
            WindowState::Capturing => Feed::Capture,
        }
    }
}
