//! # infomon-sync
//!
//! Drives on-demand syncs: issue a game command, capture its output between
//! a start marker and the next prompt, and feed each captured line to
//! [`Infomon::parse`](infomon_core::Infomon::parse).
//!
//! The transport is outside this crate. It pushes every received line into
//! a [`Transcript`] and implements [`CommandSink`] to send commands.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod request;
pub mod session;
pub mod transcript;
pub mod window;

pub use error::{Result, SyncError};
pub use request::{SyncRequest, standard_requests};
pub use session::{CommandResult, CommandSink, SyncReport, SyncSession};
pub use transcript::Transcript;
pub use window::{Feed, Window, WindowState};
