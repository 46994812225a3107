//! Error types for the infomon core library.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all infomon store and configuration operations.
///
/// Parser conditions (unmatched or malformed lines) never show up here; they
/// are absorbed by the parser and reported as [`crate::ParseOutcome::Noop`].
#[derive(Error, Debug)]
pub enum InfomonError {
    /// The backing database could not be created or opened.
    #[error("Fact store unavailable at {}: {source}", path.display())]
    StoreUnavailable {
        /// Where the store was expected.
        path: PathBuf,
        /// Underlying SQLite failure.
        #[source]
        source: rusqlite::Error,
    },

    /// The file exists but is not a usable database.
    #[error("Fact store at {} is not a valid database", path.display())]
    StoreCorrupt {
        /// Offending file.
        path: PathBuf,
    },

    /// A table name that cannot safely be used as an SQL identifier.
    #[error("Invalid fact table name: {0:?}")]
    InvalidTable(String),

    /// A key that does not follow the dotted lowercase schema.
    #[error("Invalid fact key: {0:?}")]
    InvalidKey(String),

    /// SQLite failure after the store was opened.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A configuration file that does not exist.
    #[error("Configuration file not found: {}", path.display())]
    ConfigMissing {
        /// Requested file.
        path: PathBuf,
    },

    /// A configuration file that exists but cannot be parsed.
    #[error("Malformed configuration in {}: {reason}", path.display())]
    ConfigMalformed {
        /// Offending file (or `<inline>` for strings).
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Serialization failure in the diagnostic dump.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, InfomonError>;
