//! Configuration for the infomon engine.
//!
//! Maps directly to `infomon.toml`. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{InfomonError, Result};
use crate::parser::DEFAULT_BLOCK_LINE_LIMIT;

/// Environment variable that overrides the default data directory.
pub const DATA_DIR_ENV: &str = "INFOMON_DATA_DIR";

/// File name of the fact database inside the data directory.
pub const DEFAULT_DB_FILE: &str = "infomon.db";

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfomonConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Durable store location and SQLite tuning.
    #[serde(default)]
    pub store: StoreConfig,
    /// Line parser behaviour.
    #[serde(default)]
    pub parser: ParserConfig,
    /// Sync boundary protocol settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl InfomonConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns [`InfomonError::ConfigMalformed`] if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| InfomonError::ConfigMalformed {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })
    }

    /// Load configuration from a TOML file.
    ///
    /// A missing file and an unparsable file are reported as different
    /// errors so the caller can decide whether to fall back to defaults.
    ///
    /// # Errors
    /// [`InfomonError::ConfigMissing`] or [`InfomonError::ConfigMalformed`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(InfomonError::ConfigMissing {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&content).map_err(|e| InfomonError::ConfigMalformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Configuration pointing at an explicit database file.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = Some(path.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file. `None` resolves to `<data dir>/infomon.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Table holding this character's facts.
    #[serde(default = "default_table")]
    pub table: String,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// How long SQLite waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            table: "infomon".to_string(),
            wal_mode: true,
            busy_timeout_ms: 5000,
        }
    }
}

impl StoreConfig {
    /// Resolve the database path, falling back to the data directory.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| data_dir().join(DEFAULT_DB_FILE))
    }
}

/// Line parser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Consecutive unclaimed lines a tabular block tolerates before it is
    /// closed implicitly. Rows reset the count.
    #[serde(default = "default_block_line_limit")]
    pub block_line_limit: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            block_line_limit: DEFAULT_BLOCK_LINE_LIMIT,
        }
    }
}

/// Sync boundary protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How long a request waits for its end-of-capture marker.
    #[serde(default = "default_sync_timeout")]
    pub timeout_ms: u64,
    /// Lines buffered per transcript subscriber before it lags.
    #[serde(default = "default_transcript_capacity")]
    pub transcript_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            transcript_capacity: 1024,
        }
    }
}

/// Directory holding the fact database when no explicit path is configured.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV).map_or_else(|| PathBuf::from("data"), PathBuf::from)
}

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_table() -> String { "infomon".to_string() }
fn default_busy_timeout() -> u32 { 5000 }
fn default_block_line_limit() -> usize { DEFAULT_BLOCK_LINE_LIMIT }
fn default_sync_timeout() -> u64 { 5000 }
fn default_transcript_capacity() -> usize { 1024 }
