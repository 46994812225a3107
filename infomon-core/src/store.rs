//! SQLite-backed durable store for facts.
//!
//! One table per character, one row per fact:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS "<table>" (
//!     key        TEXT PRIMARY KEY NOT NULL,
//!     value               NOT NULL,
//!     updated_at TEXT NOT NULL
//! );
//! ```
//!
//! The `value` column is left untyped so integers and strings round-trip as
//! themselves. Writes are single-statement upserts, which keeps two threads
//! racing to create the same key from colliding on the primary key.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, params};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{InfomonError, Result};
use crate::keys::FactValue;

/// Pre-rendered SQL for one fact table.
#[derive(Debug)]
struct Statements {
    create: String,
    exists: &'static str,
    get: String,
    upsert: String,
    delete: String,
    clear: String,
    entries: String,
    count: String,
}

impl Statements {
    fn for_table(table: &str) -> Self {
        Self {
            create: format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (
                    key        TEXT PRIMARY KEY NOT NULL,
                    value               NOT NULL,
                    updated_at TEXT NOT NULL
                );"
            ),
            exists: "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            get: format!("SELECT value FROM \"{table}\" WHERE key = ?1"),
            upsert: format!(
                "INSERT INTO \"{table}\" (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at"
            ),
            delete: format!("DELETE FROM \"{table}\" WHERE key = ?1"),
            clear: format!("DELETE FROM \"{table}\""),
            entries: format!("SELECT key, value FROM \"{table}\" ORDER BY key"),
            count: format!("SELECT COUNT(*) FROM \"{table}\""),
        }
    }
}

/// Handle to the durable fact table.
///
/// The connection sits behind a mutex, so one `FactStore` can be shared by
/// every thread through an `Arc`.
///
/// ```no_run
/// # use infomon_core::store::FactStore;
/// # use infomon_core::config::StoreConfig;
/// let store = FactStore::open(&StoreConfig::default())?;
/// store.setup()?;
/// store.set("stat.influence", &30.into())?;
/// assert_eq!(store.get("stat.influence")?, Some(30.into()));
/// # Ok::<(), infomon_core::InfomonError>(())
/// ```
pub struct FactStore {
    conn: Mutex<Connection>,
    table: String,
    sql: Statements,
    db_path: PathBuf,
}

impl std::fmt::Debug for FactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactStore")
            .field("db_path", &self.db_path)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl FactStore {
    /// Open (or create) the database file named by `config`.
    ///
    /// This only connects; call [`FactStore::setup`] to create the table.
    ///
    /// # Errors
    ///
    /// [`InfomonError::StoreUnavailable`] if the file cannot be created or
    /// opened, [`InfomonError::StoreCorrupt`] if it is not a database, and
    /// [`InfomonError::InvalidTable`] for an unusable table name.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let db_path = config.resolved_path();
        validate_table(&config.table)?;

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags).map_err(|source| {
            InfomonError::StoreUnavailable {
                path: db_path.clone(),
                source,
            }
        })?;

        let pragmas = if config.wal_mode {
            "PRAGMA journal_mode = WAL;"
        } else {
            "PRAGMA journal_mode = DELETE;"
        };
        conn.execute_batch(pragmas)
            .and_then(|()| conn.execute_batch("PRAGMA synchronous = NORMAL;"))
            .and_then(|()| {
                conn.execute_batch(&format!(
                    "PRAGMA busy_timeout = {};",
                    config.busy_timeout_ms
                ))
            })
            .map_err(|e| classify_open_error(&db_path, e))?;

        info!(
            path = %db_path.display(),
            table = %config.table,
            wal = config.wal_mode,
            "Fact store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            sql: Statements::for_table(&config.table),
            table: config.table.clone(),
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::StoreUnavailable`] on SQLite failures.
    pub fn open_in_memory(table: &str) -> Result<Self> {
        validate_table(table)?;
        let conn = Connection::open_in_memory().map_err(|source| {
            InfomonError::StoreUnavailable {
                path: PathBuf::from(":memory:"),
                source,
            }
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
            sql: Statements::for_table(table),
            table: table.to_string(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create the fact table. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::StoreCorrupt`] if the file turns out not to
    /// be a database, [`InfomonError::Database`] otherwise.
    pub fn setup(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(&self.sql.create)
            .map_err(|e| classify_open_error(&self.db_path, e))?;
        debug!(table = %self.table, "Fact table ready");
        Ok(())
    }

    /// Whether the fact table has been created.
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::Database`] on SQLite failures.
    pub fn exists(&self) -> Result<bool> {
        let conn = self.conn.lock();
        let found = conn
            .prepare_cached(self.sql.exists)?
            .query_row(params![self.table], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    // ------------------------------------------------------------------
    // Core CRUD
    // ------------------------------------------------------------------

    /// Read one fact.
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::Database`] on SQLite failures.
    pub fn get(&self, key: &str) -> Result<Option<FactValue>> {
        let conn = self.conn.lock();
        let value = conn
            .prepare_cached(&self.sql.get)?
            .query_row(params![key], |row| row.get::<_, FactValue>(0))
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite one fact in a single statement.
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::Database`] on SQLite failures.
    pub fn set(&self, key: &str, value: &FactValue) -> Result<()> {
        let start = Instant::now();
        let now = Utc::now().to_rfc3339();
        {
            let conn = self.conn.lock();
            conn.prepare_cached(&self.sql.upsert)?
                .execute(params![key, value, now])?;
        }
        debug!(
            key,
            value = %value,
            elapsed_us = start.elapsed().as_micros(),
            "Stored fact"
        );
        Ok(())
    }

    /// Remove one fact. Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::Database`] on SQLite failures.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn.prepare_cached(&self.sql.delete)?.execute(params![key])?;
        Ok(deleted > 0)
    }

    /// Remove every fact, leaving the (empty) table in place.
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::Database`] on SQLite failures.
    pub fn clear_all(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute(&self.sql.clear, [])?;
        info!(table = %self.table, removed, "Fact table cleared");
        Ok(removed)
    }

    /// Every `(key, value)` row, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::Database`] on SQLite failures.
    pub fn entries(&self) -> Result<Vec<(String, FactValue)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&self.sql.entries)?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Number of stored facts.
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::Database`] on SQLite failures.
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(&self.sql.count, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Whether the table holds no facts.
    ///
    /// # Errors
    ///
    /// Returns [`InfomonError::Database`] on SQLite failures.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Name of the fact table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }
}

fn validate_table(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(InfomonError::InvalidTable(table.to_string()))
    }
}

fn classify_open_error(path: &Path, err: rusqlite::Error) -> InfomonError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::NotADatabase => {
            InfomonError::StoreCorrupt {
                path: path.to_path_buf(),
            }
        }
        other => InfomonError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FactStore {
        let store = FactStore::open_in_memory("testing").expect("open");
        store.setup().expect("setup");
        store
    }

    #[test]
    fn upsert_inserts_then_overwrites() {
        let store = store();
        store.set("stat.influence", &30.into()).expect("set");
        assert_eq!(store.get("stat.influence").expect("get"), Some(30.into()));
        store.set("stat.influence", &40.into()).expect("set again");
        assert_eq!(store.get("stat.influence").expect("get"), Some(40.into()));
        assert_eq!(store.len().expect("len"), 1);
    }

    #[test]
    fn text_and_int_keep_their_types() {
        let store = store();
        store.set("society.status", &"Order of Voln".into()).expect("set");
        store.set("society.rank", &13.into()).expect("set");
        assert_eq!(
            store.get("society.status").expect("get"),
            Some(FactValue::Text("Order of Voln".into()))
        );
        assert_eq!(store.get("society.rank").expect("get"), Some(FactValue::Int(13)));
    }

    #[test]
    fn absent_key_is_none_not_zero() {
        let store = store();
        assert_eq!(store.get("currency.silver").expect("get"), None);
        store.set("currency.silver", &0.into()).expect("set");
        assert_eq!(store.get("currency.silver").expect("get"), Some(0.into()));
    }

    #[test]
    fn delete_reports_whether_a_row_went_away() {
        let store = store();
        store.set("weapon.pummel", &5.into()).expect("set");
        assert!(store.delete("weapon.pummel").expect("delete"));
        assert!(!store.delete("weapon.pummel").expect("delete again"));
        assert_eq!(store.get("weapon.pummel").expect("get"), None);
    }

    #[test]
    fn setup_is_idempotent_and_clear_keeps_table() {
        let store = FactStore::open_in_memory("testing").expect("open");
        assert!(!store.exists().expect("exists"));
        store.setup().expect("setup");
        store.setup().expect("setup twice");
        assert!(store.exists().expect("exists"));

        store.set("a.b", &1.into()).expect("set");
        store.set("a.c", &2.into()).expect("set");
        assert_eq!(store.clear_all().expect("clear"), 2);
        assert!(store.exists().expect("exists after clear"));
        assert!(store.is_empty().expect("empty"));
    }

    #[test]
    fn entries_are_sorted_by_key() {
        let store = store();
        store.set("stat.wisdom", &84.into()).expect("set");
        store.set("cman.krynch", &1.into()).expect("set");
        store.set("society.status", &"None".into()).expect("set");
        let keys: Vec<String> = store
            .entries()
            .expect("entries")
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["cman.krynch", "society.status", "stat.wisdom"]);
    }

    #[test]
    fn rejects_unsafe_table_names() {
        assert!(matches!(
            FactStore::open_in_memory("x\"; DROP TABLE y; --"),
            Err(InfomonError::InvalidTable(_))
        ));
        assert!(matches!(
            FactStore::open_in_memory("9lives"),
            Err(InfomonError::InvalidTable(_))
        ));
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StoreConfig {
            path: Some(dir.path().join("nested").join("infomon.db")),
            ..StoreConfig::default()
        };

        {
            let store = FactStore::open(&config).expect("open");
            store.setup().expect("setup");
            store.set("citizenship", &"Wehnimer's Landing".into()).expect("set");
        }

        let reopened = FactStore::open(&config).expect("reopen");
        reopened.setup().expect("setup");
        assert_eq!(
            reopened.get("citizenship").expect("get"),
            Some("Wehnimer's Landing".into())
        );
    }

    #[test]
    fn garbage_file_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("infomon.db");
        std::fs::write(&path, vec![0x5a_u8; 4096]).expect("write garbage");

        let config = StoreConfig {
            path: Some(path),
            wal_mode: false,
            ..StoreConfig::default()
        };
        let outcome = FactStore::open(&config).and_then(|store| store.setup());
        assert!(
            matches!(outcome, Err(InfomonError::StoreCorrupt { .. })),
            "expected StoreCorrupt, got {outcome:?}"
        );
    }
}
