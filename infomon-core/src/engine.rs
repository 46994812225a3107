//! The `Infomon` facade: one character's fact store, cache and parser.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::cache::FactCache;
use crate::config::InfomonConfig;
use crate::error::{InfomonError, Result};
use crate::keys::{self, FactValue};
use crate::lookup::{self, PsmCategory};
use crate::parser::{LineParser, Mutation, ParseOutcome, Resolution};
use crate::store::FactStore;

/// Parsed-state engine for one character.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct Infomon {
    cache: FactCache,
    parser: Mutex<LineParser>,
    config: InfomonConfig,
}

impl Infomon {
    /// Open the store named by `config` and make sure its table exists.
    ///
    /// # Errors
    ///
    /// Storage-fatal errors from [`FactStore::open`] and
    /// [`FactStore::setup`] are returned as is; nothing is retried.
    pub fn open(config: InfomonConfig) -> Result<Self> {
        let store = FactStore::open(&config.store)?;
        Self::with_store(Arc::new(store), config)
    }

    /// An engine over a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Propagates SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let config = InfomonConfig::default();
        let store = FactStore::open_in_memory(&config.store.table)?;
        Self::with_store(Arc::new(store), config)
    }

    /// An engine over an already opened store.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`FactStore::setup`].
    pub fn with_store(store: Arc<FactStore>, config: InfomonConfig) -> Result<Self> {
        store.setup()?;
        info!(
            path = %store.db_path().display(),
            table = store.table(),
            "Infomon ready"
        );
        Ok(Self {
            cache: FactCache::new(store),
            parser: Mutex::new(LineParser::new(config.parser.block_line_limit)),
            config,
        })
    }

    /// Configuration the engine was opened with.
    #[must_use]
    pub fn config(&self) -> &InfomonConfig {
        &self.config
    }

    /// The fact cache (exposes `flush` and `contains`).
    #[must_use]
    pub fn cache(&self) -> &FactCache {
        &self.cache
    }

    /// Create the fact table if needed. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn setup(&self) -> Result<()> {
        self.cache.store().setup()
    }

    /// Current value of `key`, or `None` when unknown.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn get(&self, key: &str) -> Result<Option<FactValue>> {
        self.cache.get(key)
    }

    /// Integer value of `key`, if present and numeric.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get(key)?.and_then(|v| v.as_int()))
    }

    /// Set `key` outright.
    ///
    /// # Errors
    ///
    /// [`InfomonError::InvalidKey`] for keys outside the dotted lowercase
    /// schema, store failures otherwise.
    pub fn set(&self, key: &str, value: impl Into<FactValue>) -> Result<()> {
        if !keys::is_valid_key(key) {
            return Err(InfomonError::InvalidKey(key.to_string()));
        }
        self.cache.set(key, value.into())
    }

    /// Remove `key`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.cache.delete(key)?;
        debug!(key, removed, "Fact deleted");
        Ok(removed)
    }

    /// Empty the store and cache; the table stays queryable.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn reset(&self) -> Result<()> {
        self.cache.reset()?;
        self.parser.lock().reset();
        info!(table = self.cache.store().table(), "Infomon reset");
        Ok(())
    }

    /// Classify one line and apply whatever it says.
    ///
    /// Unrecognised or malformed lines are [`ParseOutcome::Noop`]; only
    /// storage failures are errors.
    ///
    /// # Errors
    ///
    /// Propagates store failures while applying mutations.
    pub fn parse(&self, line: &str) -> Result<ParseOutcome> {
        // Held across apply so concurrent callers see lines in order.
        let mut parser = self.parser.lock();
        let Some(classified) = parser.classify(line) else {
            trace!(line, "No shape matched");
            return Ok(ParseOutcome::Noop);
        };

        let mut facts = 0;
        for mutation in &classified.mutations {
            if self.apply(mutation)? {
                facts += 1;
            }
        }
        debug!(shape = ?classified.shape, facts, "Line parsed");
        Ok(ParseOutcome::Ok {
            shape: classified.shape,
            facts,
        })
    }

    /// Apply one mutation. Returns whether a fact was written.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn apply(&self, mutation: &Mutation) -> Result<bool> {
        match &mutation.resolution {
            Resolution::Absolute(value) => {
                self.cache.set(&mutation.key, value.clone())?;
                Ok(true)
            }
            Resolution::Delta(amount) => Ok(self
                .cache
                .apply_delta(&mutation.key, *amount)?
                .is_some()),
        }
    }

    /// Stored rank of an ability, looked up by display name or mnemonic.
    /// Unknown names and untrained abilities both read as 0.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn psm_rank(&self, category: PsmCategory, name: &str) -> Result<i64> {
        let Some(key) = lookup::fact_key(category, name) else {
            return Ok(0);
        };
        Ok(self.get_int(&key)?.unwrap_or(0))
    }

    /// Every stored fact, ordered by key.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn entries(&self) -> Result<Vec<(String, FactValue)>> {
        self.cache.store().entries()
    }

    /// Human-readable dump, one `key : value` line per fact with strings
    /// quoted. Zero values are left out unless `full` is set.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn show(&self, full: bool) -> Result<Vec<String>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|(_, value)| full || !value.is_zero())
            .map(|(key, value)| format!("{key} : {value}"))
            .collect())
    }

    /// Every fact as a pretty-printed JSON object.
    ///
    /// # Errors
    ///
    /// [`InfomonError::Serialization`] if encoding fails, store failures
    /// otherwise.
    pub fn dump_json(&self) -> Result<String> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .entries()?
            .into_iter()
            .map(|(key, value)| {
                let json = match value {
                    FactValue::Int(n) => serde_json::Value::from(n),
                    FactValue::Text(s) => serde_json::Value::from(s),
                };
                (key, json)
            })
            .collect();
        serde_json::to_string_pretty(&map).map_err(|e| InfomonError::Serialization(e.to_string()))
    }
}
