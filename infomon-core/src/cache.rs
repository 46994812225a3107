//! Write-through fact cache in front of the durable store.
//!
//! Reads are served from memory when possible and populate lazily from the
//! [`FactStore`] on a miss. Absence is never cached, so a value written by
//! another thread after a miss is seen on the next read.
//!
//! Lock order is always cache first, store second. Every path that touches
//! the store while the cache could change (miss, write, delete, delta, reset)
//! holds the exclusive cache lock for the whole operation, so a slow miss can
//! never repopulate the cache with a value that a concurrent write or reset
//! has already replaced.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::{debug, warn};

use crate::error::Result;
use crate::keys::FactValue;
use crate::store::FactStore;

/// In-memory mirror of the fact table.
#[derive(Debug)]
pub struct FactCache {
    entries: RwLock<HashMap<String, FactValue>>,
    store: Arc<FactStore>,
}

impl FactCache {
    /// Create an empty cache over `store`.
    #[must_use]
    pub fn new(store: Arc<FactStore>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<FactStore> {
        &self.store
    }

    /// Read a fact, falling back to the store on a miss.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn get(&self, key: &str) -> Result<Option<FactValue>> {
        if let Some(value) = self.entries.read().get(key) {
            return Ok(Some(value.clone()));
        }

        // Upgradable read excludes writers (and other misses) but not plain
        // readers; it is upgraded only when there is something to insert.
        let guard = self.entries.upgradable_read();
        if let Some(value) = guard.get(key) {
            return Ok(Some(value.clone()));
        }
        match self.store.get(key)? {
            Some(value) => {
                let mut entries = RwLockUpgradableReadGuard::upgrade(guard);
                entries.insert(key.to_string(), value.clone());
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Write a fact to the store and the cache before returning.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the cache is left untouched on failure.
    pub fn set(&self, key: &str, value: FactValue) -> Result<()> {
        let mut entries = self.entries.write();
        self.store.set(key, &value)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    /// Add `delta` to the current integer value (absent counts as 0).
    ///
    /// Returns the new value, or `None` when the current value is text and
    /// the delta was discarded.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn apply_delta(&self, key: &str, delta: i64) -> Result<Option<i64>> {
        let mut entries = self.entries.write();
        let current = match entries.get(key) {
            Some(value) => Some(value.clone()),
            None => self.store.get(key)?,
        };
        let base = match current {
            None => 0,
            Some(FactValue::Int(n)) => n,
            Some(FactValue::Text(text)) => {
                warn!(key, current = %text, delta, "Delta against non-numeric fact discarded");
                return Ok(None);
            }
        };
        let next = base.saturating_add(delta);
        self.store.set(key, &FactValue::Int(next))?;
        entries.insert(key.to_string(), FactValue::Int(next));
        Ok(Some(next))
    }

    /// Remove a fact from both the store and the cache.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write();
        let removed = self.store.delete(key)?;
        entries.remove(key);
        Ok(removed)
    }

    /// Drop every cached entry; the store is untouched.
    pub fn flush(&self) {
        let mut entries = self.entries.write();
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "Fact cache flushed");
    }

    /// Clear the store, then the cache, as one exclusive operation.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the cache is still flushed so it can never
    /// claim more than the store holds.
    pub fn reset(&self) -> Result<()> {
        let mut entries = self.entries.write();
        let cleared = self.store.clear_all();
        entries.clear();
        cleared.map(|_| ())
    }

    /// Whether `key` is currently held in memory.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> FactCache {
        let store = FactStore::open_in_memory("testing").expect("open");
        store.setup().expect("setup");
        FactCache::new(Arc::new(store))
    }

    #[test]
    fn lazily_loads_after_flush() {
        let cache = cache();
        let k = "answer.life";
        for _ in 0..100 {
            cache.reset().expect("reset");
            cache.flush();

            assert_eq!(cache.get(k).expect("get"), None);
            cache.set(k, 42.into()).expect("set");
            assert_eq!(cache.get(k).expect("get"), Some(42.into()));
            assert!(cache.contains(k));

            cache.flush();
            assert!(!cache.contains(k));
            assert_eq!(cache.get(k).expect("get"), Some(42.into()));
            assert!(cache.contains(k));
        }
    }

    #[test]
    fn misses_are_not_cached() {
        let cache = cache();
        assert_eq!(cache.get("stat.level").expect("get"), None);
        assert!(!cache.contains("stat.level"));
        assert!(cache.is_empty());

        // A write that bypasses the cache is visible on the next read.
        cache.store().set("stat.level", &12.into()).expect("store set");
        assert_eq!(cache.get("stat.level").expect("get"), Some(12.into()));
    }

    #[test]
    fn delta_reads_current_value() {
        let cache = cache();
        assert_eq!(cache.apply_delta("cman.vaultkick", -1).expect("delta"), Some(-1));

        cache.set("stat.dexterity", 36.into()).expect("set");
        cache.flush();
        assert_eq!(cache.apply_delta("stat.dexterity", 1).expect("delta"), Some(37));
        assert_eq!(cache.store().get("stat.dexterity").expect("get"), Some(37.into()));
    }

    #[test]
    fn delta_on_text_is_discarded() {
        let cache = cache();
        cache.set("society.status", "None".into()).expect("set");
        assert_eq!(cache.apply_delta("society.status", 1).expect("delta"), None);
        assert_eq!(cache.get("society.status").expect("get"), Some("None".into()));
    }

    #[test]
    fn delete_removes_from_both_layers() {
        let cache = cache();
        cache.set("weapon.pummel", 5.into()).expect("set");
        cache.set("skill.edged_weapon", 1.into()).expect("set");
        assert!(cache.delete("weapon.pummel").expect("delete"));
        assert!(!cache.contains("weapon.pummel"));
        assert_eq!(cache.get("weapon.pummel").expect("get"), None);
        assert_eq!(cache.get("skill.edged_weapon").expect("get"), Some(1.into()));
    }

    #[test]
    fn reset_empties_everything() {
        let cache = cache();
        cache.set("a.b", 1.into()).expect("set");
        cache.set("a.c", "x".into()).expect("set");
        cache.reset().expect("reset");
        assert!(cache.is_empty());
        assert_eq!(cache.get("a.b").expect("get"), None);
        assert!(cache.store().is_empty().expect("empty"));
        assert!(cache.store().exists().expect("table kept"));
    }
}
