//! Versioned, self-healing settings store.
//!
//! One storage key ([`STATE_KEY`]) holds the whole [`PersistedState`]. On the
//! first [`SettingsStore::init`] the store either decodes that object, or runs
//! the one-time legacy migration and deletes the legacy keys. A stored value
//! that is not JSON is removed and treated as absent.
//!
//! Every physical storage failure is logged and swallowed: the in-memory cache
//! is authoritative for the lifetime of the process, so a `get` right after a
//! `set` always sees the new value even when the write to disk failed.

pub mod merge;
pub mod migrate;
pub mod model;

use serde_json::Value;

use crate::error::SettingsError;
use crate::storage::Storage;

pub use model::{
    Density, FilterSettings, PersistedState, Preferences, UiSettings, SCHEMA_VERSION, STATE_KEY,
};

pub struct SettingsStore {
    storage: Box<dyn Storage>,
    cache: PersistedState,
    initialized: bool,
}

impl SettingsStore {
    /// Wraps `storage`. Nothing is read until [`init`](Self::init).
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            cache: PersistedState::default(),
            initialized: false,
        }
    }

    /// Loads the unified settings object, migrating legacy keys on first run.
    ///
    /// Idempotent: after the first successful call the cached object is
    /// returned without touching storage again.
    pub fn init(&mut self) -> &PersistedState {
        if self.initialized {
            return &self.cache;
        }
        self.initialized = true;

        let mut base = None;
        match self.storage.get_item(STATE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(stored) => {
                    let version = stored.get("_version").and_then(Value::as_u64);
                    if version == Some(u64::from(SCHEMA_VERSION)) {
                        self.cache = migrate::decode_lenient(stored);
                        tracing::debug!(version = SCHEMA_VERSION, "settings loaded");
                        return &self.cache;
                    }
                    tracing::debug!(
                        found = ?version,
                        expected = SCHEMA_VERSION,
                        "settings schema version mismatch; migrating"
                    );
                    base = Some(stored);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "stored settings are corrupted; discarding");
                    if let Err(e) = self.storage.remove_item(STATE_KEY) {
                        tracing::warn!(error = %e, "could not remove corrupted settings");
                    }
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not read settings; using defaults"),
        }

        let migration = migrate::migrate_legacy(self.storage.as_ref(), base);
        self.cache = migration.state;

        if self.persist() {
            for key in &migration.consumed_keys {
                if let Err(e) = self.storage.remove_item(key) {
                    tracing::warn!(key = %key, error = %e, "could not delete legacy settings key");
                }
            }
            if !migration.consumed_keys.is_empty() {
                tracing::info!(keys = migration.consumed_keys.len(), "migrated legacy settings");
            }
        }
        &self.cache
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The cached settings. Defaults until [`init`](Self::init) runs.
    pub fn settings(&self) -> &PersistedState {
        &self.cache
    }

    /// Mutates the settings through the typed model and persists.
    pub fn update(&mut self, f: impl FnOnce(&mut PersistedState)) {
        self.init();
        f(&mut self.cache);
        self.cache.version = SCHEMA_VERSION;
        self.persist();
    }

    /// Reads the value at a dotted path, or `default` when absent.
    pub fn get_value(&self, path: &str, default: Value) -> Value {
        merge::get_path(&self.cache.to_value(), path)
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or(default)
    }

    /// Writes `value` at a dotted path and persists.
    ///
    /// The write is validated against the typed model: a value of the wrong
    /// type, or a path the model does not know, is rejected and the cache is
    /// left unchanged.
    ///
    /// # Errors
    ///
    /// `SettingsError::UnknownPath` or `SettingsError::InvalidValue`.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), SettingsError> {
        self.init();
        if path == "_version" {
            return Err(SettingsError::UnknownPath(path.to_owned()));
        }
        let mut root = self.cache.to_value();
        merge::set_path(&mut root, path, value.clone())?;

        let next: PersistedState =
            serde_json::from_value(root).map_err(|e| SettingsError::InvalidValue {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        if merge::get_path(&next.to_value(), path) != Some(&value) {
            return Err(SettingsError::UnknownPath(path.to_owned()));
        }

        self.cache = next;
        self.persist();
        Ok(())
    }

    /// Restores defaults and persists them.
    pub fn reset(&mut self) {
        self.initialized = true;
        self.cache = PersistedState::default();
        self.persist();
        tracing::info!("settings reset to defaults");
    }

    /// Writes the cache through to storage. Returns `false` (after logging)
    /// when the write failed.
    fn persist(&self) -> bool {
        let raw = match serde_json::to_string(&self.cache) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialise settings");
                return false;
            }
        };
        match self.storage.set_item(STATE_KEY, &raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "could not persist settings");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn initialized(storage: &MemoryStorage) -> SettingsStore {
        let mut store = SettingsStore::new(storage.clone());
        store.init();
        store
    }

    #[test]
    fn first_run_without_legacy_data_persists_defaults() {
        let storage = MemoryStorage::new();
        let store = initialized(&storage);
        assert_eq!(store.settings(), &PersistedState::default());
        let raw = storage.get_item(STATE_KEY).unwrap().unwrap();
        let v: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["_version"], json!(SCHEMA_VERSION));
    }

    #[test]
    fn get_after_set_reflects_value_even_when_write_fails() {
        let storage = MemoryStorage::with_quota(16);
        let mut store = initialized(&storage);
        store.set_value("ui.theme", json!("light")).unwrap();
        assert_eq!(store.get_value("ui.theme", json!("dark")), json!("light"));
        assert_eq!(store.settings().ui.theme, "light");
        assert_eq!(storage.get_item(STATE_KEY).unwrap(), None);
    }

    #[test]
    fn set_value_rejects_wrong_types_and_unknown_paths() {
        let storage = MemoryStorage::new();
        let mut store = initialized(&storage);

        let err = store.set_value("preferences.pageSize", json!("many")).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
        assert_eq!(store.settings().preferences.page_size, 50);

        let err = store.set_value("ui.bogus", json!(1)).unwrap_err();
        assert!(matches!(err, SettingsError::UnknownPath(_)));

        assert!(store.set_value("_version", json!(9)).is_err());
    }

    #[test]
    fn panel_paths_are_free_form() {
        let storage = MemoryStorage::new();
        let mut store = initialized(&storage);
        store.set_value("ui.panels.roles", json!({"open": false})).unwrap();
        assert_eq!(store.get_value("ui.panels.roles.open", json!(true)), json!(false));
        assert_eq!(store.get_value("ui.panels.missing", json!("d")), json!("d"));
    }

    #[test]
    fn update_writes_through() {
        let storage = MemoryStorage::new();
        let mut store = initialized(&storage);
        store.update(|s| s.preferences.page_size = 20);

        let mut reopened = SettingsStore::new(storage.clone());
        assert_eq!(reopened.init().preferences.page_size, 20);
    }

    #[test]
    fn reset_restores_defaults() {
        let storage = MemoryStorage::new();
        let mut store = initialized(&storage);
        store.update(|s| s.ui.sidebar_collapsed = true);
        store.reset();
        assert_eq!(store.settings(), &PersistedState::default());

        let mut reopened = SettingsStore::new(storage);
        assert!(!reopened.init().ui.sidebar_collapsed);
    }
}
