//! One-time migration from the legacy flat keys into the unified object.
//!
//! Each legacy key is converted into a patch and overlaid onto the
//! accumulated object only if the result still decodes as a
//! [`PersistedState`]. A key that fails to parse or validate is skipped; the
//! others still migrate.

use serde_json::{json, Map, Value};

use super::merge::deep_merge;
use super::model::PersistedState;
use crate::storage::Storage;

pub const LEGACY_THEME: &str = "docreview.theme";
pub const LEGACY_SIDEBAR_COLLAPSED: &str = "docreview.sidebarCollapsed";
pub const LEGACY_DENSITY: &str = "docreview.density";
pub const LEGACY_FILTERS: &str = "docreview.filters";
pub const LEGACY_VALIDATION_MODE: &str = "docreview.validationMode";
pub const LEGACY_PREFERENCES: &str = "docreview.preferences";
/// Prefix shared by the per-panel legacy keys (`docreview.panel.<id>`).
pub const LEGACY_PANEL_PREFIX: &str = "docreview.panel.";

/// The fixed legacy keys, in migration order.
pub const LEGACY_KEYS: [&str; 6] = [
    LEGACY_THEME,
    LEGACY_SIDEBAR_COLLAPSED,
    LEGACY_DENSITY,
    LEGACY_FILTERS,
    LEGACY_VALIDATION_MODE,
    LEGACY_PREFERENCES,
];

/// Result of a migration pass.
#[derive(Debug)]
pub struct Migration {
    pub state: PersistedState,
    /// Legacy keys that were present and should be deleted once the unified
    /// object is persisted.
    pub consumed_keys: Vec<String>,
}

/// Builds the unified object from `base` (a previously stored object of an
/// older version, if any) plus every legacy key present in `storage`.
pub fn migrate_legacy(storage: &dyn Storage, base: Option<Value>) -> Migration {
    let mut acc = PersistedState::default().to_value();
    if let Some(base) = base {
        overlay_sections(&mut acc, base);
    }

    let mut consumed_keys = Vec::new();

    for key in LEGACY_KEYS {
        let raw = match storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not read legacy settings key");
                continue;
            }
        };
        consumed_keys.push(key.to_owned());
        match legacy_patch(key, &raw) {
            Some(patch) => overlay_checked(&mut acc, patch, key),
            None => tracing::debug!(key, "skipping unparseable legacy settings key"),
        }
    }

    match storage.keys() {
        Ok(keys) => {
            for key in keys.into_iter().filter(|k| k.starts_with(LEGACY_PANEL_PREFIX)) {
                let panel_id = &key[LEGACY_PANEL_PREFIX.len()..];
                if panel_id.is_empty() {
                    consumed_keys.push(key);
                    continue;
                }
                if let Ok(Some(raw)) = storage.get_item(&key) {
                    let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                    let patch = json!({ "ui": { "panels": { panel_id: value } } });
                    overlay_checked(&mut acc, patch, &key);
                }
                consumed_keys.push(key);
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not list legacy panel keys"),
    }

    Migration { state: decode_or_default(acc), consumed_keys }
}

/// Decodes `stored` onto the defaults, section by section, so one malformed
/// section never discards the others.
pub fn decode_lenient(stored: Value) -> PersistedState {
    let mut acc = PersistedState::default().to_value();
    overlay_sections(&mut acc, stored);
    decode_or_default(acc)
}

fn overlay_sections(acc: &mut Value, stored: Value) {
    let Value::Object(sections) = stored else {
        tracing::debug!("stored settings are not an object; using defaults");
        return;
    };
    for (name, section) in sections {
        if name == "_version" {
            continue;
        }
        let mut patch = Map::new();
        patch.insert(name.clone(), section);
        overlay_checked(acc, Value::Object(patch), &name);
    }
}

fn overlay_checked(acc: &mut Value, patch: Value, origin: &str) {
    let mut candidate = acc.clone();
    deep_merge(&mut candidate, patch);
    match serde_json::from_value::<PersistedState>(candidate.clone()) {
        Ok(_) => *acc = candidate,
        Err(e) => tracing::debug!(origin, error = %e, "rejected settings value"),
    }
}

fn decode_or_default(value: Value) -> PersistedState {
    let mut state: PersistedState = serde_json::from_value(value).unwrap_or_default();
    state.version = super::model::SCHEMA_VERSION;
    state
}

/// Converts one legacy key's raw string into a patch on the unified layout.
/// Returns `None` when the raw value cannot be interpreted.
fn legacy_patch(key: &str, raw: &str) -> Option<Value> {
    match key {
        LEGACY_THEME => Some(json!({ "ui": { "theme": raw.trim() } })),
        LEGACY_SIDEBAR_COLLAPSED => {
            let collapsed = match raw.trim() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return None,
            };
            Some(json!({ "ui": { "sidebarCollapsed": collapsed } }))
        }
        LEGACY_DENSITY => Some(json!({ "ui": { "density": raw.trim().to_lowercase() } })),
        LEGACY_FILTERS => {
            let filters: Value = serde_json::from_str(raw).ok()?;
            filters.is_object().then(|| json!({ "filters": filters }))
        }
        LEGACY_VALIDATION_MODE => {
            let mode = match raw.trim().to_lowercase().as_str() {
                "validated" => json!("validated"),
                "unvalidated" => json!("unvalidated"),
                "" | "all" | "none" => return Some(json!({})),
                _ => return None,
            };
            Some(json!({ "filters": { "validationFilter": mode } }))
        }
        LEGACY_PREFERENCES => {
            let prefs: Value = serde_json::from_str(raw).ok()?;
            prefs.is_object().then(|| json!({ "preferences": prefs }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ValidationFilter;
    use crate::settings::model::Density;
    use crate::storage::MemoryStorage;
    use crate::types::Severity;

    #[test]
    fn migrates_every_legacy_key() {
        let storage = MemoryStorage::new();
        storage.set_item(LEGACY_THEME, "light").unwrap();
        storage.set_item(LEGACY_SIDEBAR_COLLAPSED, "true").unwrap();
        storage.set_item(LEGACY_DENSITY, "Compact").unwrap();
        storage
            .set_item(LEGACY_FILTERS, r#"{"severities":["Critical"],"categories":["Grammar"]}"#)
            .unwrap();
        storage.set_item(LEGACY_VALIDATION_MODE, "validated").unwrap();
        storage.set_item(LEGACY_PREFERENCES, r#"{"pageSize":25,"showCharts":false}"#).unwrap();
        storage.set_item("docreview.panel.roles", r#"{"open":true}"#).unwrap();
        storage.set_item("docreview.panel.stats", "collapsed").unwrap();

        let m = migrate_legacy(&storage, None);
        assert_eq!(m.state.ui.theme, "light");
        assert!(m.state.ui.sidebar_collapsed);
        assert_eq!(m.state.ui.density, Density::Compact);
        assert_eq!(m.state.filters.severities, vec![Severity::Critical]);
        assert_eq!(m.state.filters.categories, vec!["Grammar".to_owned()]);
        assert_eq!(m.state.filters.validation_filter, Some(ValidationFilter::Validated));
        assert_eq!(m.state.preferences.page_size, 25);
        assert!(!m.state.preferences.show_charts);
        assert!(m.state.preferences.dark_mode);
        assert_eq!(m.state.ui.panels["roles"], json!({"open": true}));
        assert_eq!(m.state.ui.panels["stats"], json!("collapsed"));
        assert_eq!(m.consumed_keys.len(), 8);
    }

    #[test]
    fn bad_legacy_key_is_skipped_others_migrate() {
        let storage = MemoryStorage::new();
        storage.set_item(LEGACY_FILTERS, "{not json").unwrap();
        storage.set_item(LEGACY_DENSITY, "enormous").unwrap();
        storage.set_item(LEGACY_THEME, "solarized").unwrap();

        let m = migrate_legacy(&storage, None);
        assert_eq!(m.state.ui.theme, "solarized");
        assert_eq!(m.state.ui.density, Density::Comfortable);
        assert_eq!(m.state.filters.severities.len(), 5);
        assert_eq!(m.consumed_keys.len(), 3);
    }

    #[test]
    fn older_unified_object_is_kept_as_base() {
        let storage = MemoryStorage::new();
        storage.set_item(LEGACY_THEME, "light").unwrap();
        let base = json!({"_version": 1, "preferences": {"pageSize": 10}, "ui": {"theme": "dark"}});

        let m = migrate_legacy(&storage, Some(base));
        assert_eq!(m.state.preferences.page_size, 10);
        assert_eq!(m.state.ui.theme, "light");
        assert_eq!(m.state.version, crate::settings::model::SCHEMA_VERSION);
    }

    #[test]
    fn lenient_decode_keeps_good_sections() {
        let state = decode_lenient(json!({
            "_version": 2,
            "ui": {"theme": 42},
            "preferences": {"pageSize": 100}
        }));
        assert_eq!(state.ui.theme, "dark");
        assert_eq!(state.preferences.page_size, 100);
    }
}
