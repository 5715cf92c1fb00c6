//! Typed model of the persisted settings object.
//!
//! The JSON layout is camelCase and every section carries `#[serde(default)]`,
//! so an older or partially populated object still decodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::ValidationFilter;
use crate::types::Severity;

/// Current settings schema version. Bumping it triggers one migration pass.
pub const SCHEMA_VERSION: u32 = 2;

/// Storage key of the unified settings object.
pub const STATE_KEY: &str = "docreview.state";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    #[serde(rename = "_version")]
    pub version: u32,
    pub ui: UiSettings,
    pub filters: FilterSettings,
    pub preferences: Preferences,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            ui: UiSettings::default(),
            filters: FilterSettings::default(),
            preferences: Preferences::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Compact,
    #[default]
    Comfortable,
    Spacious,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiSettings {
    pub theme: String,
    pub sidebar_collapsed: bool,
    pub density: Density,
    /// Free-form per-panel state keyed by panel id.
    pub panels: BTreeMap<String, Value>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_owned(),
            sidebar_collapsed: false,
            density: Density::default(),
            panels: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSettings {
    pub severities: Vec<Severity>,
    pub categories: Vec<String>,
    pub validation_filter: Option<ValidationFilter>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            severities: Severity::ALL.to_vec(),
            categories: Vec::new(),
            validation_filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub dark_mode: bool,
    pub compact_mode: bool,
    pub show_charts: bool,
    pub auto_review: bool,
    pub remember_checks: bool,
    pub page_size: usize,
    pub essentials_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            compact_mode: false,
            show_charts: true,
            auto_review: false,
            remember_checks: true,
            page_size: 50,
            essentials_mode: false,
        }
    }
}

impl PersistedState {
    /// Serialised form used as the merge base for stored data.
    pub fn to_value(&self) -> Value {
        // Plain structs, maps with string keys and unit enums: cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
