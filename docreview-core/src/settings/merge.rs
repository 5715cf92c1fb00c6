//! Structural helpers over `serde_json::Value`: recursive merge and dotted-path
//! access.

use serde_json::{Map, Value};

use crate::error::SettingsError;

/// Merges `overlay` into `base` in place.
///
/// Objects merge key by key, recursively. Any other overlay value replaces the
/// base value, except `null`, which never erases what the base holds.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        if !value.is_null() {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Returns the value at a dotted `path` (`"ui.panels.sidebar"`), if present.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Writes `value` at a dotted `path`, creating intermediate objects as needed.
///
/// # Errors
///
/// Returns `SettingsError::UnknownPath` when the path is empty or passes
/// through a non-object value.
pub fn set_path(root: &mut Value, path: &str, value: Value) -> Result<(), SettingsError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(SettingsError::UnknownPath(path.to_owned()));
    }
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| SettingsError::UnknownPath(path.to_owned()))?;

    let mut node = root;
    for segment in parents {
        let map = node
            .as_object_mut()
            .ok_or_else(|| SettingsError::UnknownPath(path.to_owned()))?;
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    let map = node
        .as_object_mut()
        .ok_or_else(|| SettingsError::UnknownPath(path.to_owned()))?;
    map.insert(last.to_string(), value);
    Ok(())
}
