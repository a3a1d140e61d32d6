//! Field-by-field merging of configuration tiers.
//!
//! Tiers are parsed into `serde_json::Value` and folded lowest to highest.
//! Arrays are replaced entirely, not concatenated.

use serde_json::Value;

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// Objects merge recursively. Any other overlay value replaces the base,
/// except `null`, which means "not specified" and keeps the base.
///
/// # Example
/// ```
/// use serde_json::json;
/// use task_tracker::config::deep_merge;
///
/// let base = json!({ "server": { "port": 5000, "db_path": "tasks.db" } });
/// let overlay = json!({ "server": { "port": 8080 } });
/// assert_eq!(
///     deep_merge(base, overlay),
///     json!({ "server": { "port": 8080, "db_path": "tasks.db" } })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge tiers in order, later tiers taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
