use serde_json::Value;

/// Turns the raw value stored under the collection path into the owned list.
///
/// Push-keyed objects yield their values in key order, which for push keys
/// is insertion order. Arrays (integer-keyed data) yield their elements.
/// `null` and missing entries are skipped; non-string scalars are kept as
/// their JSON text.
pub fn decode_collection(value: Option<Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(entries)) => entries.into_values().filter_map(entry_name).collect(),
        Some(Value::Array(items)) => items.into_iter().filter_map(entry_name).collect(),
        Some(other) => entry_name(other).into_iter().collect(),
    }
}

fn entry_name(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(name) => Some(name),
        other => {
            tracing::warn!(value = %other, "Non-string entry in collection");
            Some(other.to_string())
        }
    }
}
