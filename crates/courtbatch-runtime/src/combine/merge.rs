//! Pure merge rules for chunk contents.

use serde_json::Value;

/// Normalises one parsed results chunk into a sequence of records.
///
/// A top-level array is taken as is. A top-level object is flattened to its
/// non-empty values in key order: array values are spliced in, any other
/// value becomes one element. Empty values are `null`, `false`, zero, `""`,
/// `[]` and `{}`.
/// Returns `None` for any other top-level shape.
pub fn normalize_results(chunk: Value) -> Option<Vec<Value>> {
    match chunk {
        Value::Array(items) => Some(items),
        Value::Object(map) => {
            let mut records = Vec::new();
            for value in map.into_iter().map(|(_, v)| v).filter(|v| !is_empty(v)) {
                match value {
                    Value::Array(items) => records.extend(items),
                    other => records.push(other),
                }
            }
            Some(records)
        }
        _ => None,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

/// Concatenates normalised chunks in order.
pub fn concat<T>(chunks: impl IntoIterator<Item = Vec<T>>) -> Vec<T> {
    chunks.into_iter().flatten().collect()
}
