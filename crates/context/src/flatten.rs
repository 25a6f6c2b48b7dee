//! Expansion of JSON-encoded string leaves.

use serde_json::Value;

/// Replace every string leaf that parses as JSON with its parsed form.
///
/// Parsed results are flattened again, so a doubly-encoded value ends up
/// fully expanded. Strings that do not parse are kept unchanged. After one
/// pass no string leaf parses as JSON, which makes a second pass a no-op.
pub fn flatten(value: Value) -> Value {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => flatten(parsed),
            Err(_) => Value::String(text),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(flatten).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, child)| (key, flatten(child)))
                .collect(),
        ),
        scalar => scalar,
    }
}
