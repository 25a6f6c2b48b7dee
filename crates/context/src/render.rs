//! Canonical text rendering of context subtrees.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};

const INDENT: &[u8] = b"    ";

/// Get the type name of a value for error messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render a value as indented JSON with keys sorted at every level.
///
/// The output is stable regardless of insertion order, and parsing it back
/// yields a value equal to the input.
pub fn render_canonical(value: &Value) -> String {
    let sorted = sort_keys(value);
    let mut buf = Vec::with_capacity(128);
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    if sorted.serialize(&mut serializer).is_err() {
        return sorted.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| sorted.to_string())
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, child)| (key.clone(), sort_keys(child)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn sorts_nested_keys_and_indents_four_spaces() {
        let value = json!({"b": 1, "a": {"z": true, "y": [ {"d": 1, "c": 2} ]}});
        let expected = r#"{
    "a": {
        "y": [
            {
                "c": 2,
                "d": 1
            }
        ],
        "z": true
    },
    "b": 1
}"#;
        assert_eq!(render_canonical(&value), expected);
    }

    #[test]
    fn rendering_is_order_independent() {
        let mut first = Map::new();
        first.insert("x".into(), json!(1));
        first.insert("y".into(), json!(2));
        let mut second = Map::new();
        second.insert("y".into(), json!(2));
        second.insert("x".into(), json!(1));

        assert_eq!(
            render_canonical(&Value::Object(first)),
            render_canonical(&Value::Object(second))
        );
    }

    #[test]
    fn empty_mapping_renders_compactly() {
        assert_eq!(render_canonical(&json!({})), "{}");
    }
}
