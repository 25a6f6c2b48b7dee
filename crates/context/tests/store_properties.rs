//! Property tests for context path semantics and flattening.

use proptest::prelude::*;
use runlet_context::{ContextStore, flatten};
use serde_json::{Map, Value, json};

/// Generate a path under the default root prefix.
fn arb_writable_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9_]{0,6}", 1..5)
        .prop_map(|segments| format!("variables.{}", segments.join(".")))
}

/// Generate a JSON scalar or list (anything `get` returns unchanged).
fn arb_plain_value() -> impl Strategy<Value = Value> {
    let scalar = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1.0e9f64..1.0e9).prop_map(|f| json!(f)),
        "[ -~]{0,12}".prop_map(Value::String),
    ]
    .boxed();
    prop_oneof![
        4 => scalar.clone(),
        1 => prop::collection::vec(scalar, 0..4).prop_map(Value::Array),
    ]
}

/// Generate an arbitrary JSON tree, including JSON-looking strings.
fn arb_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z ]{0,8}".prop_map(Value::String),
        any::<i32>().prop_map(|n| Value::String(n.to_string())),
        Just(Value::String("{\"k\": \"[1, \\\"2\\\"]\"}".to_owned())),
        Just(Value::String("\"\\\"true\\\"\"".to_owned())),
        Just(Value::String("{not json".to_owned())),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn write_then_read_round_trips(path in arb_writable_path(), value in arb_plain_value()) {
        let mut ctx = ContextStore::default();
        ctx.set(&path, value.clone()).unwrap();
        prop_assert_eq!(ctx.get(&path).unwrap(), value);
    }

    #[test]
    fn mapping_reads_reparse_to_the_written_value(
        path in arb_writable_path(),
        entries in prop::collection::btree_map("[a-z]{1,5}", any::<i32>(), 0..5),
    ) {
        let value = Value::Object(
            entries.into_iter().map(|(k, v)| (k, json!(v))).collect::<Map<_, _>>(),
        );
        let mut ctx = ContextStore::default();
        ctx.set(&path, value.clone()).unwrap();

        let rendered = ctx.get(&path).unwrap();
        let text = rendered.as_str().unwrap();
        let reparsed: Value = serde_json::from_str(text).unwrap();
        prop_assert_eq!(reparsed, value);
    }

    #[test]
    fn deleting_an_absent_key_never_fails(path in arb_writable_path()) {
        let mut ctx = ContextStore::default();
        ctx.set(&path, json!(1)).unwrap();
        let sibling = format!("{path}_absent");

        let before = ctx.clone();
        prop_assert_eq!(ctx.delete(&sibling).unwrap(), None);
        prop_assert_eq!(ctx, before);
    }

    #[test]
    fn single_segment_writes_always_fail(segment in "[a-z]{1,8}", value in arb_plain_value()) {
        let mut ctx = ContextStore::default();
        let err = ctx.set(&segment, value).unwrap_err();
        prop_assert_eq!(err.kind(), "InvalidRootError");
    }

    #[test]
    fn flatten_is_idempotent(tree in arb_tree()) {
        let once = flatten(tree);
        let twice = flatten(once.clone());
        prop_assert_eq!(twice, once);
    }
}
