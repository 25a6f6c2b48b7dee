//! Functions over strings, arrays and objects as collections.

use serde_json::Value;

use super::{check_arg_count, check_arg_range, get_string_arg};
use crate::error::{ScriptError, ScriptResult};
use crate::value_utils::{as_integer, render_text, value_type_name, values_equal};

/// Upper bound on the number of items `range` will produce.
pub const MAX_RANGE_LEN: usize = 1_000_000;

/// `len(x)`: characters of a string, items of an array, keys of an object.
pub fn len(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("len", args, 1)?;
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(arr) => arr.len(),
        Value::Object(obj) => obj.len(),
        other => {
            let found = value_type_name(other);
            return Err(ScriptError::type_error("string, array or object", found));
        }
    };
    Ok(Value::from(n))
}

/// `keys(object)`
pub fn keys(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("keys", args, 1)?;
    match &args[0] {
        Value::Object(obj) => Ok(Value::Array(obj.keys().cloned().map(Value::String).collect())),
        other => Err(ScriptError::type_error("object", value_type_name(other))),
    }
}

/// `values(object)`
pub fn values(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("values", args, 1)?;
    match &args[0] {
        Value::Object(obj) => Ok(Value::Array(obj.values().cloned().collect())),
        other => Err(ScriptError::type_error("object", value_type_name(other))),
    }
}

/// `has(object, key)`
pub fn has(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("has", args, 2)?;
    let key = get_string_arg("has", args, 1)?;
    match &args[0] {
        Value::Object(obj) => Ok(Value::Bool(obj.contains_key(key))),
        other => Err(ScriptError::type_error("object", value_type_name(other))),
    }
}

/// `contains(haystack, needle)`: substring, array element, or object key.
pub fn contains(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("contains", args, 2)?;
    let found = match &args[0] {
        Value::String(s) => s.contains(get_string_arg("contains", args, 1)?),
        Value::Array(arr) => arr.iter().any(|item| values_equal(item, &args[1])),
        Value::Object(obj) => obj.contains_key(get_string_arg("contains", args, 1)?),
        other => {
            let found = value_type_name(other);
            return Err(ScriptError::type_error("string, array or object", found));
        }
    };
    Ok(Value::Bool(found))
}

/// `join(array, separator)`; items are rendered as by `str`.
pub fn join(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("join", args, 2)?;
    let separator = get_string_arg("join", args, 1)?;
    match &args[0] {
        Value::Array(arr) => Ok(Value::String(
            arr.iter().map(render_text).collect::<Vec<_>>().join(separator),
        )),
        other => Err(ScriptError::type_error("array", value_type_name(other))),
    }
}

/// `range(end)`, `range(start, end)` or `range(start, end, step)`.
pub fn range(args: &[Value]) -> ScriptResult<Value> {
    check_arg_range("range", args, 1, 3)?;
    let mut bounds = Vec::with_capacity(args.len());
    for (index, arg) in args.iter().enumerate() {
        bounds.push(as_integer(arg).ok_or_else(|| {
            ScriptError::invalid_argument(
                "range",
                format!(
                    "argument {} must be an integer, found {}",
                    index + 1,
                    value_type_name(arg)
                ),
            )
        })?);
    }

    let (start, end, step) = match bounds.as_slice() {
        [end] => (0, *end, 1),
        [start, end] => (*start, *end, 1),
        [start, end, step] => (*start, *end, *step),
        _ => unreachable!("arity checked above"),
    };
    if step == 0 {
        return Err(ScriptError::value("range(): step must not be zero"));
    }

    let span = if step > 0 { end.saturating_sub(start) } else { start.saturating_sub(end) };
    let count = if span <= 0 { 0 } else { (span - 1) / step.saturating_abs() + 1 };
    if count as u64 > MAX_RANGE_LEN as u64 {
        return Err(ScriptError::value(format!(
            "range(): {count} items exceeds the limit of {MAX_RANGE_LEN}"
        )));
    }

    Ok(Value::Array(
        (0..count).map(|i| Value::from(start + i * step)).collect(),
    ))
}

/// `push(array, item)`: a new array with `item` appended.
pub fn push(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("push", args, 2)?;
    match &args[0] {
        Value::Array(arr) => {
            let mut out = arr.clone();
            out.push(args[1].clone());
            Ok(Value::Array(out))
        }
        other => Err(ScriptError::type_error("array", value_type_name(other))),
    }
}
