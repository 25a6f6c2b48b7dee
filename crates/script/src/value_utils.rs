//! Helpers for working with `serde_json::Value` as the runtime value type.

use serde_json::{Number, Value};

use crate::error::{ScriptError, ScriptResult};

pub use runlet_context::value_type_name;

/// Extract f64 from a number, whatever its representation.
#[inline]
pub fn number_as_f64(num: &Number) -> f64 {
    num.as_f64()
        .or_else(|| num.as_i64().map(|i| i as f64))
        .unwrap_or(f64::NAN)
}

/// Wrap a float result, rejecting NaN and infinities which JSON cannot carry.
pub fn float_value(f: f64) -> ScriptResult<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| ScriptError::value(format!("result {f} is not a finite number")))
}

/// Truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i != 0
            } else if let Some(f) = n.as_f64() {
                f != 0.0 && !f.is_nan()
            } else {
                true
            }
        }
        Value::String(s) => !s.is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(obj) => !obj.is_empty(),
    }
}

/// Equality that treats `1` and `1.0` as the same number.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(li), Some(ri)) => li == ri,
            _ => number_as_f64(l) == number_as_f64(r),
        },
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(k, v)| r.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => left == right,
    }
}

/// Text form used by `print` and `str`: strings are written bare, everything
/// else as compact JSON.
pub fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Interpret a value as an integer, accepting integral floats.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}
