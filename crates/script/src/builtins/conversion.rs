//! Type conversion and inspection functions.

use serde_json::Value;

use super::{check_arg_count, get_string_arg};
use crate::error::{ScriptError, ScriptResult};
use crate::value_utils::{float_value, is_truthy, render_text, value_type_name};

/// `str(x)`
pub fn to_str(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("str", args, 1)?;
    Ok(Value::String(render_text(&args[0])))
}

/// `num(x)`: numbers pass through, strings are parsed, booleans become 0 or 1.
pub fn to_num(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("num", args, 1)?;
    match &args[0] {
        Value::Number(_) => Ok(args[0].clone()),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Ok(Value::from(i))
            } else if let Ok(f) = trimmed.parse::<f64>() {
                float_value(f)
            } else {
                Err(ScriptError::value(format!("num(): '{s}' is not a number")))
            }
        }
        other => Err(ScriptError::type_error("number, string or boolean", value_type_name(other))),
    }
}

/// `bool(x)`
pub fn to_bool(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("bool", args, 1)?;
    Ok(Value::Bool(is_truthy(&args[0])))
}

/// `to_json(x)`: compact JSON text.
pub fn to_json(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("to_json", args, 1)?;
    Ok(Value::String(args[0].to_string()))
}

/// `parse_json(s)`
pub fn parse_json(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("parse_json", args, 1)?;
    let text = get_string_arg("parse_json", args, 0)?;
    serde_json::from_str(text).map_err(|e| ScriptError::value(format!("parse_json(): {e}")))
}

/// `type_of(x)`
pub fn type_of(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("type_of", args, 1)?;
    Ok(Value::String(value_type_name(&args[0]).to_owned()))
}

/// `fail(message)`: raise a `RaisedError`.
pub fn fail(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("fail", args, 1)?;
    Err(ScriptError::Raised {
        message: render_text(&args[0]),
    })
}
