//! String manipulation functions.

use serde_json::Value;

use super::{check_arg_count, get_string_arg};
use crate::error::{ScriptError, ScriptResult};

/// `upper(s)`
pub fn upper(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("upper", args, 1)?;
    Ok(Value::String(get_string_arg("upper", args, 0)?.to_uppercase()))
}

/// `lower(s)`
pub fn lower(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("lower", args, 1)?;
    Ok(Value::String(get_string_arg("lower", args, 0)?.to_lowercase()))
}

/// `trim(s)`
pub fn trim(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("trim", args, 1)?;
    Ok(Value::String(get_string_arg("trim", args, 0)?.trim().to_owned()))
}

/// `split(s, separator)`
pub fn split(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("split", args, 2)?;
    let s = get_string_arg("split", args, 0)?;
    let separator = get_string_arg("split", args, 1)?;
    if separator.is_empty() {
        return Err(ScriptError::value("split(): empty separator"));
    }
    Ok(Value::Array(
        s.split(separator)
            .map(|part| Value::String(part.to_owned()))
            .collect(),
    ))
}

/// `replace(s, from, to)`
pub fn replace(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("replace", args, 3)?;
    let s = get_string_arg("replace", args, 0)?;
    let from = get_string_arg("replace", args, 1)?;
    let to = get_string_arg("replace", args, 2)?;
    if from.is_empty() {
        return Err(ScriptError::value("replace(): empty pattern"));
    }
    Ok(Value::String(s.replace(from, to)))
}

/// `starts_with(s, prefix)`
pub fn starts_with(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("starts_with", args, 2)?;
    let s = get_string_arg("starts_with", args, 0)?;
    let prefix = get_string_arg("starts_with", args, 1)?;
    Ok(Value::Bool(s.starts_with(prefix)))
}

/// `ends_with(s, suffix)`
pub fn ends_with(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("ends_with", args, 2)?;
    let s = get_string_arg("ends_with", args, 0)?;
    let suffix = get_string_arg("ends_with", args, 1)?;
    Ok(Value::Bool(s.ends_with(suffix)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn case_and_trim() {
        assert_eq!(upper(&[json!("abc")]).unwrap(), json!("ABC"));
        assert_eq!(lower(&[json!("ÀB")]).unwrap(), json!("àb"));
        assert_eq!(trim(&[json!("  x \n")]).unwrap(), json!("x"));
    }

    #[test]
    fn split_and_replace() {
        assert_eq!(split(&[json!("a,b,,c"), json!(",")]).unwrap(), json!(["a", "b", "", "c"]));
        assert_eq!(split(&[json!("a"), json!("")]).unwrap_err().kind(), "ValueError");
        assert_eq!(
            replace(&[json!("a-b-c"), json!("-"), json!("+")]).unwrap(),
            json!("a+b+c")
        );
    }

    #[test]
    fn prefix_and_suffix() {
        assert_eq!(starts_with(&[json!("runlet"), json!("run")]).unwrap(), json!(true));
        assert_eq!(ends_with(&[json!("runlet"), json!("run")]).unwrap(), json!(false));
    }

    #[test]
    fn non_string_argument() {
        let err = upper(&[json!(1)]).unwrap_err();
        assert_eq!(err.kind(), "TypeError");
    }
}
