//! Mathematical functions.

use serde_json::Value;

use super::{check_arg_count, check_arg_range};
use crate::error::{ScriptError, ScriptResult};
use crate::value_utils::{as_integer, float_value, number_as_f64, value_type_name};

fn get_number_arg(func_name: &str, args: &[Value], index: usize) -> ScriptResult<f64> {
    match &args[index] {
        Value::Number(n) => Ok(number_as_f64(n)),
        other => Err(ScriptError::invalid_argument(
            func_name,
            format!("argument {} must be a number, found {}", index + 1, value_type_name(other)),
        )),
    }
}

/// Convert an integral float back to an integer value when it fits.
fn integral(f: f64) -> ScriptResult<Value> {
    if f.abs() < 9.0e15 {
        Ok(Value::from(f as i64))
    } else {
        float_value(f)
    }
}

/// `abs(n)`
pub fn abs(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("abs", args, 1)?;
    if let Some(i) = args[0].as_i64() {
        return i
            .checked_abs()
            .map(Value::from)
            .map_or_else(|| float_value((i as f64).abs()), Ok);
    }
    float_value(get_number_arg("abs", args, 0)?.abs())
}

/// `round(n [, digits])`: integer without `digits`, float with them.
pub fn round(args: &[Value]) -> ScriptResult<Value> {
    check_arg_range("round", args, 1, 2)?;
    let n = get_number_arg("round", args, 0)?;
    match args.get(1) {
        None => integral(n.round()),
        Some(digits) => {
            let digits = as_integer(digits)
                .filter(|d| (0..=15).contains(d))
                .ok_or_else(|| {
                    ScriptError::invalid_argument("round", "digits must be an integer in 0..=15")
                })?;
            let factor = 10f64.powi(digits as i32);
            float_value((n * factor).round() / factor)
        }
    }
}

/// `floor(n)`
pub fn floor(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("floor", args, 1)?;
    integral(get_number_arg("floor", args, 0)?.floor())
}

/// `ceil(n)`
pub fn ceil(args: &[Value]) -> ScriptResult<Value> {
    check_arg_count("ceil", args, 1)?;
    integral(get_number_arg("ceil", args, 0)?.ceil())
}

/// `min(a, b, ...)` or `min(array)`
pub fn min(args: &[Value]) -> ScriptResult<Value> {
    extremum("min", args, |candidate, best| candidate < best)
}

/// `max(a, b, ...)` or `max(array)`
pub fn max(args: &[Value]) -> ScriptResult<Value> {
    extremum("max", args, |candidate, best| candidate > best)
}

fn extremum(func_name: &str, args: &[Value], better: fn(f64, f64) -> bool) -> ScriptResult<Value> {
    let items = match args {
        [Value::Array(items)] => items.as_slice(),
        _ => args,
    };

    let mut best: Option<(&Value, f64)> = None;
    for (index, item) in items.iter().enumerate() {
        let Value::Number(n) = item else {
            return Err(ScriptError::invalid_argument(
                func_name,
                format!("item {} must be a number, found {}", index + 1, value_type_name(item)),
            ));
        };
        let candidate = number_as_f64(n);
        match best {
            Some((_, current)) if !better(candidate, current) => {}
            _ => best = Some((item, candidate)),
        }
    }

    best.map(|(value, _)| value.clone())
        .ok_or_else(|| ScriptError::value(format!("{func_name}(): no values given")))
}
