//! Unary and binary operators over JSON values.
//!
//! Integer arithmetic is checked and falls back to floating point on
//! overflow. Division always produces a float.

use std::cmp::Ordering;

use serde_json::Value;

use crate::core::ast::BinaryOp;
use crate::error::{ScriptError, ScriptResult};
use crate::value_utils::{float_value, is_truthy, number_as_f64, value_type_name, values_equal};

/// Apply a binary operator to two evaluated operands.
///
/// The evaluator short-circuits `&&` and `||` before reaching here.
pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> ScriptResult<Value> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Subtract => arithmetic(op, left, right, i64::checked_sub, |l, r| l - r),
        BinaryOp::Multiply => arithmetic(op, left, right, i64::checked_mul, |l, r| l * r),
        BinaryOp::Divide => divide(left, right),
        BinaryOp::Modulo => modulo(left, right),
        BinaryOp::Power => power(left, right),
        BinaryOp::Equal => Ok(Value::Bool(values_equal(left, right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!values_equal(left, right))),
        BinaryOp::LessThan => compare(op, left, right).map(|o| Value::Bool(o == Ordering::Less)),
        BinaryOp::GreaterThan => {
            compare(op, left, right).map(|o| Value::Bool(o == Ordering::Greater))
        }
        BinaryOp::LessEqual => {
            compare(op, left, right).map(|o| Value::Bool(o != Ordering::Greater))
        }
        BinaryOp::GreaterEqual => {
            compare(op, left, right).map(|o| Value::Bool(o != Ordering::Less))
        }
        BinaryOp::And => Ok(Value::Bool(is_truthy(left) && is_truthy(right))),
        BinaryOp::Or => Ok(Value::Bool(is_truthy(left) || is_truthy(right))),
    }
}

/// Unary minus.
pub(crate) fn negate(value: &Value) -> ScriptResult<Value> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i
                .checked_neg()
                .map(Value::from)
                .map_or_else(|| float_value(-(i as f64)), Ok),
            None => float_value(-number_as_f64(n)),
        },
        other => Err(ScriptError::type_error("number", value_type_name(other))),
    }
}

fn operand_error(op: BinaryOp, expected: &str, left: &Value, right: &Value) -> ScriptError {
    ScriptError::type_error(
        format!("{expected} operands for '{op}'"),
        format!("{} and {}", value_type_name(left), value_type_name(right)),
    )
}

fn add(left: &Value, right: &Value) -> ScriptResult<Value> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => {
            let mut result = String::with_capacity(l.len() + r.len());
            result.push_str(l);
            result.push_str(r);
            Ok(Value::String(result))
        }
        (Value::Array(l), Value::Array(r)) => {
            Ok(Value::Array(l.iter().chain(r).cloned().collect()))
        }
        _ => arithmetic(BinaryOp::Add, left, right, i64::checked_add, |l, r| l + r),
    }
}

fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> ScriptResult<Value> {
    let (Value::Number(l), Value::Number(r)) = (left, right) else {
        return Err(operand_error(op, "number", left, right));
    };
    if let (Some(li), Some(ri)) = (l.as_i64(), r.as_i64())
        && let Some(result) = int_op(li, ri)
    {
        return Ok(Value::from(result));
    }
    float_value(float_op(number_as_f64(l), number_as_f64(r)))
}

fn divide(left: &Value, right: &Value) -> ScriptResult<Value> {
    let (Value::Number(l), Value::Number(r)) = (left, right) else {
        return Err(operand_error(BinaryOp::Divide, "number", left, right));
    };
    let divisor = number_as_f64(r);
    if divisor == 0.0 {
        return Err(ScriptError::DivisionByZero);
    }
    float_value(number_as_f64(l) / divisor)
}

fn modulo(left: &Value, right: &Value) -> ScriptResult<Value> {
    let (Value::Number(l), Value::Number(r)) = (left, right) else {
        return Err(operand_error(BinaryOp::Modulo, "number", left, right));
    };
    if let (Some(li), Some(ri)) = (l.as_i64(), r.as_i64()) {
        if ri == 0 {
            return Err(ScriptError::DivisionByZero);
        }
        if let Some(result) = li.checked_rem(ri) {
            return Ok(Value::from(result));
        }
    }
    let divisor = number_as_f64(r);
    if divisor == 0.0 {
        return Err(ScriptError::DivisionByZero);
    }
    float_value(number_as_f64(l) % divisor)
}

fn power(left: &Value, right: &Value) -> ScriptResult<Value> {
    let (Value::Number(l), Value::Number(r)) = (left, right) else {
        return Err(operand_error(BinaryOp::Power, "number", left, right));
    };
    if let (Some(base), Some(exp)) = (l.as_i64(), r.as_i64())
        && let Ok(exp) = u32::try_from(exp)
        && let Some(result) = base.checked_pow(exp)
    {
        return Ok(Value::from(result));
    }
    float_value(number_as_f64(l).powf(number_as_f64(r)))
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> ScriptResult<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            if let (Some(li), Some(ri)) = (l.as_i64(), r.as_i64()) {
                Ok(li.cmp(&ri))
            } else {
                number_as_f64(l)
                    .partial_cmp(&number_as_f64(r))
                    .ok_or_else(|| operand_error(op, "comparable", left, right))
            }
        }
        (Value::String(l), Value::String(r)) => Ok(l.cmp(r)),
        _ => Err(operand_error(op, "comparable", left, right)),
    }
}
