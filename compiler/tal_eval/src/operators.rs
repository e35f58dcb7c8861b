//! Binary and unary operator implementations.
//!
//! The value set is closed, so dispatch is a direct match on operand
//! kinds. Short-circuit operators are handled by the evaluator before
//! their right operand is evaluated; the fallbacks here only apply when
//! both operands are already values.

use crate::errors::{invalid_binary_op, invalid_unary_op, EvalError};
use crate::value::Value;
use std::cmp::Ordering;
use tal_ir::{BinaryOp, UnaryOp};

/// Evaluate `left op right`.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left.equals(right))),
        BinaryOp::NotEq => Ok(Value::Bool(!left.equals(right))),
        BinaryOp::And => Ok(if left.is_truthy() {
            right.clone()
        } else {
            left.clone()
        }),
        BinaryOp::Or => Ok(if left.is_truthy() {
            left.clone()
        } else {
            right.clone()
        }),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            eval_comparison(left, right, op)
        }
        BinaryOp::Add => eval_add(left, right),
        BinaryOp::Sub => eval_arith(left, right, op, |a, b| a - b),
        BinaryOp::Mul => eval_arith(left, right, op, |a, b| a * b),
        BinaryOp::Div => eval_arith(left, right, op, |a, b| a / b),
        BinaryOp::Mod => eval_arith(left, right, op, |a, b| a % b),
    }
}

/// `+`: numeric addition, otherwise string concatenation when either
/// side is a string. Arrays concatenate into a new array.
fn eval_add(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::Str(a), Value::Str(b)) => {
            let mut out = String::with_capacity(a.len() + b.len());
            out.push_str(a);
            out.push_str(b);
            Ok(Value::string(out))
        }
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            let mut out = left.display_value();
            out.push_str(&right.display_value());
            Ok(Value::string(out))
        }
        (Value::Array(a), Value::Array(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::array(items))
        }
        _ => Err(invalid_binary_op(
            BinaryOp::Add,
            left.type_name(),
            right.type_name(),
        )),
    }
}

/// Numeric-only operators. Zero divisors follow IEEE 754, so `1 / 0` is
/// `Infinity` and `x % 0` is `NaN`.
fn eval_arith(
    left: &Value,
    right: &Value,
    op: BinaryOp,
    apply: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(apply(*a, *b))),
        _ => Err(invalid_binary_op(op, left.type_name(), right.type_name())),
    }
}

/// Ordering comparisons. Numbers compare numerically (any `NaN` makes the
/// result `false`), strings lexicographically by code point.
fn eval_comparison(left: &Value, right: &Value, op: BinaryOp) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => Some((**a).cmp(&**b)),
        _ => return Err(invalid_binary_op(op, left.type_name(), right.type_name())),
    };
    let result = ordering.is_some_and(|ord| match op {
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::LtEq => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::GtEq => ord != Ordering::Less,
        _ => false,
    });
    Ok(Value::Bool(result))
}

/// Evaluate `op operand`.
pub fn evaluate_unary(operand: &Value, op: UnaryOp) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(invalid_unary_op(op, operand.type_name())),
        },
    }
}
