//! The `array` module.
//!
//! `push`, `pop`, `insert` and `remove_at` mutate their argument in place
//! (visible through every alias); everything else returns a new array.

use crate::callbacks::declared_arity;
use std::cmp::Ordering;
use tal_eval::{
    index_out_of_bounds, invalid_value, wrong_arg_type, Arity, Capability, ControlAction,
    EvalResult, HostContext, ModuleDef, NativeCall, Value,
};

/// Most elements `range` will materialize.
const MAX_RANGE_LEN: usize = 10_000_000;

natives! {
    module = "array";
    PUSH = "push", Arity::AtLeast(2), Capability::ARRAY => push;
    POP = "pop", Arity::Exact(1), Capability::ARRAY => pop;
    LENGTH = "length", Arity::Exact(1), Capability::ARRAY => length;
    SLICE = "slice", Arity::Range(2, 3), Capability::ARRAY => slice;
    CONCAT = "concat", Arity::AtLeast(2), Capability::ARRAY => concat;
    REVERSE = "reverse", Arity::Exact(1), Capability::ARRAY => reverse;
    SORT = "sort", Arity::Range(1, 2), Capability::ARRAY => sort;
    INDEX_OF = "index_of", Arity::Exact(2), Capability::ARRAY => index_of;
    CONTAINS = "contains", Arity::Exact(2), Capability::ARRAY => contains;
    FIRST = "first", Arity::Exact(1), Capability::ARRAY => first;
    LAST = "last", Arity::Exact(1), Capability::ARRAY => last;
    INSERT = "insert", Arity::Exact(3), Capability::ARRAY => insert;
    REMOVE_AT = "remove_at", Arity::Exact(2), Capability::ARRAY => remove_at;
    RANGE = "range", Arity::Range(1, 3), Capability::ARRAY => range;
    SUM = "sum", Arity::Exact(1), Capability::ARRAY => sum;
    FLATTEN = "flatten", Arity::Exact(1), Capability::ARRAY => flatten;
}

pub(crate) fn module() -> ModuleDef {
    ModuleDef::new(
        "array",
        &[
            &PUSH, &POP, &LENGTH, &SLICE, &CONCAT, &REVERSE, &SORT, &INDEX_OF, &CONTAINS, &FIRST,
            &LAST, &INSERT, &REMOVE_AT, &RANGE, &SUM, &FLATTEN,
        ],
    )
}

/// Append the remaining arguments; returns the new length.
fn push(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let array = call.array_arg(0)?;
    let mut items = array.borrow_mut();
    items.extend_from_slice(&call.args()[1..]);
    Ok(Value::int(items.len() as i64))
}

/// Remove and return the last element, or `null` when empty.
fn pop(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(call.array_arg(0)?.borrow_mut().pop().unwrap_or_default())
}

fn length(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::int(call.array_arg(0)?.borrow().len() as i64))
}

/// Resolve a possibly negative position against `len`, clamped to `0..=len`.
fn relative_index(index: i64, len: usize) -> usize {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    resolved.clamp(0, len) as usize
}

/// `slice(array, start, end = length)`; negative positions count from the end.
fn slice(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let items = call.array_arg(0)?.borrow();
    let start = relative_index(call.int_arg(1)?, items.len());
    let end = match call.opt_arg(2) {
        Some(_) => relative_index(call.int_arg(2)?, items.len()),
        None => items.len(),
    };
    let taken = if start < end {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(Value::array(taken))
}

fn concat(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let mut joined = Vec::new();
    for i in 0..call.len() {
        joined.extend(call.array_arg(i)?.borrow().iter().cloned());
    }
    Ok(Value::array(joined))
}

fn reverse(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let mut items = call.array_arg(0)?.borrow().clone();
    items.reverse();
    Ok(Value::array(items))
}

/// `sort(array, compare?)`: stable, returns a new array.
///
/// Without a comparator the elements must be all numbers or all strings.
/// A comparator `compare(a, b)` returns a negative number (or `true`) when
/// `a` belongs before `b`.
fn sort(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let items = call.array_arg(0)?.borrow().clone();
    let sorted = match call.opt_arg(1) {
        Some(_) => {
            let compare = call.callable_arg(1)?;
            if declared_arity(compare).is_some_and(|n| n != 2) {
                return Err(invalid_value("array.sort: comparator must take two arguments").into());
            }
            merge_sort(items, &mut |a, b| {
                let verdict = host.call_value(compare, vec![a.clone(), b.clone()])?;
                match verdict {
                    Value::Number(n) => Ok(n < 0.0),
                    Value::Bool(b) => Ok(b),
                    other => Err(invalid_value(format!(
                        "array.sort: comparator must return a number, got {}",
                        other.type_name()
                    ))
                    .into()),
                }
            })?
        }
        None => merge_sort(items, &mut |a, b| {
            Ok(natural_order(a, b)? == Ordering::Less)
        })?,
    };
    Ok(Value::array(sorted))
}

/// Default ordering: numbers numerically, strings lexically.
fn natural_order(a: &Value, b: &Value) -> Result<Ordering, ControlAction> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(x.partial_cmp(y).unwrap_or(Ordering::Equal)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        _ => Err(invalid_value(format!(
            "array.sort cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))
        .into()),
    }
}

/// Stable merge sort with a fallible `less` predicate.
///
/// `slice::sort_by` cannot propagate errors and may panic on a comparator
/// that is not a total order, which script comparators need not be.
fn merge_sort(
    mut items: Vec<Value>,
    less: &mut dyn FnMut(&Value, &Value) -> Result<bool, ControlAction>,
) -> Result<Vec<Value>, ControlAction> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, less)?;
    let right = merge_sort(right, less)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => less(r, l)?,
            _ => break,
        };
        if take_right {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

/// Position of the first structurally equal element, or -1.
fn index_of(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let needle = call.arg(1);
    let position = call
        .array_arg(0)?
        .borrow()
        .iter()
        .position(|item| item.equals(&needle))
        .map_or(-1, |i| i as i64);
    Ok(Value::int(position))
}

fn contains(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let needle = call.arg(1);
    let found = call.array_arg(0)?.borrow().iter().any(|item| item.equals(&needle));
    Ok(Value::bool(found))
}

fn first(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(call.array_arg(0)?.borrow().first().cloned().unwrap_or_default())
}

fn last(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(call.array_arg(0)?.borrow().last().cloned().unwrap_or_default())
}

/// `insert(array, index, value)`; `index` may equal the length.
fn insert(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let array = call.array_arg(0)?;
    let index = call.int_arg(1)?;
    let mut items = array.borrow_mut();
    match usize::try_from(index) {
        Ok(i) if i <= items.len() => {
            items.insert(i, call.arg(2));
            Ok(Value::int(items.len() as i64))
        }
        _ => Err(index_out_of_bounds(index, items.len()).into()),
    }
}

/// Remove and return the element at `index`.
fn remove_at(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let array = call.array_arg(0)?;
    let index = call.int_arg(1)?;
    let mut items = array.borrow_mut();
    match usize::try_from(index) {
        Ok(i) if i < items.len() => Ok(items.remove(i)),
        _ => Err(index_out_of_bounds(index, items.len()).into()),
    }
}

/// `range(end)`, `range(start, end)` or `range(start, end, step)`.
fn range(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let (start, end) = match call.len() {
        1 => (0.0, call.number_arg(0)?),
        _ => (call.number_arg(0)?, call.number_arg(1)?),
    };
    let step = match call.opt_arg(2) {
        Some(_) => call.number_arg(2)?,
        None => 1.0,
    };
    if step == 0.0 || !step.is_finite() {
        return Err(invalid_value("array.range: step must be a non-zero finite number").into());
    }
    if !start.is_finite() || !end.is_finite() {
        return Err(invalid_value("array.range: bounds must be finite").into());
    }
    let count = ((end - start) / step).ceil().max(0.0);
    if count > MAX_RANGE_LEN as f64 {
        return Err(invalid_value(format!(
            "array.range: more than {MAX_RANGE_LEN} elements"
        ))
        .into());
    }
    let items = (0..count as usize)
        .map(|k| Value::number(start + k as f64 * step))
        .collect();
    Ok(Value::array(items))
}

fn sum(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let mut total = 0.0;
    for item in call.array_arg(0)?.borrow().iter() {
        let Value::Number(n) = item else {
            return Err(wrong_arg_type("array.sum", 0, "array of numbers", item.type_name()).into());
        };
        total += n;
    }
    Ok(Value::number(total))
}

/// Flatten one level of nesting.
fn flatten(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let mut flat = Vec::new();
    for item in call.array_arg(0)?.borrow().iter() {
        match item {
            Value::Array(inner) => flat.extend(inner.borrow().iter().cloned()),
            other => flat.push(other.clone()),
        }
    }
    Ok(Value::array(flat))
}

#[cfg(test)]
mod tests;
