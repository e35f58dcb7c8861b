//! Calling script callbacks from host functions.

use tal_eval::{Arity, EvalResult, HostContext, Value};

/// Parameters a callable declares, when that is knowable.
pub(crate) fn declared_arity(callee: &Value) -> Option<usize> {
    match callee {
        Value::Function(function) => Some(function.arity()),
        Value::Native(native) => match native.descriptor().arity {
            Arity::Exact(n) => Some(n),
            Arity::Range(..) | Arity::AtLeast(_) => None,
        },
        _ => None,
    }
}

/// Call an element callback as `f(item)`, or `f(item, index)` when it
/// declares two or more parameters.
pub(crate) fn call_element(
    host: &mut dyn HostContext,
    callee: &Value,
    item: Value,
    index: usize,
) -> EvalResult {
    let args = if declared_arity(callee).is_some_and(|n| n >= 2) {
        vec![item, Value::int(index as i64)]
    } else {
        vec![item]
    };
    host.call_value(callee, args)
}

/// Call a predicate callback and test its result for truthiness.
pub(crate) fn test_element(
    host: &mut dyn HostContext,
    callee: &Value,
    item: Value,
    index: usize,
) -> Result<bool, tal_eval::ControlAction> {
    Ok(call_element(host, callee, item, index)?.is_truthy())
}
