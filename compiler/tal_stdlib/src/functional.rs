//! The `functional` module.
//!
//! Element callbacks receive `(item)` or `(item, index)` depending on how
//! many parameters they declare. Composed, partially applied and curried
//! functions are host functions bound to their own state, so they stay
//! ordinary callable values.

use crate::callbacks::{call_element, declared_arity, test_element};
use tal_eval::{
    invalid_value, Arity, Capability, EvalError, EvalResult, HostContext, ModuleDef, NativeCall,
    NativeDescriptor, NativeState, Value,
};

natives! {
    module = "functional";
    MAP = "map", Arity::Exact(2), Capability::FUNCTIONAL => map;
    FILTER = "filter", Arity::Exact(2), Capability::FUNCTIONAL => filter;
    REDUCE = "reduce", Arity::Range(2, 3), Capability::FUNCTIONAL => reduce;
    FOR_EACH = "for_each", Arity::Exact(2), Capability::FUNCTIONAL => for_each;
    FIND = "find", Arity::Exact(2), Capability::FUNCTIONAL => find;
    EVERY = "every", Arity::Exact(2), Capability::FUNCTIONAL => every;
    SOME = "some", Arity::Exact(2), Capability::FUNCTIONAL => some;
    COMPOSE = "compose", Arity::AtLeast(1), Capability::FUNCTIONAL => compose;
    PIPE = "pipe", Arity::AtLeast(1), Capability::FUNCTIONAL => pipe;
    PARTIAL = "partial", Arity::AtLeast(1), Capability::FUNCTIONAL => partial;
    CURRY = "curry", Arity::Range(1, 2), Capability::FUNCTIONAL => curry;

    // Bound results
    COMPOSED = "composed", Arity::AtLeast(0), Capability::FUNCTIONAL => call_chain;
    PARTIAL_APPLIED = "partial_applied", Arity::AtLeast(0), Capability::FUNCTIONAL => call_partial;
    CURRIED = "curried", Arity::AtLeast(0), Capability::FUNCTIONAL => call_curried;
}

pub(crate) fn module() -> ModuleDef {
    ModuleDef::new(
        "functional",
        &[
            &MAP, &FILTER, &REDUCE, &FOR_EACH, &FIND, &EVERY, &SOME, &COMPOSE, &PIPE, &PARTIAL,
            &CURRY,
        ],
    )
}

/// Functions applied in order, the first with every argument and each
/// later one with the previous result.
#[derive(Clone)]
struct Chain {
    functions: Vec<Value>,
}

#[derive(Clone)]
struct Partial {
    callee: Value,
    bound: Vec<Value>,
}

#[derive(Clone)]
struct Curried {
    callee: Value,
    arity: usize,
    collected: Vec<Value>,
}

/// Bind `state` to `descriptor` as a new callable value.
fn bind<T: 'static>(descriptor: &'static NativeDescriptor, state: T) -> Value {
    Value::native_bound(descriptor, NativeState::new(state))
}

/// The state a bound function was created with.
fn state<T: Clone + 'static>(call: NativeCall<'_>) -> Result<T, EvalError> {
    call.state::<T>().cloned()
}

/// Snapshot of the array argument, so callbacks may mutate the original.
fn items(call: NativeCall<'_>) -> Result<Vec<Value>, EvalError> {
    Ok(call.array_arg(0)?.borrow().clone())
}

fn map(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let f = call.callable_arg(1)?;
    let mut mapped = Vec::new();
    for (i, item) in items(call)?.into_iter().enumerate() {
        mapped.push(call_element(host, f, item, i)?);
    }
    Ok(Value::array(mapped))
}

fn filter(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let keep = call.callable_arg(1)?;
    let mut kept = Vec::new();
    for (i, item) in items(call)?.into_iter().enumerate() {
        if test_element(host, keep, item.clone(), i)? {
            kept.push(item);
        }
    }
    Ok(Value::array(kept))
}

/// `reduce(array, f, initial?)` calls `f(accumulator, item)` left to right.
fn reduce(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let f = call.callable_arg(1)?;
    let mut rest = items(call)?.into_iter();
    let mut accumulator = if call.len() == 3 {
        call.arg(2)
    } else {
        rest.next().ok_or_else(|| {
            invalid_value("functional.reduce of an empty array with no initial value")
        })?
    };
    for item in rest {
        accumulator = host.call_value(f, vec![accumulator, item])?;
    }
    Ok(accumulator)
}

fn for_each(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let f = call.callable_arg(1)?;
    for (i, item) in items(call)?.into_iter().enumerate() {
        call_element(host, f, item, i)?;
    }
    Ok(Value::Null)
}

/// First element the predicate accepts, or `null`.
fn find(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let predicate = call.callable_arg(1)?;
    for (i, item) in items(call)?.into_iter().enumerate() {
        if test_element(host, predicate, item.clone(), i)? {
            return Ok(item);
        }
    }
    Ok(Value::Null)
}

fn every(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let predicate = call.callable_arg(1)?;
    for (i, item) in items(call)?.into_iter().enumerate() {
        if !test_element(host, predicate, item, i)? {
            return Ok(Value::bool(false));
        }
    }
    Ok(Value::bool(true))
}

fn some(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let predicate = call.callable_arg(1)?;
    for (i, item) in items(call)?.into_iter().enumerate() {
        if test_element(host, predicate, item, i)? {
            return Ok(Value::bool(true));
        }
    }
    Ok(Value::bool(false))
}

fn callables(call: NativeCall<'_>) -> Result<Vec<Value>, EvalError> {
    (0..call.len())
        .map(|i| call.callable_arg(i).cloned())
        .collect()
}

/// `compose(f, g)(x)` is `f(g(x))`.
fn compose(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let mut functions = callables(call)?;
    functions.reverse();
    Ok(bind(&COMPOSED, Chain { functions }))
}

/// `pipe(f, g)(x)` is `g(f(x))`.
fn pipe(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let functions = callables(call)?;
    Ok(bind(&COMPOSED, Chain { functions }))
}

fn call_chain(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let chain: Chain = state(call)?;
    let mut functions = chain.functions.iter();
    let Some(first) = functions.next() else {
        return Ok(call.arg(0));
    };
    let mut result = host.call_value(first, call.args().to_vec())?;
    for f in functions {
        result = host.call_value(f, vec![result])?;
    }
    Ok(result)
}

/// `partial(f, a, b)(c)` is `f(a, b, c)`.
fn partial(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let callee = call.callable_arg(0)?.clone();
    let bound = call.args()[1..].to_vec();
    Ok(bind(&PARTIAL_APPLIED, Partial { callee, bound }))
}

fn call_partial(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let Partial { callee, mut bound } = state(call)?;
    bound.extend_from_slice(call.args());
    host.call_value(&callee, bound)
}

/// `curry(f, arity?)`: collect arguments across calls until `arity` are
/// available, then call `f`.
///
/// The arity defaults to the parameter count `f` declares.
fn curry(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let callee = call.callable_arg(0)?.clone();
    let arity = match call.opt_arg(1) {
        Some(_) => usize::try_from(call.int_arg(1)?)
            .map_err(|_| invalid_value("functional.curry: arity must not be negative"))?,
        None => declared_arity(&callee).ok_or_else(|| {
            invalid_value("functional.curry: cannot infer the arity of a variadic function; pass it explicitly")
        })?,
    };
    Ok(bind(
        &CURRIED,
        Curried {
            callee,
            arity,
            collected: Vec::new(),
        },
    ))
}

fn call_curried(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let Curried {
        callee,
        arity,
        mut collected,
    } = state(call)?;
    collected.extend_from_slice(call.args());
    if collected.len() >= arity {
        return host.call_value(&callee, collected);
    }
    Ok(bind(
        &CURRIED,
        Curried {
            callee,
            arity,
            collected,
        },
    ))
}
