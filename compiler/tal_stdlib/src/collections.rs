//! The `collections` module: map helpers over objects plus set and
//! grouping helpers over arrays.

use crate::callbacks::call_element;
use tal_eval::{
    wrong_arg_type, Arity, Capability, EvalResult, HostContext, ModuleDef, NativeCall, ObjectMap,
    Value,
};

natives! {
    module = "collections";
    KEYS = "keys", Arity::Exact(1), Capability::COLLECTIONS => keys;
    VALUES = "values", Arity::Exact(1), Capability::COLLECTIONS => values;
    ENTRIES = "entries", Arity::Exact(1), Capability::COLLECTIONS => entries;
    HAS_KEY = "has_key", Arity::Exact(2), Capability::COLLECTIONS => has_key;
    GET = "get", Arity::Range(2, 3), Capability::COLLECTIONS => get;
    SET = "set", Arity::Exact(3), Capability::COLLECTIONS => set;
    REMOVE = "remove", Arity::Exact(2), Capability::COLLECTIONS => remove;
    MERGE = "merge", Arity::AtLeast(2), Capability::COLLECTIONS => merge;
    SIZE = "size", Arity::Exact(1), Capability::COLLECTIONS => size;
    UNIQUE = "unique", Arity::Exact(1), Capability::COLLECTIONS => unique;
    GROUP_BY = "group_by", Arity::Exact(2), Capability::COLLECTIONS => group_by;
    COUNT_BY = "count_by", Arity::Exact(2), Capability::COLLECTIONS => count_by;
    ZIP = "zip", Arity::Exact(2), Capability::COLLECTIONS => zip;
}

pub(crate) fn module() -> ModuleDef {
    ModuleDef::new(
        "collections",
        &[
            &KEYS, &VALUES, &ENTRIES, &HAS_KEY, &GET, &SET, &REMOVE, &MERGE, &SIZE, &UNIQUE,
            &GROUP_BY, &COUNT_BY, &ZIP,
        ],
    )
}

fn keys(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let object = call.object_arg(0)?.borrow();
    Ok(Value::array(object.keys().map(Value::string).collect()))
}

fn values(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let object = call.object_arg(0)?.borrow();
    Ok(Value::array(object.values().cloned().collect()))
}

/// `[[key, value], ...]` in insertion order.
fn entries(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let object = call.object_arg(0)?.borrow();
    let pairs = object
        .iter()
        .map(|(key, value)| Value::array(vec![Value::string(key), value.clone()]))
        .collect();
    Ok(Value::array(pairs))
}

fn has_key(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let key = call.str_arg(1)?;
    Ok(Value::bool(call.object_arg(0)?.borrow().contains_key(key)))
}

/// `get(object, key, default = null)`.
fn get(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let key = call.str_arg(1)?;
    let found = call.object_arg(0)?.borrow().get(key).cloned();
    Ok(found.unwrap_or_else(|| call.arg(2)))
}

/// Set `key` in place; returns the object.
fn set(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let object = call.object_arg(0)?;
    let key = call.str_arg(1)?;
    object.borrow_mut().insert(key.to_string(), call.arg(2));
    Ok(call.arg(0))
}

/// Remove `key` in place, keeping the order of the rest; returns the
/// removed value or `null`.
fn remove(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let key = call.str_arg(1)?;
    let removed = call.object_arg(0)?.borrow_mut().shift_remove(key);
    Ok(removed.unwrap_or_default())
}

/// New object with every argument's entries; later arguments win.
fn merge(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let mut merged = ObjectMap::new();
    for i in 0..call.len() {
        for (key, value) in call.object_arg(i)?.borrow().iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::object(merged))
}

fn size(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let count = match &call.arg(0) {
        Value::Object(o) => o.borrow().len(),
        Value::Array(a) => a.borrow().len(),
        other => {
            return Err(wrong_arg_type("collections.size", 0, "object or array", other.type_name()).into())
        }
    };
    Ok(Value::int(count as i64))
}

/// Drop structurally equal repeats, keeping first occurrences.
fn unique(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let mut kept: Vec<Value> = Vec::new();
    for item in call.array_arg(0)?.borrow().iter() {
        if !kept.iter().any(|seen| seen.equals(item)) {
            kept.push(item.clone());
        }
    }
    Ok(Value::array(kept))
}

/// Object from each key (the callback result in display form) to the
/// elements producing it.
fn group_by(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let items = call.array_arg(0)?.borrow().clone();
    let key_of = call.callable_arg(1)?;
    let mut groups = ObjectMap::new();
    for (i, item) in items.into_iter().enumerate() {
        let key = call_element(host, key_of, item.clone(), i)?.display_value();
        match groups.get(&key) {
            Some(Value::Array(group)) => group.borrow_mut().push(item),
            _ => {
                groups.insert(key, Value::array(vec![item]));
            }
        }
    }
    Ok(Value::object(groups))
}

fn count_by(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let items = call.array_arg(0)?.borrow().clone();
    let key_of = call.callable_arg(1)?;
    let mut counts: ObjectMap = ObjectMap::new();
    for (i, item) in items.into_iter().enumerate() {
        let key = call_element(host, key_of, item, i)?.display_value();
        let count = counts.get(&key).and_then(Value::as_number).unwrap_or(0.0);
        counts.insert(key, Value::number(count + 1.0));
    }
    Ok(Value::object(counts))
}

/// Pairs `[a[i], b[i]]`, as long as the shorter input.
fn zip(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let left = call.array_arg(0)?.borrow();
    let right = call.array_arg(1)?.borrow();
    let pairs = left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| Value::array(vec![a.clone(), b.clone()]))
        .collect();
    Ok(Value::array(pairs))
}
