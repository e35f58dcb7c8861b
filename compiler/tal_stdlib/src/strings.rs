//! The `string` module.
//!
//! Positions and lengths count Unicode scalar values, not bytes.

use crate::security;
use tal_eval::{
    index_out_of_bounds, invalid_value, Arity, Capability, EvalResult, HostContext, ModuleDef,
    NativeCall, Value,
};

/// Longest string `repeat` and the padding functions will build.
const MAX_BUILT_LEN: usize = 1 << 24;

const SCREEN: Capability = Capability::STRING.union(Capability::SECURITY);

natives! {
    module = "string";
    UPPER = "upper", Arity::Exact(1), Capability::STRING => upper;
    LOWER = "lower", Arity::Exact(1), Capability::STRING => lower;
    TRIM = "trim", Arity::Exact(1), Capability::STRING => trim;
    SPLIT = "split", Arity::Exact(2), Capability::STRING => split;
    JOIN = "join", Arity::Range(1, 2), Capability::STRING => join;
    REPLACE = "replace", Arity::Exact(3), Capability::STRING => replace;
    CONTAINS = "contains", Arity::Exact(2), Capability::STRING => contains;
    STARTS_WITH = "starts_with", Arity::Exact(2), Capability::STRING => starts_with;
    ENDS_WITH = "ends_with", Arity::Exact(2), Capability::STRING => ends_with;
    LENGTH = "length", Arity::Exact(1), Capability::STRING => length;
    SUBSTRING = "substring", Arity::Range(2, 3), Capability::STRING => substring;
    REPEAT = "repeat", Arity::Exact(2), Capability::STRING => repeat;
    REVERSE = "reverse", Arity::Exact(1), Capability::STRING => reverse;
    INDEX_OF = "index_of", Arity::Exact(2), Capability::STRING => index_of;
    PAD_LEFT = "pad_left", Arity::Range(2, 3), Capability::STRING => pad_left;
    PAD_RIGHT = "pad_right", Arity::Range(2, 3), Capability::STRING => pad_right;
    IS_EMPTY = "is_empty", Arity::Exact(1), Capability::STRING => is_empty;
    CHAR_AT = "char_at", Arity::Exact(2), Capability::STRING => char_at;
    SQL_INJECTION = "contains_sql_injection_patterns", Arity::Exact(1), SCREEN => sql_injection;
    XSS = "contains_xss_patterns", Arity::Exact(1), SCREEN => xss;
    ESCAPE_HTML = "escape_html", Arity::Exact(1), SCREEN => escape_html;
}

pub(crate) fn module() -> ModuleDef {
    ModuleDef::new(
        "string",
        &[
            &UPPER, &LOWER, &TRIM, &SPLIT, &JOIN, &REPLACE, &CONTAINS, &STARTS_WITH, &ENDS_WITH,
            &LENGTH, &SUBSTRING, &REPEAT, &REVERSE, &INDEX_OF, &PAD_LEFT, &PAD_RIGHT, &IS_EMPTY,
            &CHAR_AT, &SQL_INJECTION, &XSS, &ESCAPE_HTML,
        ],
    )
}

fn upper(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::string(call.str_arg(0)?.to_uppercase()))
}

fn lower(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::string(call.str_arg(0)?.to_lowercase()))
}

fn trim(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::string(call.str_arg(0)?.trim()))
}

/// `split(s, sep)`; an empty separator splits into characters.
fn split(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let (s, sep) = (call.str_arg(0)?, call.str_arg(1)?);
    let parts = if sep.is_empty() {
        s.chars().map(|c| Value::string(c.encode_utf8(&mut [0; 4]))).collect()
    } else {
        s.split(sep).map(Value::string).collect()
    };
    Ok(Value::array(parts))
}

/// `join(array, sep = "")`; elements render in display form.
fn join(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let items = call.array_arg(0)?;
    let sep = match call.opt_arg(1) {
        Some(_) => call.str_arg(1)?,
        None => "",
    };
    let joined = items
        .borrow()
        .iter()
        .map(Value::display_value)
        .collect::<Vec<_>>()
        .join(sep);
    Ok(Value::string(joined))
}

/// Replace every occurrence.
fn replace(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let (s, from, to) = (call.str_arg(0)?, call.str_arg(1)?, call.str_arg(2)?);
    if from.is_empty() {
        return Err(invalid_value("string.replace: pattern must not be empty").into());
    }
    Ok(Value::string(s.replace(from, to)))
}

fn contains(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::bool(call.str_arg(0)?.contains(call.str_arg(1)?)))
}

fn starts_with(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::bool(call.str_arg(0)?.starts_with(call.str_arg(1)?)))
}

fn ends_with(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::bool(call.str_arg(0)?.ends_with(call.str_arg(1)?)))
}

fn length(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::int(call.str_arg(0)?.chars().count() as i64))
}

/// `substring(s, start, end = length)`, clamped to the string.
fn substring(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let s = call.str_arg(0)?;
    let count = s.chars().count() as i64;
    let start = call.int_arg(1)?.clamp(0, count);
    let end = match call.opt_arg(2) {
        Some(_) => call.int_arg(2)?.clamp(0, count),
        None => count,
    };
    if start >= end {
        return Ok(Value::string(""));
    }
    let taken: String = s
        .chars()
        .skip(start as usize)
        .take((end - start) as usize)
        .collect();
    Ok(Value::string(taken))
}

fn repeat(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let s = call.str_arg(0)?;
    let times = call.int_arg(1)?;
    let Ok(times) = usize::try_from(times) else {
        return Err(invalid_value(format!("string.repeat: count must not be negative, got {times}")).into());
    };
    if s.len().saturating_mul(times) > MAX_BUILT_LEN {
        return Err(invalid_value("string.repeat: result too large").into());
    }
    Ok(Value::string(s.repeat(times)))
}

fn reverse(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::string(call.str_arg(0)?.chars().rev().collect::<String>()))
}

/// Character position of the first occurrence, or -1.
fn index_of(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let (s, needle) = (call.str_arg(0)?, call.str_arg(1)?);
    let position = s
        .find(needle)
        .map_or(-1, |byte| s[..byte].chars().count() as i64);
    Ok(Value::int(position))
}

fn pad_left(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    pad(call, true)
}

fn pad_right(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    pad(call, false)
}

/// `pad_*(s, width, fill = " ")`; `fill` must be a single character.
fn pad(call: NativeCall<'_>, left: bool) -> EvalResult {
    let s = call.str_arg(0)?;
    let width = usize::try_from(call.int_arg(1)?).unwrap_or(0);
    let fill = match call.opt_arg(2) {
        Some(_) => {
            let fill = call.str_arg(2)?;
            let mut chars = fill.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(invalid_value(format!(
                        "{}: fill must be a single character, got {fill:?}",
                        call.descriptor().qualified_name()
                    ))
                    .into())
                }
            }
        }
        None => ' ',
    };
    if width > MAX_BUILT_LEN {
        return Err(invalid_value("padding width too large").into());
    }
    let missing = width.saturating_sub(s.chars().count());
    let padding: String = std::iter::repeat(fill).take(missing).collect();
    Ok(Value::string(if left {
        padding + s
    } else {
        format!("{s}{padding}")
    }))
}

fn is_empty(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::bool(call.str_arg(0)?.is_empty()))
}

fn char_at(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let s = call.str_arg(0)?;
    let index = call.int_arg(1)?;
    usize::try_from(index)
        .ok()
        .and_then(|i| s.chars().nth(i))
        .map(|c| Value::string(c.encode_utf8(&mut [0; 4])))
        .ok_or_else(|| index_out_of_bounds(index, s.chars().count()).into())
}

fn sql_injection(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::bool(security::contains_sql_injection_patterns(call.str_arg(0)?)))
}

fn xss(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::bool(security::contains_xss_patterns(call.str_arg(0)?)))
}

fn escape_html(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::string(security::escape_html(call.str_arg(0)?)))
}

#[cfg(test)]
mod tests;
