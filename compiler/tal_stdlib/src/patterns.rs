//! The `regex` module and pattern objects.
//!
//! `regex.compile` returns a pattern object: an ordinary object carrying
//! `source` and `flags` plus methods that share the compiled regex as their
//! bound state. Module-level functions accept either a pattern object or a
//! source string.

use crate::security::is_catastrophic_pattern;
use regex::{Regex, RegexBuilder};
use tal_eval::{
    invalid_value, wrong_arg_type, Arity, Capability, EvalError, EvalResult, HostContext,
    ModuleDef, NativeCall, NativeDescriptor, NativeState, Value,
};

/// Compiled program size cap handed to the regex engine.
const SIZE_LIMIT: usize = 1 << 20;

const SCREEN: Capability = Capability::REGEX.union(Capability::SECURITY);

natives! {
    module = "regex";
    COMPILE = "compile", Arity::Range(1, 2), Capability::REGEX => compile;
    TEST = "test", Arity::Exact(2), Capability::REGEX => test;
    FIND_FIRST = "find_first", Arity::Exact(2), Capability::REGEX => find_first;
    FIND_ALL = "find_all", Arity::Exact(2), Capability::REGEX => find_all;
    REPLACE_ALL = "replace_all", Arity::Exact(3), Capability::REGEX => replace_all;
    ESCAPE = "escape", Arity::Exact(1), Capability::REGEX => escape;
    IS_VALID_PATTERN = "is_valid_pattern", Arity::Exact(1), SCREEN => is_valid_pattern;
}

natives! {
    module = "pattern";
    METHOD_TEST = "test", Arity::Exact(1), Capability::REGEX => method_test;
    METHOD_FIND_FIRST = "find_first", Arity::Exact(1), Capability::REGEX => method_find_first;
    METHOD_FIND_ALL = "find_all", Arity::Exact(1), Capability::REGEX => method_find_all;
    METHOD_REPLACE_ALL = "replace_all", Arity::Exact(2), Capability::REGEX => method_replace_all;
    METHOD_SPLIT = "split", Arity::Exact(1), Capability::REGEX => method_split;
    METHOD_CASE_INSENSITIVE = "case_insensitive", Arity::Exact(0), Capability::REGEX => method_case_insensitive;
}

pub(crate) fn module() -> ModuleDef {
    ModuleDef::new(
        "regex",
        &[
            &COMPILE, &TEST, &FIND_FIRST, &FIND_ALL, &REPLACE_ALL, &ESCAPE, &IS_VALID_PATTERN,
        ],
    )
}

/// Native state behind a pattern object.
#[derive(Clone, Debug)]
struct CompiledPattern {
    source: String,
    /// Normalized flag letters, a subset of `imsx` in that order.
    flags: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile `source` with `flags`, rejecting catastrophic shapes.
    fn new(source: &str, flags: &str) -> Result<Self, EvalError> {
        let mut builder = RegexBuilder::new(source);
        builder.size_limit(SIZE_LIMIT);
        let mut normalized = String::new();
        for flag in ['i', 'm', 's', 'x'] {
            if flags.contains(flag) {
                normalized.push(flag);
            }
        }
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                other => {
                    return Err(invalid_value(format!("unknown regex flag '{other}'")));
                }
            }
        }
        if is_catastrophic_pattern(source) {
            tracing::warn!(pattern = source, "rejected catastrophic regex");
            return Err(invalid_value(format!(
                "pattern {source:?} may cause catastrophic backtracking"
            )));
        }
        let regex = builder
            .build()
            .map_err(|err| invalid_value(format!("invalid regex {source:?}: {err}")))?;
        Ok(CompiledPattern {
            source: source.to_string(),
            flags: normalized,
            regex,
        })
    }

    fn test(&self, text: &str) -> Value {
        Value::bool(self.regex.is_match(text))
    }

    fn find_first(&self, text: &str) -> Value {
        self.regex
            .find(text)
            .map_or(Value::Null, |m| Value::string(m.as_str()))
    }

    fn find_all(&self, text: &str) -> Value {
        Value::array(
            self.regex
                .find_iter(text)
                .map(|m| Value::string(m.as_str()))
                .collect(),
        )
    }

    /// `$1` and `$name` in `replacement` expand to capture groups.
    fn replace_all(&self, text: &str, replacement: &str) -> Value {
        Value::string(self.regex.replace_all(text, replacement))
    }

    fn split(&self, text: &str) -> Value {
        Value::array(self.regex.split(text).map(Value::string).collect())
    }
}

/// Build the script-facing object for `pattern`.
fn pattern_object(pattern: CompiledPattern) -> Value {
    let source = Value::string(&pattern.source);
    let flags = Value::string(&pattern.flags);
    let state = NativeState::new(pattern);
    let method =
        |descriptor: &'static NativeDescriptor| Value::native_bound(descriptor, state.clone());
    Value::object_from([
        ("source", source),
        ("flags", flags),
        ("test", method(&METHOD_TEST)),
        ("find_first", method(&METHOD_FIND_FIRST)),
        ("find_all", method(&METHOD_FIND_ALL)),
        ("replace_all", method(&METHOD_REPLACE_ALL)),
        ("split", method(&METHOD_SPLIT)),
        ("case_insensitive", method(&METHOD_CASE_INSENSITIVE)),
    ])
}

/// The pattern a bound method was created for.
fn bound<'a>(call: NativeCall<'a>) -> Result<&'a CompiledPattern, EvalError> {
    call.state::<CompiledPattern>()
}

/// Argument `i` as a pattern: a source string or a pattern object.
fn pattern_arg(call: NativeCall<'_>, i: usize) -> Result<CompiledPattern, EvalError> {
    let value = call.arg(i);
    if let Value::Str(source) = &value {
        return CompiledPattern::new(source, "");
    }
    let pattern = match value.get("test") {
        Some(Value::Native(method)) if std::ptr::eq(method.descriptor(), &METHOD_TEST) => method
            .receiver()
            .and_then(|state| state.downcast::<CompiledPattern>())
            .cloned(),
        _ => None,
    };
    pattern.ok_or_else(|| {
            wrong_arg_type(
                &call.descriptor().qualified_name(),
                i,
                "pattern or string",
                value.type_name(),
            )
        })
}

/// `compile(source, flags = "")`.
fn compile(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let source = call.str_arg(0)?;
    let flags = match call.opt_arg(1) {
        Some(_) => call.str_arg(1)?,
        None => "",
    };
    let pattern = CompiledPattern::new(source, flags)?;
    tracing::trace!(pattern = source, flags, "compiled regex");
    Ok(pattern_object(pattern))
}

fn test(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(pattern_arg(call, 0)?.test(call.str_arg(1)?))
}

fn find_first(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(pattern_arg(call, 0)?.find_first(call.str_arg(1)?))
}

fn find_all(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(pattern_arg(call, 0)?.find_all(call.str_arg(1)?))
}

/// `replace_all(pattern, text, replacement)`.
fn replace_all(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let pattern = pattern_arg(call, 0)?;
    Ok(pattern.replace_all(call.str_arg(1)?, call.str_arg(2)?))
}

fn escape(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::string(regex::escape(call.str_arg(0)?)))
}

/// Whether `source` compiles and is free of catastrophic shapes.
fn is_valid_pattern(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::bool(CompiledPattern::new(call.str_arg(0)?, "").is_ok()))
}

fn method_test(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(bound(call)?.test(call.str_arg(0)?))
}

fn method_find_first(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(bound(call)?.find_first(call.str_arg(0)?))
}

fn method_find_all(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(bound(call)?.find_all(call.str_arg(0)?))
}

fn method_replace_all(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(bound(call)?.replace_all(call.str_arg(0)?, call.str_arg(1)?))
}

fn method_split(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(bound(call)?.split(call.str_arg(0)?))
}

/// A new pattern object with the `i` flag added.
fn method_case_insensitive(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let pattern = bound(call)?;
    let flags = format!("{}i", pattern.flags);
    let insensitive = CompiledPattern::new(&pattern.source, &flags)?;
    Ok(pattern_object(insensitive))
}

#[cfg(test)]
mod tests;
