//! Globals bound in every program: output, conversions and math.

use tal_eval::{
    invalid_value, wrong_arg_type, Arity, Capability, EvalResult, HostContext, NativeCall,
    NativeDescriptor, Value,
};

natives! {
    module = "";
    PRINT = "print", Arity::AtLeast(0), Capability::PRINT => print;
    LEN = "len", Arity::Exact(1), Capability::empty() => len;
    STR = "str", Arity::Exact(1), Capability::empty() => to_str;
    TYPE_OF = "type_of", Arity::Exact(1), Capability::empty() => type_of;
    FLOOR = "floor", Arity::Exact(1), Capability::empty() => floor;
    CEIL = "ceil", Arity::Exact(1), Capability::empty() => ceil;
    ROUND = "round", Arity::Range(1, 2), Capability::empty() => round;
    ABS = "abs", Arity::Exact(1), Capability::empty() => abs;
    SQRT = "sqrt", Arity::Exact(1), Capability::empty() => sqrt;
    POW = "pow", Arity::Exact(2), Capability::empty() => pow;
    MIN = "min", Arity::AtLeast(1), Capability::empty() => min;
    MAX = "max", Arity::AtLeast(1), Capability::empty() => max;
}

pub(crate) static GLOBALS: &[&NativeDescriptor] = &[
    &PRINT, &LEN, &STR, &TYPE_OF, &FLOOR, &CEIL, &ROUND, &ABS, &SQRT, &POW, &MIN, &MAX,
];

fn print(host: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let line = call
        .args()
        .iter()
        .map(Value::display_value)
        .collect::<Vec<_>>()
        .join(" ");
    host.print(&line);
    Ok(Value::Null)
}

fn len(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let count = match &call.arg(0) {
        Value::Str(s) => s.chars().count(),
        Value::Array(a) => a.borrow().len(),
        Value::Object(o) => o.borrow().len(),
        other => {
            return Err(wrong_arg_type("len", 0, "string, array or object", other.type_name()).into())
        }
    };
    Ok(Value::int(count as i64))
}

fn to_str(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::string(call.arg(0).display_value()))
}

fn type_of(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::string(call.arg(0).type_name()))
}

fn floor(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::number(call.number_arg(0)?.floor()))
}

fn ceil(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::number(call.number_arg(0)?.ceil()))
}

/// `round(x)` rounds half away from zero; `round(x, digits)` keeps
/// `digits` decimal places.
fn round(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let n = call.number_arg(0)?;
    let Some(digits) = call.opt_arg(1).map(|_| call.int_arg(1)).transpose()? else {
        return Ok(Value::number(n.round()));
    };
    if !(0..=15).contains(&digits) {
        return Err(invalid_value(format!("round: digits must be between 0 and 15, got {digits}")).into());
    }
    let scale = 10f64.powi(digits as i32);
    Ok(Value::number((n * scale).round() / scale))
}

fn abs(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::number(call.number_arg(0)?.abs()))
}

fn sqrt(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let n = call.number_arg(0)?;
    if n < 0.0 {
        return Err(invalid_value(format!("sqrt of negative number {}", tal_eval::format_number(n))).into());
    }
    Ok(Value::number(n.sqrt()))
}

fn pow(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::number(call.number_arg(0)?.powf(call.number_arg(1)?)))
}

fn min(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    extreme(call, |candidate, best| candidate < best)
}

fn max(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    extreme(call, |candidate, best| candidate > best)
}

/// Shared body of `min`/`max`: either several numbers or one array of them.
fn extreme(call: NativeCall<'_>, better: fn(f64, f64) -> bool) -> EvalResult {
    let name = call.descriptor().name;
    let values = match call.args() {
        [Value::Array(items)] => items.borrow().clone(),
        args => args.to_vec(),
    };
    let mut best: Option<f64> = None;
    for (i, value) in values.iter().enumerate() {
        let Value::Number(n) = value else {
            return Err(wrong_arg_type(name, i, "number", value.type_name()).into());
        };
        match best {
            Some(b) if !better(*n, b) => {}
            _ => best = Some(*n),
        }
    }
    best.map(Value::number)
        .ok_or_else(|| invalid_value(format!("{name} of an empty array")).into())
}
