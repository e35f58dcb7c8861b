//! The `datetime` module and timestamp objects.
//!
//! All instants are UTC. A timestamp object carries its `timestamp`
//! (seconds since the Unix epoch, millisecond precision) plus methods that
//! share the instant as their bound state.

use chrono::{
    DateTime, Datelike, Days, NaiveDate, SecondsFormat, TimeZone, Utc, Weekday,
};
use tal_eval::{
    invalid_value, wrong_arg_type, Arity, Capability, EvalError, EvalResult, HostContext,
    ModuleDef, NativeCall, NativeDescriptor, NativeState, Value,
};

natives! {
    module = "datetime";
    NOW = "now", Arity::Exact(0), Capability::CLOCK => now;
    FROM_TIMESTAMP = "from_timestamp", Arity::Exact(1), Capability::CLOCK => from_timestamp;
    CREATE = "create", Arity::Exact(3), Capability::CLOCK => create;
    PARSE = "parse", Arity::Exact(1), Capability::CLOCK => parse;
}

natives! {
    module = "timestamp";
    YEAR = "year", Arity::Exact(0), Capability::CLOCK => year;
    MONTH = "month", Arity::Exact(0), Capability::CLOCK => month;
    DAY = "day", Arity::Exact(0), Capability::CLOCK => day;
    WEEKDAY = "weekday", Arity::Exact(0), Capability::CLOCK => weekday;
    ADD_DAYS = "add_days", Arity::Exact(1), Capability::CLOCK => add_days;
    TO_DATE_STRING = "to_date_string", Arity::Exact(0), Capability::CLOCK => to_date_string;
    TO_ISO_STRING = "to_iso_string", Arity::Exact(0), Capability::CLOCK => to_iso_string;
    DAYS_UNTIL = "days_until", Arity::Exact(1), Capability::CLOCK => days_until;
    IS_BEFORE = "is_before", Arity::Exact(1), Capability::CLOCK => is_before;
    IS_AFTER = "is_after", Arity::Exact(1), Capability::CLOCK => is_after;
}

pub(crate) fn module() -> ModuleDef {
    ModuleDef::new("datetime", &[&NOW, &FROM_TIMESTAMP, &CREATE, &PARSE])
}

/// Native state behind a timestamp object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Instant(DateTime<Utc>);

fn timestamp_object(instant: Instant) -> Value {
    let seconds = instant.0.timestamp_millis() as f64 / 1000.0;
    let state = NativeState::new(instant);
    let method =
        |descriptor: &'static NativeDescriptor| Value::native_bound(descriptor, state.clone());
    Value::object_from([
        ("timestamp", Value::number(seconds)),
        ("year", method(&YEAR)),
        ("month", method(&MONTH)),
        ("day", method(&DAY)),
        ("weekday", method(&WEEKDAY)),
        ("add_days", method(&ADD_DAYS)),
        ("to_date_string", method(&TO_DATE_STRING)),
        ("to_iso_string", method(&TO_ISO_STRING)),
        ("days_until", method(&DAYS_UNTIL)),
        ("is_before", method(&IS_BEFORE)),
        ("is_after", method(&IS_AFTER)),
    ])
}

/// The instant a bound method was created for.
fn bound(call: NativeCall<'_>) -> Result<Instant, EvalError> {
    call.state::<Instant>().copied()
}

/// Argument `i` as a timestamp object.
fn instant_arg(call: NativeCall<'_>, i: usize) -> Result<Instant, EvalError> {
    let value = call.arg(i);
    let instant = match value.get("year") {
        Some(Value::Native(method)) if std::ptr::eq(method.descriptor(), &YEAR) => method
            .receiver()
            .and_then(|state| state.downcast::<Instant>())
            .copied(),
        _ => None,
    };
    instant.ok_or_else(|| {
            wrong_arg_type(
                &call.descriptor().qualified_name(),
                i,
                "timestamp",
                value.type_name(),
            )
        })
}

fn now(_: &mut dyn HostContext, _: NativeCall<'_>) -> EvalResult {
    Ok(timestamp_object(Instant(Utc::now())))
}

/// `from_timestamp(seconds)`; fractions are kept to the millisecond.
fn from_timestamp(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let seconds = call.number_arg(0)?;
    let millis = (seconds * 1000.0).round();
    let at = if millis.is_finite() && millis.abs() < i64::MAX as f64 {
        Utc.timestamp_millis_opt(millis as i64).single()
    } else {
        None
    };
    let at = at.ok_or_else(|| invalid_value(format!("timestamp {seconds} is out of range")))?;
    Ok(timestamp_object(Instant(at)))
}

/// `create(year, month, day)` at midnight UTC.
fn create(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let (year, month, day) = (call.int_arg(0)?, call.int_arg(1)?, call.int_arg(2)?);
    let at = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((y, m), d)| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single())
        .ok_or_else(|| invalid_value(format!("invalid date {year}-{month}-{day}")))?;
    Ok(timestamp_object(Instant(at)))
}

/// `parse(text)`: RFC 3339 (`2024-03-01T12:30:00Z`) or a bare
/// `YYYY-MM-DD` date at midnight UTC.
fn parse(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let text = call.str_arg(0)?.trim();
    let at = DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
        .ok_or_else(|| invalid_value(format!("cannot parse {text:?} as a date")))?;
    Ok(timestamp_object(Instant(at)))
}

fn year(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::int(i64::from(bound(call)?.0.year())))
}

fn month(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::int(i64::from(bound(call)?.0.month())))
}

fn day(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    Ok(Value::int(i64::from(bound(call)?.0.day())))
}

/// English weekday name (`"Monday"`).
fn weekday(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let name = match bound(call)?.0.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    };
    Ok(Value::string(name))
}

/// A new timestamp `n` calendar days later (earlier when negative).
fn add_days(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let Instant(at) = bound(call)?;
    let n = call.int_arg(0)?;
    let days = Days::new(n.unsigned_abs());
    let shifted = if n >= 0 {
        at.checked_add_days(days)
    } else {
        at.checked_sub_days(days)
    };
    let shifted = shifted.ok_or_else(|| invalid_value(format!("adding {n} days is out of range")))?;
    Ok(timestamp_object(Instant(shifted)))
}

fn to_date_string(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let Instant(at) = bound(call)?;
    Ok(Value::string(at.format("%Y-%m-%d").to_string()))
}

/// RFC 3339 with milliseconds and a `Z` suffix.
fn to_iso_string(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let Instant(at) = bound(call)?;
    Ok(Value::string(at.to_rfc3339_opts(SecondsFormat::Millis, true)))
}

/// Calendar days from this date to `other`'s; negative when `other` is
/// earlier.
fn days_until(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let Instant(from) = bound(call)?;
    let Instant(to) = instant_arg(call, 0)?;
    let days = to.date_naive().signed_duration_since(from.date_naive()).num_days();
    Ok(Value::int(days))
}

fn is_before(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let Instant(this) = bound(call)?;
    let Instant(other) = instant_arg(call, 0)?;
    Ok(Value::bool(this < other))
}

fn is_after(_: &mut dyn HostContext, call: NativeCall<'_>) -> EvalResult {
    let Instant(this) = bound(call)?;
    let Instant(other) = instant_arg(call, 0)?;
    Ok(Value::bool(this > other))
}
