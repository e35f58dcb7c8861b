#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::test_helpers::{s, show, TestHost};
use pretty_assertions::assert_eq;
use tal_eval::{Capability, CapabilityPolicy};

fn method(object: &Value, name: &str) -> Value {
    object.get(name).unwrap()
}

#[test]
fn compile_returns_a_pattern_object() {
    let mut host = TestHost::new();
    let pattern = host.ok(&COMPILE, vec![s(r"\d+"), s("mi")]);
    assert_eq!(pattern.get("source"), Some(s(r"\d+")));
    assert_eq!(pattern.get("flags"), Some(s("im")));
    assert_eq!(pattern.type_name(), "object");

    let text = "order 66 shipped in 3 days";
    let test = method(&pattern, "test");
    assert_eq!(host.invoke(&test, vec![s(text)]).unwrap(), Value::bool(true));
    let first = method(&pattern, "find_first");
    assert_eq!(host.invoke(&first, vec![s(text)]).unwrap(), s("66"));
    let all = method(&pattern, "find_all");
    assert_eq!(show(&host.invoke(&all, vec![s(text)]).unwrap()), r#"["66", "3"]"#);
    assert_eq!(host.invoke(&first, vec![s("none")]).unwrap(), Value::Null);
}

#[test]
fn pattern_methods_replace_and_split() {
    let mut host = TestHost::new();
    let words = host.ok(&COMPILE, vec![s(r"(\w+)@(\w+)")]);
    let replace = method(&words, "replace_all");
    let swapped = host.invoke(&replace, vec![s("alice@home bob@work"), s("$2:$1")]).unwrap();
    assert_eq!(swapped, s("home:alice work:bob"));

    let separators = host.ok(&COMPILE, vec![s(r"\s*[,;]\s*")]);
    let split = method(&separators, "split");
    let parts = host.invoke(&split, vec![s("a , b;c")]).unwrap();
    assert_eq!(show(&parts), r#"["a", "b", "c"]"#);
}

#[test]
fn case_insensitive_returns_a_new_pattern() {
    let mut host = TestHost::new();
    let pattern = host.ok(&COMPILE, vec![s("hello")]);
    let strict = method(&pattern, "test");
    assert_eq!(host.invoke(&strict, vec![s("HELLO")]).unwrap(), Value::bool(false));

    let make_loose = method(&pattern, "case_insensitive");
    let loose = host.invoke(&make_loose, vec![]).unwrap();
    assert!(!loose.same_ref(&pattern));
    assert_eq!(loose.get("flags"), Some(s("i")));
    let loose_test = method(&loose, "test");
    assert_eq!(host.invoke(&loose_test, vec![s("HELLO")]).unwrap(), Value::bool(true));
}

#[test]
fn module_functions_take_strings_or_pattern_objects() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&TEST, vec![s("^a.c$"), s("abc")]), Value::bool(true));
    let pattern = host.ok(&COMPILE, vec![s("[aeiou]"), s("i")]);
    assert_eq!(host.ok(&FIND_FIRST, vec![pattern.clone(), s("xYzA")]), s("A"));
    assert_eq!(show(&host.ok(&FIND_ALL, vec![pattern.clone(), s("Banana")])), r#"["a", "a", "a"]"#);
    assert_eq!(host.ok(&REPLACE_ALL, vec![pattern, s("Banana"), s("_")]), s("B_n_n_"));

    let (kind, message) = host.fail(&TEST, vec![Value::int(3), s("abc")]);
    assert_eq!(kind, "TypeError");
    assert_eq!(message, "regex.test expects a pattern or string as argument 1, got number");
    let not_a_pattern = Value::object_from([("source", s("a"))]);
    assert_eq!(host.fail(&TEST, vec![not_a_pattern, s("a")]).0, "TypeError");
}

#[test]
fn compile_rejects_bad_patterns() {
    let mut host = TestHost::new();
    let (kind, message) = host.fail(&COMPILE, vec![s("(a+)+$")]);
    assert_eq!(kind, "ValueError");
    assert_eq!(message, r#"pattern "(a+)+$" may cause catastrophic backtracking"#);

    let (kind, message) = host.fail(&COMPILE, vec![s("(unclosed")]);
    assert_eq!(kind, "ValueError");
    assert!(message.starts_with(r#"invalid regex "(unclosed""#), "{message}");

    let (kind, message) = host.fail(&COMPILE, vec![s("a"), s("q")]);
    assert_eq!(kind, "ValueError");
    assert_eq!(message, "unknown regex flag 'q'");
}

#[test]
fn escape_quotes_metacharacters() {
    let mut host = TestHost::new();
    let escaped = host.ok(&ESCAPE, vec![s("1+1=2?")]);
    assert_eq!(escaped, s(r"1\+1=2\?"));
    assert_eq!(host.ok(&TEST, vec![escaped, s("is 1+1=2?")]), Value::bool(true));
}

#[test]
fn is_valid_pattern_screens_input() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&IS_VALID_PATTERN, vec![s(r"^\w+@\w+\.com$")]), Value::bool(true));
    assert_eq!(host.ok(&IS_VALID_PATTERN, vec![s("(x+x+)+y")]), Value::bool(false));
    assert_eq!(host.ok(&IS_VALID_PATTERN, vec![s("[")]), Value::bool(false));
}

#[test]
fn is_valid_pattern_needs_security() {
    let policy = CapabilityPolicy::allow_all().without(Capability::SECURITY);
    let mut host = TestHost::with_policy(policy);
    assert_eq!(host.ok(&TEST, vec![s("a"), s("a")]), Value::bool(true));
    assert_eq!(host.fail(&IS_VALID_PATTERN, vec![s("a")]).0, "CapabilityError");
}

#[test]
fn bound_methods_are_capability_checked() {
    let mut host = TestHost::new();
    let pattern = host.ok(&COMPILE, vec![s("a")]);
    host.interpreter
        .set_policy(CapabilityPolicy::allow_all().without(Capability::REGEX));
    let test = method(&pattern, "test");
    let (kind, message) = crate::test_helpers::describe(host.invoke(&test, vec![s("a")]).unwrap_err());
    assert_eq!(kind, "CapabilityError");
    assert_eq!(message, "pattern.test requires capability 'regex', which is not granted");
}
