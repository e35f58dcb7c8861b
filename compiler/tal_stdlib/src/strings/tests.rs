use super::*;
use crate::test_helpers::{n, s, show, strings, TestHost};
use pretty_assertions::assert_eq;
use tal_eval::{Capability, CapabilityPolicy};

#[test]
fn case_and_trim() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&UPPER, vec![s("hello")]), s("HELLO"));
    assert_eq!(host.ok(&LOWER, vec![s("MiXeD")]), s("mixed"));
    assert_eq!(host.ok(&TRIM, vec![s("  padded \n")]), s("padded"));
}

#[test]
fn split_and_join() {
    let mut host = TestHost::new();
    let parts = host.ok(&SPLIT, vec![s("a,b,,c"), s(",")]);
    assert_eq!(show(&parts), r#"["a", "b", "", "c"]"#);
    assert_eq!(show(&host.ok(&SPLIT, vec![s("héy"), s("")])), r#"["h", "é", "y"]"#);

    assert_eq!(host.ok(&JOIN, vec![parts, s("-")]), s("a-b--c"));
    let mixed = Value::array(vec![n(1.0), Value::bool(false), s("x")]);
    assert_eq!(host.ok(&JOIN, vec![mixed]), s("1falsex"));
}

#[test]
fn replace_all_occurrences() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&REPLACE, vec![s("a.b.c"), s("."), s("::")]), s("a::b::c"));
    assert_eq!(host.fail(&REPLACE, vec![s("abc"), s(""), s("x")]).0, "ValueError");
}

#[test]
fn predicates() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&CONTAINS, vec![s("haystack"), s("st")]), Value::bool(true));
    assert_eq!(host.ok(&STARTS_WITH, vec![s("haystack"), s("hay")]), Value::bool(true));
    assert_eq!(host.ok(&ENDS_WITH, vec![s("haystack"), s("hay")]), Value::bool(false));
    assert_eq!(host.ok(&IS_EMPTY, vec![s("")]), Value::bool(true));
}

#[test]
fn positions_count_characters() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&LENGTH, vec![s("naïve")]), n(5.0));
    assert_eq!(host.ok(&INDEX_OF, vec![s("naïve"), s("v")]), n(3.0));
    assert_eq!(host.ok(&INDEX_OF, vec![s("naïve"), s("z")]), n(-1.0));
    assert_eq!(host.ok(&CHAR_AT, vec![s("naïve"), n(2.0)]), s("ï"));

    let (kind, message) = host.fail(&CHAR_AT, vec![s("abc"), n(3.0)]);
    assert_eq!(kind, "IndexError");
    assert_eq!(message, "index 3 out of bounds for length 3");
}

#[test]
fn substring_clamps_to_the_string() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&SUBSTRING, vec![s("hello world"), n(6.0)]), s("world"));
    assert_eq!(host.ok(&SUBSTRING, vec![s("hello"), n(1.0), n(3.0)]), s("el"));
    assert_eq!(host.ok(&SUBSTRING, vec![s("hello"), n(-5.0), n(99.0)]), s("hello"));
    assert_eq!(host.ok(&SUBSTRING, vec![s("hello"), n(4.0), n(2.0)]), s(""));
}

#[test]
fn repeat_and_reverse() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&REPEAT, vec![s("ab"), n(3.0)]), s("ababab"));
    assert_eq!(host.ok(&REPEAT, vec![s("ab"), n(0.0)]), s(""));
    let (kind, message) = host.fail(&REPEAT, vec![s("ab"), n(-1.0)]);
    assert_eq!(kind, "ValueError");
    assert_eq!(message, "string.repeat: count must not be negative, got -1");
    assert_eq!(host.fail(&REPEAT, vec![s("ab"), n(1.5)]).0, "TypeError");
    assert_eq!(host.ok(&REVERSE, vec![s("abč")]), s("čba"));
}

#[test]
fn padding() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&PAD_LEFT, vec![s("7"), n(3.0), s("0")]), s("007"));
    assert_eq!(host.ok(&PAD_RIGHT, vec![s("ab"), n(4.0)]), s("ab  "));
    assert_eq!(host.ok(&PAD_LEFT, vec![s("long"), n(2.0)]), s("long"));
    assert_eq!(host.fail(&PAD_LEFT, vec![s("x"), n(3.0), s("ab")]).0, "ValueError");
}

#[test]
fn security_screens() {
    let mut host = TestHost::new();
    assert_eq!(
        host.ok(&SQL_INJECTION, vec![s("' OR '1'='1")]),
        Value::bool(true)
    );
    assert_eq!(host.ok(&SQL_INJECTION, vec![s("alice")]), Value::bool(false));
    assert_eq!(
        host.ok(&XSS, vec![s("<script>alert(1)</script>")]),
        Value::bool(true)
    );
    assert_eq!(host.ok(&ESCAPE_HTML, vec![s("<b>")]), s("&lt;b&gt;"));
}

#[test]
fn security_screens_need_both_capabilities() {
    let policy = CapabilityPolicy::deny_all().with(Capability::STRING);
    let mut host = TestHost::with_policy(policy);
    assert_eq!(host.ok(&UPPER, vec![s("ok")]), s("OK"));
    let (kind, message) = host.fail(&XSS, vec![s("<script>")]);
    assert_eq!(kind, "CapabilityError");
    assert_eq!(
        message,
        "string.contains_xss_patterns requires capability 'security', which is not granted"
    );
}

#[test]
fn wrong_argument_types_name_the_function() {
    let mut host = TestHost::new();
    let (kind, message) = host.fail(&JOIN, vec![s("abc"), s(",")]);
    assert_eq!(kind, "TypeError");
    assert_eq!(message, "string.join expects an array as argument 1, got string");
    assert_eq!(show(&strings(&["x"])), r#"["x"]"#);
}
