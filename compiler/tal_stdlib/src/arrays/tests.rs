#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::test_helpers::{n, numbers, s, show, strings, TestHost};
use pretty_assertions::assert_eq;
use tal_ir::BinaryOp;

#[test]
fn push_and_pop_mutate_through_aliases() {
    let mut host = TestHost::new();
    let items = numbers(&[1.0]);
    let alias = items.clone();
    assert_eq!(host.ok(&PUSH, vec![items.clone(), n(2.0), n(3.0)]), n(3.0));
    assert_eq!(show(&alias), "[1, 2, 3]");
    assert_eq!(host.ok(&POP, vec![items.clone()]), n(3.0));
    assert_eq!(host.ok(&LENGTH, vec![alias]), n(2.0));
    assert_eq!(host.ok(&POP, vec![numbers(&[])]), Value::Null);
}

#[test]
fn slice_supports_negative_positions() {
    let mut host = TestHost::new();
    let items = numbers(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(show(&host.ok(&SLICE, vec![items.clone(), n(1.0), n(3.0)])), "[2, 3]");
    assert_eq!(show(&host.ok(&SLICE, vec![items.clone(), n(-2.0)])), "[4, 5]");
    assert_eq!(show(&host.ok(&SLICE, vec![items.clone(), n(3.0), n(1.0)])), "[]");
    assert_eq!(show(&host.ok(&SLICE, vec![items, n(-99.0), n(99.0)])), "[1, 2, 3, 4, 5]");
}

#[test]
fn concat_and_reverse_build_new_arrays() {
    let mut host = TestHost::new();
    let items = numbers(&[1.0, 2.0]);
    let joined = host.ok(&CONCAT, vec![items.clone(), numbers(&[3.0]), numbers(&[])]);
    assert_eq!(show(&joined), "[1, 2, 3]");
    assert!(!joined.same_ref(&items));
    assert_eq!(show(&host.ok(&REVERSE, vec![items.clone()])), "[2, 1]");
    assert_eq!(show(&items), "[1, 2]");
}

#[test]
fn sort_defaults_to_natural_order() {
    let mut host = TestHost::new();
    let items = numbers(&[64.0, 34.0, 25.0, 12.0, 22.0, 11.0, 90.0, 5.0]);
    let sorted = host.ok(&SORT, vec![items.clone()]);
    assert_eq!(show(&sorted), "[5, 11, 12, 22, 25, 34, 64, 90]");
    assert_eq!(show(&items), "[64, 34, 25, 12, 22, 11, 90, 5]");

    let words = strings(&["pear", "apple", "fig"]);
    assert_eq!(show(&host.ok(&SORT, vec![words])), r#"["apple", "fig", "pear"]"#);

    let (kind, message) = host.fail(&SORT, vec![Value::array(vec![n(1.0), s("a")])]);
    assert_eq!(kind, "ValueError");
    assert_eq!(message, "array.sort cannot compare string with number");
}

#[test]
fn sort_with_script_comparator_is_stable() {
    let mut host = TestHost::new();
    // function by_length(a, b) { return len(a) - len(b); }
    let by_length = host.define("by_length", |b| {
        let a = b.ident("a");
        let len_a = b.call_named("len", [a]);
        let bb = b.ident("b");
        let len_b = b.call_named("len", [bb]);
        let diff = b.binary(BinaryOp::Sub, len_a, len_b);
        let ret = b.ret(diff);
        vec![b.function("by_length", &["a", "b"], vec![ret])]
    });
    let words = strings(&["ccc", "a", "bb", "b", "aa"]);
    let sorted = host.ok(&SORT, vec![words, by_length]);
    assert_eq!(show(&sorted), r#"["a", "b", "bb", "aa", "ccc"]"#);
}

#[test]
fn sort_propagates_comparator_throws() {
    let mut host = TestHost::new();
    let fussy = host.define("fussy", |b| {
        let message = b.string("no comparing");
        let throw = b.throw(message);
        vec![b.function("fussy", &["a", "b"], vec![throw])]
    });
    let (kind, message) = host.fail(&SORT, vec![numbers(&[2.0, 1.0]), fussy]);
    assert_eq!(kind, "UserException");
    assert_eq!(message, "no comparing");
}

#[test]
fn searching() {
    let mut host = TestHost::new();
    let items = Value::array(vec![n(1.0), s("two"), numbers(&[3.0])]);
    assert_eq!(host.ok(&INDEX_OF, vec![items.clone(), s("two")]), n(1.0));
    assert_eq!(host.ok(&INDEX_OF, vec![items.clone(), numbers(&[3.0])]), n(2.0));
    assert_eq!(host.ok(&INDEX_OF, vec![items.clone(), n(9.0)]), n(-1.0));
    assert_eq!(host.ok(&CONTAINS, vec![items.clone(), n(1.0)]), Value::bool(true));
    assert_eq!(host.ok(&FIRST, vec![items.clone()]), n(1.0));
    assert_eq!(show(&host.ok(&LAST, vec![items])), "[3]");
    assert_eq!(host.ok(&FIRST, vec![numbers(&[])]), Value::Null);
}

#[test]
fn insert_and_remove_at() {
    let mut host = TestHost::new();
    let items = numbers(&[1.0, 3.0]);
    assert_eq!(host.ok(&INSERT, vec![items.clone(), n(1.0), n(2.0)]), n(3.0));
    assert_eq!(host.ok(&INSERT, vec![items.clone(), n(3.0), n(4.0)]), n(4.0));
    assert_eq!(show(&items), "[1, 2, 3, 4]");
    assert_eq!(host.ok(&REMOVE_AT, vec![items.clone(), n(0.0)]), n(1.0));
    assert_eq!(show(&items), "[2, 3, 4]");

    let (kind, message) = host.fail(&REMOVE_AT, vec![items.clone(), n(3.0)]);
    assert_eq!(kind, "IndexError");
    assert_eq!(message, "index 3 out of bounds for length 3");
    assert_eq!(host.fail(&INSERT, vec![items, n(-1.0), n(0.0)]).0, "IndexError");
}

#[test]
fn range_forms() {
    let mut host = TestHost::new();
    assert_eq!(show(&host.ok(&RANGE, vec![n(4.0)])), "[0, 1, 2, 3]");
    assert_eq!(show(&host.ok(&RANGE, vec![n(2.0), n(5.0)])), "[2, 3, 4]");
    assert_eq!(show(&host.ok(&RANGE, vec![n(10.0), n(0.0), n(-3.0)])), "[10, 7, 4, 1]");
    assert_eq!(show(&host.ok(&RANGE, vec![n(5.0), n(2.0)])), "[]");

    let (kind, message) = host.fail(&RANGE, vec![n(0.0), n(5.0), n(0.0)]);
    assert_eq!(kind, "ValueError");
    assert_eq!(message, "array.range: step must be a non-zero finite number");
    assert_eq!(host.fail(&RANGE, vec![n(1e12)]).0, "ValueError");
}

#[test]
fn sum_and_flatten() {
    let mut host = TestHost::new();
    assert_eq!(host.ok(&SUM, vec![numbers(&[1.5, 2.5, 6.0])]), n(10.0));
    assert_eq!(host.ok(&SUM, vec![numbers(&[])]), n(0.0));
    let (kind, message) = host.fail(&SUM, vec![Value::array(vec![n(1.0), s("2")])]);
    assert_eq!(kind, "TypeError");
    assert_eq!(message, "array.sum expects an array of numbers as argument 1, got string");

    let nested = Value::array(vec![numbers(&[1.0, 2.0]), n(3.0), Value::array(vec![numbers(&[4.0])])]);
    assert_eq!(show(&host.ok(&FLATTEN, vec![nested])), "[1, 2, 3, [4]]");
}

mod proptest_sort {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn merge_sort_matches_std_sort(input in proptest::collection::vec(-1000i32..1000, 0..64)) {
            let values: Vec<Value> = input.iter().map(|&x| Value::int(i64::from(x))).collect();
            let sorted = merge_sort(values, &mut |a, b| {
                Ok(natural_order(a, b)? == Ordering::Less)
            })
            .unwrap();
            let mut expected = input.clone();
            expected.sort_unstable();
            let got: Vec<i32> = sorted.iter().map(|v| v.as_number().unwrap() as i32).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
