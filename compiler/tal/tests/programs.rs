#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end programs run through `Runtime`.

use pretty_assertions::assert_eq;
use tal::{
    AstBuilder, BinaryOp, Capability, Execution, Runtime, RuntimeConfig, RuntimeError, Value,
};
use tal_ir::StmtId;

fn run_with(
    runtime: &Runtime,
    f: impl FnOnce(&mut AstBuilder<'_>) -> Vec<StmtId>,
) -> Result<Execution, RuntimeError> {
    let mut b = AstBuilder::new(runtime.interner());
    let body = f(&mut b);
    let program = b.finish(body);
    runtime.run(&program)
}

fn run(f: impl FnOnce(&mut AstBuilder<'_>) -> Vec<StmtId>) -> Execution {
    run_with(&Runtime::default(), f).expect("program should complete")
}

fn numbers(items: &[f64]) -> Value {
    Value::array(items.iter().copied().map(Value::number).collect())
}

fn strings(items: &[&str]) -> Value {
    Value::array(items.iter().map(Value::string).collect())
}

#[test]
fn quick_sort_orders_numbers() {
    let execution = run(|b| {
        // function quickSort(arr) {
        //     if (len(arr) <= 1) { return arr; }
        //     let pivot = arr[0]; let left = []; let right = []; let i = 1;
        //     while (i < len(arr)) {
        //         if (arr[i] < pivot) { array.push(left, arr[i]); }
        //         else { array.push(right, arr[i]); }
        //         i = i + 1;
        //     }
        //     return array.concat(quickSort(left), [pivot], quickSort(right));
        // }
        let import = b.import("array");

        let arr = b.ident("arr");
        let length = b.call_named("len", [arr]);
        let one = b.number(1.0);
        let small = b.binary(BinaryOp::LtEq, length, one);
        let arr = b.ident("arr");
        let early = b.ret(arr);
        let guard = b.if_stmt(small, vec![early], None);

        let arr = b.ident("arr");
        let zero = b.number(0.0);
        let first = b.index(arr, zero);
        let pivot = b.let_stmt("pivot", first);
        let empty = b.array([]);
        let left = b.let_stmt("left", empty);
        let empty = b.array([]);
        let right = b.let_stmt("right", empty);
        let one = b.number(1.0);
        let counter = b.let_stmt("i", one);

        let i = b.ident("i");
        let arr = b.ident("arr");
        let length = b.call_named("len", [arr]);
        let more = b.binary(BinaryOp::Lt, i, length);

        let arr = b.ident("arr");
        let i = b.ident("i");
        let item = b.index(arr, i);
        let pivot_ref = b.ident("pivot");
        let lower = b.binary(BinaryOp::Lt, item, pivot_ref);

        let array_ns = b.ident("array");
        let left_ref = b.ident("left");
        let arr = b.ident("arr");
        let i = b.ident("i");
        let item = b.index(arr, i);
        let push_left = b.method_call(array_ns, "push", [left_ref, item]);
        let push_left = b.expr_stmt(push_left);

        let array_ns = b.ident("array");
        let right_ref = b.ident("right");
        let arr = b.ident("arr");
        let i = b.ident("i");
        let item = b.index(arr, i);
        let push_right = b.method_call(array_ns, "push", [right_ref, item]);
        let push_right = b.expr_stmt(push_right);

        let split = b.if_stmt(lower, vec![push_left], Some(vec![push_right]));
        let i = b.ident("i");
        let one = b.number(1.0);
        let next = b.binary(BinaryOp::Add, i, one);
        let step = b.assign_stmt("i", next);
        let partition = b.while_stmt(more, vec![split, step]);

        let array_ns = b.ident("array");
        let left_ref = b.ident("left");
        let sorted_left = b.call_named("quickSort", [left_ref]);
        let pivot_ref = b.ident("pivot");
        let middle = b.array([pivot_ref]);
        let right_ref = b.ident("right");
        let sorted_right = b.call_named("quickSort", [right_ref]);
        let joined = b.method_call(array_ns, "concat", [sorted_left, middle, sorted_right]);
        let done = b.ret(joined);

        let quick_sort = b.function(
            "quickSort",
            &["arr"],
            vec![guard, pivot, left, right, counter, partition, done],
        );

        let input = b.number_array(&[64.0, 34.0, 25.0, 12.0, 22.0, 11.0, 90.0, 5.0]);
        let sorted = b.call_named("quickSort", [input]);
        let result = b.ret(sorted);
        vec![import, quick_sort, result]
    });
    assert_eq!(
        execution.value,
        numbers(&[5.0, 11.0, 12.0, 22.0, 25.0, 34.0, 64.0, 90.0])
    );
}

/// `function factorial(n) { if (n <= 1) { return 1; } return n * factorial(n - 1); }`
fn factorial(b: &mut AstBuilder<'_>) -> StmtId {
    let n = b.ident("n");
    let one = b.number(1.0);
    let base = b.binary(BinaryOp::LtEq, n, one);
    let one = b.number(1.0);
    let ret_one = b.ret(one);
    let guard = b.if_stmt(base, vec![ret_one], None);
    let n = b.ident("n");
    let n2 = b.ident("n");
    let one = b.number(1.0);
    let prev = b.binary(BinaryOp::Sub, n2, one);
    let rec = b.call_named("factorial", [prev]);
    let product = b.binary(BinaryOp::Mul, n, rec);
    let ret = b.ret(product);
    b.function("factorial", &["n"], vec![guard, ret])
}

#[test]
fn recursive_factorial() {
    let execution = run(|b| {
        let def = factorial(b);
        let zero = b.number(0.0);
        let f0 = b.call_named("factorial", [zero]);
        let five = b.number(5.0);
        let f5 = b.call_named("factorial", [five]);
        let ten = b.number(10.0);
        let f10 = b.call_named("factorial", [ten]);
        let all = b.array([f0, f5, f10]);
        let ret = b.ret(all);
        vec![def, ret]
    });
    assert_eq!(execution.value, numbers(&[1.0, 120.0, 3_628_800.0]));
}

#[test]
fn iterative_fibonacci_sequence() {
    let execution = run(|b| {
        // let seq = [0, 1]; let i = 2;
        // while (i < 10) { array.push(seq, seq[i - 1] + seq[i - 2]); i = i + 1; }
        // return seq;
        let import = b.import("array");
        let start = b.number_array(&[0.0, 1.0]);
        let seq = b.let_stmt("seq", start);
        let two = b.number(2.0);
        let counter = b.let_stmt("i", two);

        let i = b.ident("i");
        let ten = b.number(10.0);
        let cond = b.binary(BinaryOp::Lt, i, ten);

        let seq_ref = b.ident("seq");
        let i = b.ident("i");
        let one = b.number(1.0);
        let back1 = b.binary(BinaryOp::Sub, i, one);
        let a = b.index(seq_ref, back1);
        let seq_ref = b.ident("seq");
        let i = b.ident("i");
        let two = b.number(2.0);
        let back2 = b.binary(BinaryOp::Sub, i, two);
        let c = b.index(seq_ref, back2);
        let sum = b.binary(BinaryOp::Add, a, c);
        let array_ns = b.ident("array");
        let seq_ref = b.ident("seq");
        let push = b.method_call(array_ns, "push", [seq_ref, sum]);
        let push = b.expr_stmt(push);
        let i = b.ident("i");
        let one = b.number(1.0);
        let next = b.binary(BinaryOp::Add, i, one);
        let step = b.assign_stmt("i", next);
        let body = b.while_stmt(cond, vec![push, step]);

        let seq_ref = b.ident("seq");
        let ret = b.ret(seq_ref);
        vec![import, seq, counter, body, ret]
    });
    assert_eq!(
        execution.value,
        numbers(&[0.0, 1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0])
    );
}

#[test]
fn closures_capture_their_own_environment() {
    let execution = run(|b| {
        // function makeMultiplier(n) { return fn(x) => x * n; }
        let x = b.ident("x");
        let n = b.ident("n");
        let product = b.binary(BinaryOp::Mul, x, n);
        let arrow = b.arrow(&["x"], product);
        let ret = b.ret(arrow);
        let make = b.function("makeMultiplier", &["n"], vec![ret]);

        let two = b.number(2.0);
        let double = b.call_named("makeMultiplier", [two]);
        let double = b.let_stmt("double", double);
        let three = b.number(3.0);
        let triple = b.call_named("makeMultiplier", [three]);
        let triple = b.let_stmt("triple", triple);

        let five = b.number(5.0);
        let d = b.call_named("double", [five]);
        let five = b.number(5.0);
        let t = b.call_named("triple", [five]);
        let seven = b.number(7.0);
        let d2 = b.call_named("double", [seven]);
        let all = b.array([d, t, d2]);
        let ret = b.ret(all);
        vec![make, double, triple, ret]
    });
    assert_eq!(execution.value, numbers(&[10.0, 15.0, 14.0]));
}

#[test]
fn finally_runs_exactly_once_on_return() {
    let execution = run(|b| {
        // let runs = 0;
        // function f() { try { return "body"; } finally { runs = runs + 1; } }
        // let r = f(); return [r, runs];
        let zero = b.number(0.0);
        let runs = b.let_stmt("runs", zero);
        let body = b.string("body");
        let ret_body = b.ret(body);
        let runs_ref = b.ident("runs");
        let one = b.number(1.0);
        let bumped = b.binary(BinaryOp::Add, runs_ref, one);
        let bump = b.assign_stmt("runs", bumped);
        let guarded = b.try_stmt(vec![ret_body], None, Some(vec![bump]));
        let f = b.function("f", &[], vec![guarded]);
        let call = b.call_named("f", []);
        let r = b.let_stmt("r", call);
        let r_ref = b.ident("r");
        let runs_ref = b.ident("runs");
        let pair = b.array([r_ref, runs_ref]);
        let ret = b.ret(pair);
        vec![runs, f, r, ret]
    });
    assert_eq!(
        execution.value,
        Value::array(vec![Value::string("body"), Value::number(1.0)])
    );
}

#[test]
fn logical_operators_short_circuit() {
    let execution = run(|b| {
        // let calls = 0;
        // function bump() { calls = calls + 1; return true; }
        // return [false && bump(), true || bump(), calls];
        let zero = b.number(0.0);
        let calls = b.let_stmt("calls", zero);
        let calls_ref = b.ident("calls");
        let one = b.number(1.0);
        let next = b.binary(BinaryOp::Add, calls_ref, one);
        let count = b.assign_stmt("calls", next);
        let t = b.boolean(true);
        let ret_true = b.ret(t);
        let bump = b.function("bump", &[], vec![count, ret_true]);

        let f = b.boolean(false);
        let call = b.call_named("bump", []);
        let and = b.binary(BinaryOp::And, f, call);
        let t = b.boolean(true);
        let call = b.call_named("bump", []);
        let or = b.binary(BinaryOp::Or, t, call);
        let calls_ref = b.ident("calls");
        let all = b.array([and, or, calls_ref]);
        let ret = b.ret(all);
        vec![calls, bump, ret]
    });
    assert_eq!(
        execution.value,
        Value::array(vec![Value::bool(false), Value::bool(true), Value::number(0.0)])
    );
}

#[test]
fn thrown_object_is_caught_with_its_fields() {
    let execution = run(|b| {
        // function divide(a, b) {
        //     if (b == 0) { throw { type: "MathError", message: "Division by zero" }; }
        //     return a / b;
        // }
        // try { divide(10, 0); } except (e) { print(e.type + ": " + e.message); }
        let divisor = b.ident("b");
        let zero = b.number(0.0);
        let is_zero = b.binary(BinaryOp::Eq, divisor, zero);
        let kind = b.string("MathError");
        let message = b.string("Division by zero");
        let error = b.object([("type", kind), ("message", message)]);
        let throw = b.throw(error);
        let guard = b.if_stmt(is_zero, vec![throw], None);
        let a = b.ident("a");
        let divisor = b.ident("b");
        let quotient = b.binary(BinaryOp::Div, a, divisor);
        let ret = b.ret(quotient);
        let divide = b.function("divide", &["a", "b"], vec![guard, ret]);

        let ten = b.number(10.0);
        let zero = b.number(0.0);
        let call = b.call_named("divide", [ten, zero]);
        let call = b.expr_stmt(call);

        let e = b.ident("e");
        let kind = b.member(e, "type");
        let sep = b.string(": ");
        let head = b.binary(BinaryOp::Add, kind, sep);
        let e = b.ident("e");
        let message = b.member(e, "message");
        let line = b.binary(BinaryOp::Add, head, message);
        let print = b.call_named("print", [line]);
        let print = b.expr_stmt(print);
        let handled = b.try_except(vec![call], "e", vec![print]);
        vec![divide, handled]
    });
    assert_eq!(execution.value, Value::Null);
    assert_eq!(execution.output, "MathError: Division by zero\n");
}

#[test]
fn zero_divisors_follow_float_semantics() {
    let execution = run(|b| {
        // return [10 / 0, -10 / 0, 5.5 % 0];
        let ten = b.number(10.0);
        let zero = b.number(0.0);
        let inf = b.binary(BinaryOp::Div, ten, zero);
        let ten = b.number(-10.0);
        let zero = b.number(0.0);
        let neg_inf = b.binary(BinaryOp::Div, ten, zero);
        let x = b.number(5.5);
        let zero = b.number(0.0);
        let nan = b.binary(BinaryOp::Mod, x, zero);
        let all = b.array([inf, neg_inf, nan]);
        vec![b.ret(all)]
    });
    assert_eq!(execution.value.display_value(), "[Infinity, -Infinity, NaN]");
}

#[test]
fn division_by_zero_is_caught_from_an_explicit_guard() {
    let execution = run(|b| {
        // function safeDivide(a, b) {
        //     if (b == 0) { throw { type: "ZeroDivisionError", message: "division by zero" }; }
        //     return a / b;
        // }
        // try { safeDivide(1, 0); } except (e) { return e.type; }
        let divisor = b.ident("b");
        let zero = b.number(0.0);
        let is_zero = b.binary(BinaryOp::Eq, divisor, zero);
        let kind = b.string("ZeroDivisionError");
        let message = b.string("division by zero");
        let error = b.object([("type", kind), ("message", message)]);
        let throw = b.throw(error);
        let guard = b.if_stmt(is_zero, vec![throw], None);
        let a = b.ident("a");
        let divisor = b.ident("b");
        let quotient = b.binary(BinaryOp::Div, a, divisor);
        let ret = b.ret(quotient);
        let divide = b.function("safeDivide", &["a", "b"], vec![guard, ret]);

        let one = b.number(1.0);
        let zero = b.number(0.0);
        let call = b.call_named("safeDivide", [one, zero]);
        let call = b.expr_stmt(call);
        let e = b.ident("e");
        let kind = b.member(e, "type");
        let ret = b.ret(kind);
        let handled = b.try_except(vec![call], "e", vec![ret]);
        vec![divide, handled]
    });
    assert_eq!(execution.value, Value::string("ZeroDivisionError"));
}

/// `let a = []; let i = 0; while (i < depth) { a = [a]; i = i + 1; }`
fn nest(b: &mut AstBuilder<'_>, depth: f64) -> Vec<StmtId> {
    let empty = b.array([]);
    let a = b.let_stmt("a", empty);
    let zero = b.number(0.0);
    let i = b.let_stmt("i", zero);
    let cond_i = b.ident("i");
    let limit = b.number(depth);
    let cond = b.binary(BinaryOp::Lt, cond_i, limit);
    let inner = b.ident("a");
    let wrapped = b.array([inner]);
    let wrap = b.assign_stmt("a", wrapped);
    let step_i = b.ident("i");
    let one = b.number(1.0);
    let next = b.binary(BinaryOp::Add, step_i, one);
    let step = b.assign_stmt("i", next);
    let body = b.while_stmt(cond, vec![wrap, step]);
    vec![a, i, body]
}

#[test]
fn deeply_nested_array_is_released() {
    let execution = run(|b| {
        let mut body = nest(b, 100_000.0);
        let one = b.number(1.0);
        body.push(b.ret(one));
        body
    });
    assert_eq!(execution.value, Value::number(1.0));
}

#[test]
fn deeply_nested_array_displays_truncated() {
    let execution = run(|b| {
        // ... return len(str(a));
        let mut body = nest(b, 100_000.0);
        let a = b.ident("a");
        let text = b.call_named("str", [a]);
        let length = b.call_named("len", [text]);
        body.push(b.ret(length));
        body
    });
    let expected = 2 * tal_eval::MAX_DISPLAY_DEPTH + "[...]".len();
    assert_eq!(execution.value, Value::number(expected as f64));
}

#[test]
fn denied_capability_runs_no_host_code() {
    let runtime = Runtime::new(
        RuntimeConfig::builder()
            .revoke(Capability::PRINT)
            .build(),
    );
    let execution = run_with(&runtime, |b| {
        let text = b.string("leak");
        let print = b.call_named("print", [text]);
        let print = b.expr_stmt(print);
        let e = b.ident("e");
        let kind = b.member(e, "type");
        let ret = b.ret(kind);
        let handled = b.try_except(vec![print], "e", vec![ret]);
        vec![handled]
    })
    .unwrap();
    assert_eq!(execution.value, Value::string("CapabilityError"));
    assert_eq!(execution.output, "");
}

#[test]
fn uncaught_denial_reports_the_missing_capability() {
    let runtime = Runtime::new(RuntimeConfig::builder().capabilities(Capability::PRINT).build());
    let err = run_with(&runtime, |b| {
        let import = b.import("regex");
        let ns = b.ident("regex");
        let pattern = b.string("a+");
        let text = b.string("aaa");
        let test = b.method_call(ns, "test", [pattern, text]);
        let test = b.expr_stmt(test);
        vec![import, test]
    })
    .unwrap_err();
    let RuntimeError::Uncaught(uncaught) = err else {
        panic!("expected an uncaught exception");
    };
    assert_eq!(uncaught.kind(), "CapabilityError");
    assert!(
        uncaught.message().contains("regex.test requires capability 'regex'"),
        "message: {}",
        uncaught.message()
    );
}

#[test]
fn importing_twice_yields_the_same_namespace() {
    let execution = run(|b| {
        // import string; let first = string; first.marker = 1;
        // import string; return string.marker;
        let import = b.import("string");
        let ns = b.ident("string");
        let first = b.let_stmt("first", ns);
        let first_ref = b.ident("first");
        let target = b.member(first_ref, "marker");
        let one = b.number(1.0);
        let mark = b.assign(target, one);
        let mark = b.expr_stmt(mark);
        let again = b.import("string");
        let ns = b.ident("string");
        let marker = b.member(ns, "marker");
        let ret = b.ret(marker);
        vec![import, first, mark, again, ret]
    });
    assert_eq!(execution.value, Value::number(1.0));
}

#[test]
fn string_concatenation_coerces_operands() {
    let execution = run(|b| {
        let label = b.string("x: ");
        let five = b.number(5.0);
        let x = b.binary(BinaryOp::Add, label, five);
        let label = b.string("flag: ");
        let t = b.boolean(true);
        let flag = b.binary(BinaryOp::Add, label, t);
        let all = b.array([x, flag]);
        let ret = b.ret(all);
        vec![ret]
    });
    assert_eq!(execution.value, strings(&["x: 5", "flag: true"]));
}

/// `function down(n) { return down(n + 1); }`
fn runaway(b: &mut AstBuilder<'_>) -> StmtId {
    let n = b.ident("n");
    let one = b.number(1.0);
    let next = b.binary(BinaryOp::Add, n, one);
    let rec = b.call_named("down", [next]);
    let ret = b.ret(rec);
    b.function("down", &["n"], vec![ret])
}

#[test]
fn runaway_recursion_raises_catchable_stack_overflow() {
    let execution = run(|b| {
        let def = runaway(b);
        let zero = b.number(0.0);
        let call = b.call_named("down", [zero]);
        let call = b.expr_stmt(call);
        let e = b.ident("e");
        let kind = b.member(e, "type");
        let ret = b.ret(kind);
        let handled = b.try_except(vec![call], "e", vec![ret]);
        vec![def, handled]
    });
    assert_eq!(execution.value, Value::string("StackOverflowError"));
}

#[test]
fn configured_depth_limit_applies() {
    let runtime = Runtime::new(RuntimeConfig::builder().max_call_depth(Some(20)).build());
    let execution = run_with(&runtime, |b| {
        let def = factorial(b);
        let n = b.number(15.0);
        let ok = b.call_named("factorial", [n]);
        let ok = b.let_stmt("ok", ok);
        let n = b.number(50.0);
        let deep = b.call_named("factorial", [n]);
        let deep = b.expr_stmt(deep);
        let e = b.ident("e");
        let kind = b.member(e, "type");
        let ret = b.ret(kind);
        let handled = b.try_except(vec![deep], "e", vec![ret]);
        vec![def, ok, handled]
    })
    .unwrap();
    assert_eq!(execution.value, Value::string("StackOverflowError"));
}

#[test]
fn uncaught_chain_renders_every_cause() {
    let err = run_with(&Runtime::default(), |b| {
        let first = b.string("before");
        let print = b.call_named("print", [first]);
        let print = b.expr_stmt(print);
        let kind = b.string("IOError");
        let message = b.string("disk unavailable");
        let cause = b.object([("type", kind), ("message", message)]);
        let kind = b.string("AppError");
        let message = b.string("load failed");
        let error = b.object([("type", kind), ("message", message), ("originalError", cause)]);
        let throw = b.throw(error);
        vec![print, throw]
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "uncaught exception: AppError: load failed\n  caused by: IOError: disk unavailable"
    );
    let RuntimeError::Uncaught(uncaught) = err else {
        panic!("expected an uncaught exception");
    };
    assert_eq!(uncaught.kind(), "AppError");
    assert_eq!(uncaught.output, "before\n");
}

#[test]
fn each_run_starts_with_fresh_globals() {
    let runtime = Runtime::default();
    let first = run_with(&runtime, |b| {
        let one = b.number(1.0);
        let define = b.let_stmt("leftover", one);
        vec![define]
    })
    .unwrap();
    assert_eq!(first.value, Value::Null);

    let err = run_with(&runtime, |b| {
        let leftover = b.ident("leftover");
        let ret = b.ret(leftover);
        vec![ret]
    })
    .unwrap_err();
    let RuntimeError::Uncaught(uncaught) = err else {
        panic!("expected an uncaught exception");
    };
    assert_eq!(uncaught.kind(), "UnboundNameError");
}

#[test]
fn caught_error_is_returned_in_a_result_object() {
    let execution = run(|b| {
        // function safeDivide(a, b) {
        //     try {
        //         if (b == 0) { throw { message: "Division by zero error", type: "MathError" }; }
        //         return { success: true, value: a / b };
        //     } except (e) {
        //         return { success: false, error: e };
        //     }
        // }
        // return [safeDivide(10, 0), safeDivide(10, 4)];
        let divisor = b.ident("b");
        let zero = b.number(0.0);
        let is_zero = b.binary(BinaryOp::Eq, divisor, zero);
        let message = b.string("Division by zero error");
        let kind = b.string("MathError");
        let error = b.object([("message", message), ("type", kind)]);
        let throw = b.throw(error);
        let guard = b.if_stmt(is_zero, vec![throw], None);
        let a = b.ident("a");
        let divisor = b.ident("b");
        let quotient = b.binary(BinaryOp::Div, a, divisor);
        let yes = b.boolean(true);
        let ok = b.object([("success", yes), ("value", quotient)]);
        let ret_ok = b.ret(ok);
        let no = b.boolean(false);
        let e = b.ident("e");
        let failed = b.object([("success", no), ("error", e)]);
        let ret_failed = b.ret(failed);
        let guarded = b.try_except(vec![guard, ret_ok], "e", vec![ret_failed]);
        let safe_divide = b.function("safeDivide", &["a", "b"], vec![guarded]);

        let ten = b.number(10.0);
        let zero = b.number(0.0);
        let bad = b.call_named("safeDivide", [ten, zero]);
        let ten = b.number(10.0);
        let four = b.number(4.0);
        let good = b.call_named("safeDivide", [ten, four]);
        let both = b.array([bad, good]);
        let ret = b.ret(both);
        vec![safe_divide, ret]
    });
    assert_eq!(
        execution.value,
        Value::array(vec![
            Value::object_from([
                ("success", Value::bool(false)),
                (
                    "error",
                    Value::object_from([
                        ("message", Value::string("Division by zero error")),
                        ("type", Value::string("MathError")),
                    ]),
                ),
            ]),
            Value::object_from([("success", Value::bool(true)), ("value", Value::number(2.5))]),
        ])
    );
    assert_eq!(
        execution.value.display_value(),
        r#"[{success: false, error: {message: "Division by zero error", type: "MathError"}}, {success: true, value: 2.5}]"#
    );
}
