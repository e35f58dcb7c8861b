//! Test helpers for host-module unit tests.
//!
//! `TestHost` wraps a real interpreter over the standard registry so
//! handlers run through the full capability-checked dispatch path.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::standard_registry;
use tal_eval::{
    buffer_handler, CapabilityPolicy, ControlAction, EvalResult, HostContext, Interpreter,
    InterpreterBuilder, NativeDescriptor, SharedPrintHandler, Uncaught, Value,
};
use tal_ir::{AstBuilder, SharedInterner, StmtId};

pub(crate) struct TestHost {
    interner: SharedInterner,
    pub(crate) output: SharedPrintHandler,
    pub(crate) interpreter: Interpreter,
}

impl TestHost {
    pub(crate) fn new() -> Self {
        Self::with_policy(CapabilityPolicy::allow_all())
    }

    pub(crate) fn with_policy(policy: CapabilityPolicy) -> Self {
        let interner = SharedInterner::default();
        let output = buffer_handler();
        let interpreter = InterpreterBuilder::new()
            .interner(interner.clone())
            .registry(standard_registry())
            .policy(policy)
            .max_call_depth(Some(200))
            .print_handler(output.clone())
            .build();
        TestHost {
            interner,
            output,
            interpreter,
        }
    }

    /// Call a host function through the evaluator.
    pub(crate) fn call(&mut self, descriptor: &'static NativeDescriptor, args: Vec<Value>) -> EvalResult {
        self.interpreter.call_value(&Value::native(descriptor), args)
    }

    /// Call a host function that must succeed.
    pub(crate) fn ok(&mut self, descriptor: &'static NativeDescriptor, args: Vec<Value>) -> Value {
        match self.call(descriptor, args) {
            Ok(value) => value,
            Err(action) => panic!("{} failed: {action:?}", descriptor.qualified_name()),
        }
    }

    /// Call a host function that must fail; returns `(type, message)`.
    pub(crate) fn fail(
        &mut self,
        descriptor: &'static NativeDescriptor,
        args: Vec<Value>,
    ) -> (String, String) {
        match self.call(descriptor, args) {
            Ok(value) => panic!(
                "{} returned {} instead of failing",
                descriptor.qualified_name(),
                value.display_value()
            ),
            Err(action) => describe(action),
        }
    }

    /// Call any value (a bound method, a composed function) from the host.
    pub(crate) fn invoke(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        self.interpreter.call_value(callee, args)
    }

    /// Run a script that defines globals and return the global `name`.
    pub(crate) fn define(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut AstBuilder<'_>) -> Vec<StmtId>,
    ) -> Value {
        self.run(f).unwrap();
        self.interpreter.global(name).unwrap()
    }

    /// Build and run a script on this host.
    pub(crate) fn run(
        &mut self,
        f: impl FnOnce(&mut AstBuilder<'_>) -> Vec<StmtId>,
    ) -> Result<Value, Uncaught> {
        let mut b = AstBuilder::new(&self.interner);
        let body = f(&mut b);
        let program = b.finish(body);
        self.interpreter.run(&program)
    }
}

/// `(type, message)` of a failed call.
pub(crate) fn describe(action: ControlAction) -> (String, String) {
    let uncaught = match action {
        ControlAction::Error(err) => Uncaught::from_error(err),
        ControlAction::Throw(value) => Uncaught::from_value(value),
        other => panic!("unexpected control action {other:?}"),
    };
    (uncaught.kind().to_string(), uncaught.message().to_string())
}

/// Numbers to a script array.
pub(crate) fn numbers(items: &[f64]) -> Value {
    Value::array(items.iter().copied().map(Value::number).collect())
}

/// Strings to a script array.
pub(crate) fn strings(items: &[&str]) -> Value {
    Value::array(items.iter().map(Value::string).collect())
}

pub(crate) fn s(text: &str) -> Value {
    Value::string(text)
}

pub(crate) fn n(value: f64) -> Value {
    Value::number(value)
}

/// Display form, for compact assertions.
pub(crate) fn show(value: &Value) -> String {
    value.display_value()
}
