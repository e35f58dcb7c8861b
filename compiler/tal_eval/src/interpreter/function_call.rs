//! Function calls: closures, host functions and method calls.

use super::Interpreter;
use crate::capability::{NativeCall, NativeFunction};
use crate::diagnostics::{CallFrame, ANONYMOUS};
use crate::errors::{
    control_outside_loop, not_callable, wrong_arg_count, ControlAction, EvalResult,
};
use crate::value::{FunctionValue, Value};
use smallvec::SmallVec;
use tal_ir::{ExprId, ExprKind, ExprRange, FunctionBody, Span};

/// Evaluated call arguments.
pub(crate) type ArgList = SmallVec<[Value; 4]>;

impl Interpreter {
    /// `callee(args)` and `receiver.method(args)`.
    pub(crate) fn eval_call(&mut self, callee: ExprId, args: ExprRange, span: Span) -> EvalResult {
        if let ExprKind::Member { receiver, property } = self.arena.get_expr(callee).kind {
            let receiver = self.eval_expr(receiver)?;
            let args = self.eval_args(args)?;
            return self.call_method(receiver, property, args, span);
        }
        let function = self.eval_expr(callee)?;
        let args = self.eval_args(args)?;
        self.call_function(&function, args, span)
    }

    fn eval_args(&mut self, args: ExprRange) -> Result<ArgList, ControlAction> {
        let arena = self.arena.clone();
        arena
            .get_expr_list(args)
            .iter()
            .map(|&arg| self.eval_expr(arg))
            .collect()
    }

    /// Call any callable value.
    pub(crate) fn call_function(
        &mut self,
        callee: &Value,
        args: impl Into<ArgList>,
        span: Span,
    ) -> EvalResult {
        let args: ArgList = args.into();
        match callee {
            Value::Function(function) => self.call_closure(function, args, span),
            Value::Native(native) => self.call_native(native, &args, span),
            other => Err(not_callable(other.type_name()).into()),
        }
    }

    fn call_closure(&mut self, function: &FunctionValue, args: ArgList, span: Span) -> EvalResult {
        let def = *function.arena.get_function(function.def);
        let params = function.arena.get_params(def.params);
        if params.len() != args.len() {
            return Err(wrong_arg_count(
                function.label.unwrap_or(ANONYMOUS),
                params.len(),
                args.len(),
            )
            .into());
        }

        self.call_stack.push(CallFrame::user(function.label, span))?;
        let saved_scope = self.env.enter_call(&function.env);
        let saved_arena = std::mem::replace(&mut self.arena, function.arena.clone());
        for (&param, arg) in params.iter().zip(args) {
            self.env.define_local(param, arg);
        }

        let result = match def.body {
            FunctionBody::Block(body) => match self.exec_block(body) {
                Ok(()) => Ok(Value::Null),
                Err(ControlAction::Return(value)) => Ok(value),
                Err(ControlAction::Break) => {
                    Err(control_outside_loop("break").with_span(def.span).into())
                }
                Err(ControlAction::Continue) => {
                    Err(control_outside_loop("continue").with_span(def.span).into())
                }
                Err(other) => Err(other),
            },
            FunctionBody::Expr(body) => self.eval_expr(body),
        };
        let result = result.map_err(|action| self.with_backtrace(action));

        self.arena = saved_arena;
        self.env.restore(saved_scope);
        self.call_stack.pop();
        result
    }

    /// Host call: policy check, arity check, then the handler.
    fn call_native(&mut self, native: &NativeFunction, args: &[Value], span: Span) -> EvalResult {
        let descriptor = native.descriptor();
        self.policy.check(descriptor)?;
        descriptor.check_arity(args.len())?;
        tracing::trace!(
            module = descriptor.module,
            function = descriptor.name,
            args = args.len(),
            "host call"
        );

        self.call_stack
            .push(CallFrame::native(descriptor.module, descriptor.name, span))?;
        let call = NativeCall::new(descriptor, args, native.receiver());
        let result = (descriptor.handler)(self, call);
        let result = result.map_err(|action| self.with_backtrace(action));
        self.call_stack.pop();
        result
    }

    /// Attach the live call stack to an error that has no backtrace yet.
    fn with_backtrace(&self, action: ControlAction) -> ControlAction {
        match action {
            ControlAction::Error(err) => ControlAction::Error(self.call_stack.attach_backtrace(err)),
            other => other,
        }
    }
}
