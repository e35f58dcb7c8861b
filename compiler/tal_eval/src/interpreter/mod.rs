//! Tree-walking interpreter for Tal.
//!
//! # Architecture
//!
//! - `eval` - expressions (operators, literals, member/index access)
//! - `exec` - statements (blocks, loops, `try`/`except`/`finally`, `import`)
//! - `function_call` - closures and host calls, call-frame bookkeeping
//! - `members` - property/index reads and writes, built-in methods
//!
//! Normal completion is `Ok`; `return`, `break`, `continue`, user throws
//! and runtime faults all unwind as `Err(ControlAction)`. Runtime faults
//! pick up the span of the innermost expression and a backtrace of the
//! call stack at the point they were raised.
//!
//! # Arena Threading
//!
//! A closure carries the arena it was defined in. Calling it switches
//! `self.arena` to that arena for the duration of the call, so one
//! interpreter can run several programs and call closures across them.

pub mod builder;
mod eval;
mod exec;
mod function_call;
mod members;
mod scope_guard;

pub use builder::InterpreterBuilder;
pub use scope_guard::ScopedInterpreter;

use crate::capability::{CapabilityPolicy, HostContext};
use crate::diagnostics::CallStack;
use crate::environment::Environment;
use crate::errors::{control_outside_loop, unbound_name, ControlAction, EvalResult};
use crate::module_loader::ModuleLoader;
use crate::print_handler::SharedPrintHandler;
use crate::value::{Uncaught, Value};
use tal_ir::{Program, SharedArena, SharedInterner};

/// Evaluator state for one embedding session.
///
/// Globals and imported namespaces persist across
/// [`run`](Self::run) calls on the same interpreter.
pub struct Interpreter {
    pub(crate) interner: SharedInterner,
    /// Arena of the code currently executing.
    pub(crate) arena: SharedArena,
    pub(crate) env: Environment,
    pub(crate) call_stack: CallStack,
    pub(crate) policy: CapabilityPolicy,
    pub(crate) modules: ModuleLoader,
    pub(crate) print_handler: SharedPrintHandler,
}

impl Interpreter {
    /// Run a program to completion.
    ///
    /// The result is the value of a top-level `return`, or `null`. A throw
    /// that nothing catches comes back as [`Uncaught`].
    ///
    /// `program` must have been built with this interpreter's interner.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self, program: &Program) -> Result<Value, Uncaught> {
        self.arena = program.arena.clone();
        let outcome = self.exec_block(program.body);
        // A fault may have unwound out of nested scopes.
        let global = self.env.global().clone();
        self.env.restore(global);
        match outcome {
            Ok(()) => Ok(Value::Null),
            Err(ControlAction::Return(value)) => Ok(value),
            Err(ControlAction::Throw(value)) => {
                tracing::debug!("uncaught throw");
                Err(Uncaught::from_value(value))
            }
            Err(ControlAction::Error(err)) => {
                tracing::debug!(kind = err.type_tag(), "uncaught runtime error");
                Err(Uncaught::from_error(err))
            }
            Err(ControlAction::Break) => Err(Uncaught::from_error(control_outside_loop("break"))),
            Err(ControlAction::Continue) => {
                Err(Uncaught::from_error(control_outside_loop("continue")))
            }
        }
    }

    /// Value bound to `name` in the global scope.
    pub fn global(&self, name: &str) -> Option<Value> {
        let name = self.interner.intern(name);
        self.env.global().borrow().lookup_local(name).cloned()
    }

    /// Bind `name` in the global scope.
    pub fn define_global(&mut self, name: &str, value: Value) {
        let name = self.interner.intern(name);
        self.env.global().borrow_mut().define(name, value);
    }

    /// Call a global function by name from the embedding.
    pub fn call_global(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Uncaught> {
        let Some(callee) = self.global(name) else {
            return Err(Uncaught::from_error(unbound_name(name)));
        };
        match self.call_value(&callee, args) {
            Ok(value) => Ok(value),
            Err(ControlAction::Throw(value)) => Err(Uncaught::from_value(value)),
            Err(ControlAction::Error(err)) => Err(Uncaught::from_error(err)),
            // Calls already convert stray loop control into errors.
            Err(ControlAction::Return(value)) => Ok(value),
            Err(ControlAction::Break) => Err(Uncaught::from_error(control_outside_loop("break"))),
            Err(ControlAction::Continue) => {
                Err(Uncaught::from_error(control_outside_loop("continue")))
            }
        }
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    #[inline]
    pub fn policy(&self) -> &CapabilityPolicy {
        &self.policy
    }

    /// Replace the capability policy for subsequent host calls.
    pub fn set_policy(&mut self, policy: CapabilityPolicy) {
        self.policy = policy;
    }

    #[inline]
    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    /// Current call depth.
    #[inline]
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }
}

impl HostContext for Interpreter {
    fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        self.call_function(callee, args, tal_ir::Span::DUMMY)
    }

    fn print(&self, text: &str) {
        self.print_handler.println(text);
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Closures stored in the scopes they capture keep each other alive.
        self.env.teardown();
        self.modules.clear();
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("policy", &self.policy)
            .field("modules", &self.modules)
            .field("call_depth", &self.call_stack.depth())
            .finish_non_exhaustive()
    }
}
