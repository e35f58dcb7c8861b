//! `InterpreterBuilder` for creating configured interpreters.

use super::Interpreter;
use crate::capability::{CapabilityPolicy, CapabilityRegistry};
use crate::diagnostics::CallStack;
use crate::environment::Environment;
use crate::module_loader::ModuleLoader;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::shared::SharedRegistry;
use crate::value::Value;
use tal_ir::{ExprArena, SharedArena, SharedInterner};

/// Call depth at which recursion raises `StackOverflowError`.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Builder for [`Interpreter`].
///
/// Defaults: a fresh interner, an empty registry, every capability
/// granted, a call-depth limit of [`DEFAULT_MAX_CALL_DEPTH`] and output to
/// stdout.
pub struct InterpreterBuilder {
    interner: Option<SharedInterner>,
    registry: Option<SharedRegistry<CapabilityRegistry>>,
    policy: CapabilityPolicy,
    max_call_depth: Option<usize>,
    print_handler: Option<SharedPrintHandler>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        InterpreterBuilder {
            interner: None,
            registry: None,
            policy: CapabilityPolicy::allow_all(),
            max_call_depth: Some(DEFAULT_MAX_CALL_DEPTH),
            print_handler: None,
        }
    }

    /// Interner the programs to run were built with.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    /// Host modules and prelude globals.
    #[must_use]
    pub fn registry(mut self, registry: SharedRegistry<CapabilityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: CapabilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Recursion limit; `None` disables it.
    #[must_use]
    pub fn max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Build the interpreter and bind the registry's globals.
    pub fn build(self) -> Interpreter {
        let interner = self.interner.unwrap_or_default();
        let registry = self.registry.unwrap_or_else(CapabilityRegistry::empty);

        let mut env = Environment::new();
        for &descriptor in registry.globals() {
            env.define(interner.intern(descriptor.name), Value::native(descriptor));
        }
        tracing::debug!(
            globals = registry.globals().len(),
            modules = ?registry.module_names(),
            granted = %self.policy.granted().describe(),
            "interpreter ready"
        );

        Interpreter {
            interner,
            arena: SharedArena::new(ExprArena::new()),
            env,
            call_stack: CallStack::new(self.max_call_depth),
            policy: self.policy,
            modules: ModuleLoader::new(registry),
            print_handler: self.print_handler.unwrap_or_else(stdout_handler),
        }
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
