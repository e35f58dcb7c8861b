//! RAII scope guards for interpreter environment management.
//!
//! The guard holds `&mut Interpreter` and implements `Deref`/`DerefMut`,
//! so evaluation goes through it transparently. Dropping it pops the
//! scope it pushed, on every exit path including unwinding.

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::environment::ScopeKind;
use crate::value::Value;
use tal_ir::Name;

/// Pops one environment scope when dropped.
pub struct ScopedInterpreter<'guard> {
    interpreter: &'guard mut Interpreter,
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        self.interpreter.env.pop_scope();
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Push a scope of `kind` that is popped when the guard drops.
    pub fn scoped(&mut self, kind: ScopeKind) -> ScopedInterpreter<'_> {
        self.env.push_scope(kind);
        ScopedInterpreter { interpreter: self }
    }

    /// Run `f` inside a fresh scope of `kind`.
    pub fn with_env_scope<T, F>(&mut self, kind: ScopeKind, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        let mut scoped = self.scoped(kind);
        f(&mut scoped)
    }

    /// Run `f` inside a fresh scope of `kind` with `name` bound locally.
    ///
    /// Used for `for` loop variables and `except` bindings.
    pub fn with_binding<T, F>(&mut self, kind: ScopeKind, name: Name, value: Value, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        self.with_env_scope(kind, |scoped| {
            scoped.env.define_local(name, value);
            f(scoped)
        })
    }
}
