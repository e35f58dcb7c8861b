//! Environment for variable scoping.
//!
//! Scopes are shared nodes (`Shared<Scope>`) linked to their parent, so a
//! closure keeps its defining scope alive for as long as the closure lives,
//! and mutations through the scope are visible to every closure sharing it.
//!
//! Lookups walk outward through parents. Declarations land in the nearest
//! scope that is not an `Iteration` scope: loop bodies reuse the enclosing
//! scope, while each `for` iteration still gets its own loop variable.

use crate::value::{Reclaim, Shared, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;
use tal_ir::Name;

/// What introduced a scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    /// Call frame of a user function.
    Function,
    /// `try`/`except`/`finally` bodies.
    Block,
    /// Holds only the loop variable of one `for` iteration.
    Iteration,
}

/// A single scope containing variable bindings.
pub struct Scope {
    kind: ScopeKind,
    bindings: FxHashMap<Name, Value>,
    parent: Option<Shared<Scope>>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Scope {
            kind,
            bindings: FxHashMap::default(),
            parent: None,
        }
    }

    pub fn with_parent(kind: ScopeKind, parent: Shared<Scope>) -> Self {
        Scope {
            kind,
            bindings: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    #[inline]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Bind `name` in this scope, overwriting any existing binding.
    #[inline]
    pub fn define(&mut self, name: Name, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Look up a binding in this scope only.
    #[inline]
    pub fn lookup_local(&self, name: Name) -> Option<&Value> {
        self.bindings.get(&name)
    }

    pub fn parent(&self) -> Option<&Shared<Scope>> {
        self.parent.as_ref()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Reclaim for Scope {
    fn reclaim(&mut self, out: &mut Vec<Value>) {
        out.extend(self.bindings.drain().map(|(_, value)| value));
    }
}

impl fmt::Debug for Scope {
    // Bindings may hold closures over this very scope; print names only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("kind", &self.kind)
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Scope chain of a running interpreter.
pub struct Environment {
    current: Shared<Scope>,
    global: Shared<Scope>,
    /// Every scope created since the last prune, for cycle teardown.
    created: Vec<Weak<RefCell<Scope>>>,
    prune_at: usize,
}

/// Initial threshold for pruning dead entries from `created`.
const PRUNE_THRESHOLD: usize = 4096;

impl Environment {
    pub fn new() -> Self {
        let global = Shared::new(Scope::new(ScopeKind::Global));
        Environment {
            current: global.clone(),
            created: vec![global.downgrade()],
            global,
            prune_at: PRUNE_THRESHOLD,
        }
    }

    /// The innermost scope.
    #[inline]
    pub fn current(&self) -> &Shared<Scope> {
        &self.current
    }

    #[inline]
    pub fn global(&self) -> &Shared<Scope> {
        &self.global
    }

    /// Nearest scope that accepts declarations.
    fn declaration_scope(&self) -> Shared<Scope> {
        let mut scope = self.current.clone();
        loop {
            let parent = {
                let s = scope.borrow();
                if s.kind != ScopeKind::Iteration {
                    break;
                }
                s.parent.clone()
            };
            match parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        scope
    }

    /// Declare `name` (`let`, function declarations, imports).
    pub fn define(&mut self, name: Name, value: Value) {
        self.declaration_scope().borrow_mut().define(name, value);
    }

    /// Bind `name` in the innermost scope (parameters, loop variables).
    pub fn define_local(&mut self, name: Name, value: Value) {
        self.current.borrow_mut().define(name, value);
    }

    /// Resolve `name` outward through the chain.
    pub fn get(&self, name: Name) -> Option<Value> {
        let mut scope = self.current.clone();
        loop {
            let parent = {
                let s = scope.borrow();
                if let Some(value) = s.bindings.get(&name) {
                    return Some(value.clone());
                }
                s.parent.clone()
            };
            scope = parent?;
        }
    }

    /// Nearest scope that owns `name`.
    fn owner_of(&self, name: Name) -> Option<Shared<Scope>> {
        let mut scope = self.current.clone();
        loop {
            let parent = {
                let s = scope.borrow();
                if s.bindings.contains_key(&name) {
                    break;
                }
                s.parent.clone()
            };
            scope = parent?;
        }
        Some(scope)
    }

    /// Assign to the nearest binding of `name`, or declare it if unbound.
    pub fn set(&mut self, name: Name, value: Value) {
        match self.owner_of(name) {
            Some(owner) => owner.borrow_mut().define(name, value),
            None => self.define(name, value),
        }
    }

    /// Push a child of the current scope.
    pub fn push_scope(&mut self, kind: ScopeKind) {
        let child = Shared::new(Scope::with_parent(kind, self.current.clone()));
        self.track(&child);
        self.current = child;
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        let parent = self.current.borrow().parent.clone();
        if let Some(parent) = parent {
            self.current = parent;
        }
    }

    /// The scope a closure created here would capture.
    #[inline]
    pub fn capture(&self) -> Shared<Scope> {
        self.current.clone()
    }

    /// Switch to a fresh call scope whose parent is `captured`.
    ///
    /// Returns the caller's scope, to be handed back to [`restore`](Self::restore).
    pub fn enter_call(&mut self, captured: &Shared<Scope>) -> Shared<Scope> {
        let frame = Shared::new(Scope::with_parent(ScopeKind::Function, captured.clone()));
        self.track(&frame);
        std::mem::replace(&mut self.current, frame)
    }

    /// Return to the scope saved by [`enter_call`](Self::enter_call).
    pub fn restore(&mut self, saved: Shared<Scope>) {
        self.current = saved;
    }

    /// Number of scopes between the innermost and the global scope.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.current.clone();
        loop {
            let parent = scope.borrow().parent.clone();
            match parent {
                Some(parent) => {
                    depth += 1;
                    scope = parent;
                }
                None => return depth,
            }
        }
    }

    fn track(&mut self, scope: &Shared<Scope>) {
        self.created.push(scope.downgrade());
        if self.created.len() >= self.prune_at {
            self.created.retain(|weak| weak.strong_count() > 0);
            self.prune_at = (self.created.len() * 2).max(PRUNE_THRESHOLD);
        }
    }

    /// Drop every binding in every live scope.
    ///
    /// Closures stored in the scope they capture form `Rc` cycles; clearing
    /// bindings breaks them once evaluation is over.
    pub fn teardown(&mut self) {
        for weak in self.created.drain(..) {
            if let Some(scope) = weak.upgrade() {
                if let Ok(mut scope) = scope.try_borrow_mut() {
                    scope.bindings.clear();
                }
            }
        }
        self.global.borrow_mut().bindings.clear();
        self.current = self.global.clone();
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
