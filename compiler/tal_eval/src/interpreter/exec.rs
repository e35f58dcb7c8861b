//! Statement execution.

use super::Interpreter;
use crate::environment::ScopeKind;
use crate::errors::{not_iterable, ControlAction, ExecResult};
use crate::value::Value;
use tal_ir::{ExprId, Handler, Name, SharedArena, Span, StmtId, StmtKind, StmtRange};

impl Interpreter {
    /// Execute a statement list in the current scope.
    ///
    /// Function declarations are bound before the first statement runs, so
    /// a block can call functions declared further down.
    pub(crate) fn exec_block(&mut self, body: StmtRange) -> ExecResult {
        let arena = self.arena.clone();
        let stmts = arena.get_stmt_list(body);
        self.hoist_functions(&arena, stmts);
        for &stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn hoist_functions(&mut self, arena: &SharedArena, stmts: &[StmtId]) {
        for &id in stmts {
            if let StmtKind::Function(def) = arena.get_stmt(id).kind {
                if let Some(name) = arena.get_function(def).name {
                    let closure = self.make_closure(def);
                    self.env.define(name, closure);
                }
            }
        }
    }

    pub(crate) fn exec_stmt(&mut self, id: StmtId) -> ExecResult {
        let stmt = *self.arena.get_stmt(id);
        self.exec_kind(stmt.kind, stmt.span)
            .map_err(|action| self.annotate(action, stmt.span))
    }

    fn exec_kind(&mut self, kind: StmtKind, span: Span) -> ExecResult {
        match kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
            StmtKind::Let { name, init } => {
                let value = match init {
                    Some(init) => self.eval_expr(init)?,
                    None => Value::Null,
                };
                self.env.define(name, value);
                Ok(())
            }
            // Bound when the enclosing block was entered.
            StmtKind::Function(_) => Ok(()),
            StmtKind::If {
                branches,
                else_body,
            } => {
                let arena = self.arena.clone();
                for branch in arena.get_branches(branches) {
                    if self.eval_expr(branch.cond)?.is_truthy() {
                        return self.exec_block(branch.body);
                    }
                }
                match else_body {
                    Some(body) => self.exec_block(body),
                    None => Ok(()),
                }
            }
            StmtKind::While { cond, body } => self.exec_while(cond, body),
            StmtKind::ForIn {
                binding,
                iterable,
                body,
            } => self.exec_for_in(binding, iterable, body),
            StmtKind::Break => Err(ControlAction::Break),
            StmtKind::Continue => Err(ControlAction::Continue),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval_expr(value)?,
                    None => Value::Null,
                };
                Err(ControlAction::Return(value))
            }
            StmtKind::Throw(value) => {
                let value = self.eval_expr(value)?;
                tracing::trace!(value = %value, "throw");
                Err(ControlAction::Throw(value))
            }
            StmtKind::Try {
                body,
                handler,
                finally,
            } => self.exec_try(body, handler, finally),
            StmtKind::Import(module) => self.exec_import(module, span),
        }
    }

    /// Pre-test loop. The body runs in the enclosing scope.
    fn exec_while(&mut self, cond: ExprId, body: StmtRange) -> ExecResult {
        while self.eval_expr(cond)?.is_truthy() {
            match self.exec_block(body) {
                Ok(()) | Err(ControlAction::Continue) => {}
                Err(ControlAction::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// `for (x in xs)`: arrays by index, strings by character, objects by
    /// key in insertion order. Iterates a snapshot taken before the first
    /// pass; each pass binds `x` in its own scope.
    fn exec_for_in(&mut self, binding: Name, iterable: ExprId, body: StmtRange) -> ExecResult {
        let iterable = self.eval_expr(iterable)?;
        let items: Vec<Value> = match &iterable {
            Value::Array(items) => items.borrow().clone(),
            Value::Str(text) => text.chars().map(|c| Value::string(c.to_string())).collect(),
            Value::Object(map) => map.borrow().keys().map(Value::string).collect(),
            other => return Err(not_iterable(other.type_name()).into()),
        };
        for item in items {
            let outcome = self.with_binding(ScopeKind::Iteration, binding, item, |scoped| {
                scoped.exec_block(body)
            });
            match outcome {
                Ok(()) | Err(ControlAction::Continue) => {}
                Err(ControlAction::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// `try`/`except`/`finally`.
    ///
    /// The handler's outcome replaces a caught throw. `finally` runs exactly
    /// once on every path; if it unwinds itself, its action wins.
    fn exec_try(
        &mut self,
        body: StmtRange,
        handler: Option<Handler>,
        finally: Option<StmtRange>,
    ) -> ExecResult {
        let outcome = self.with_env_scope(ScopeKind::Block, |scoped| scoped.exec_block(body));

        let outcome = match (outcome, handler) {
            (Err(action), Some(handler)) if action.is_exception() => {
                match action.into_exception_value() {
                    Ok(exception) => {
                        tracing::trace!(exception = %exception, "caught");
                        self.exec_handler(handler, exception)
                    }
                    Err(other) => Err(other),
                }
            }
            (outcome, _) => outcome,
        };

        match finally {
            Some(finally) => self
                .with_env_scope(ScopeKind::Block, |scoped| scoped.exec_block(finally))
                .and(outcome),
            None => outcome,
        }
    }

    fn exec_handler(&mut self, handler: Handler, exception: Value) -> ExecResult {
        match handler.binding {
            Some(name) => self.with_binding(ScopeKind::Block, name, exception, |scoped| {
                scoped.exec_block(handler.body)
            }),
            None => self.with_env_scope(ScopeKind::Block, |scoped| {
                scoped.exec_block(handler.body)
            }),
        }
    }

    fn exec_import(&mut self, module: Name, span: Span) -> ExecResult {
        let module_name = self.interner.lookup(module);
        let namespace = self
            .modules
            .load(module_name)
            .map_err(|err| err.with_span(span))?;
        self.env.define(module, namespace);
        Ok(())
    }
}
