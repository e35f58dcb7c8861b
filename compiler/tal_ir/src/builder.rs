//! Programmatic AST construction.
//!
//! `AstBuilder` is the boundary between a front end and the evaluator:
//! a parser calls it node by node, stamping spans with [`AstBuilder::at`],
//! and hands the finished [`Program`] to the runtime. Tests use it directly.

use crate::ast::{
    BinaryOp, CondBranch, Expr, ExprKind, FunctionBody, FunctionDef, Handler, ObjectEntry, Stmt,
    StmtKind, UnaryOp,
};
use crate::{ExprArena, ExprId, Name, SharedArena, Span, StmtId, StmtRange, StringInterner};

/// A complete program: the arena plus its top-level statement list.
#[derive(Clone, Debug)]
pub struct Program {
    pub arena: SharedArena,
    pub body: StmtRange,
}

impl Program {
    pub fn new(arena: SharedArena, body: StmtRange) -> Self {
        Program { arena, body }
    }
}

/// Incremental builder over an [`ExprArena`].
pub struct AstBuilder<'i> {
    interner: &'i StringInterner,
    arena: ExprArena,
    span: Span,
}

impl<'i> AstBuilder<'i> {
    pub fn new(interner: &'i StringInterner) -> Self {
        AstBuilder {
            interner,
            arena: ExprArena::new(),
            span: Span::DUMMY,
        }
    }

    /// Set the span stamped on subsequently built nodes.
    pub fn at(&mut self, span: Span) -> &mut Self {
        self.span = span;
        self
    }

    #[inline]
    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn expr(&mut self, kind: ExprKind) -> ExprId {
        self.arena.alloc_expr(Expr::new(kind, self.span))
    }

    fn stmt(&mut self, kind: StmtKind) -> StmtId {
        self.arena.alloc_stmt(Stmt::new(kind, self.span))
    }

    fn block(&mut self, body: Vec<StmtId>) -> StmtRange {
        self.arena.alloc_stmt_list(body)
    }

    // ===== Literals =====

    pub fn null(&mut self) -> ExprId {
        self.expr(ExprKind::Null)
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Bool(value))
    }

    pub fn number(&mut self, value: f64) -> ExprId {
        self.expr(ExprKind::Number(value.to_bits()))
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        let name = self.name(value);
        self.expr(ExprKind::Str(name))
    }

    pub fn ident(&mut self, name: &str) -> ExprId {
        let name = self.name(name);
        self.expr(ExprKind::Ident(name))
    }

    pub fn array(&mut self, items: impl IntoIterator<Item = ExprId>) -> ExprId {
        let range = self.arena.alloc_expr_list(items);
        self.expr(ExprKind::Array(range))
    }

    /// Array literal of number literals.
    pub fn number_array(&mut self, items: &[f64]) -> ExprId {
        let ids: Vec<ExprId> = items.iter().map(|&n| self.number(n)).collect();
        self.array(ids)
    }

    pub fn object<'k>(&mut self, entries: impl IntoIterator<Item = (&'k str, ExprId)>) -> ExprId {
        let entries: Vec<ObjectEntry> = entries
            .into_iter()
            .map(|(key, value)| ObjectEntry {
                key: self.name(key),
                value,
            })
            .collect();
        let range = self.arena.alloc_entries(entries);
        self.expr(ExprKind::Object(range))
    }

    // ===== Operators =====

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.expr(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.expr(ExprKind::Unary { op, operand })
    }

    pub fn ternary(&mut self, cond: ExprId, then_expr: ExprId, else_expr: ExprId) -> ExprId {
        self.expr(ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        })
    }

    // ===== Access and calls =====

    pub fn call(&mut self, callee: ExprId, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let args = self.arena.alloc_expr_list(args);
        self.expr(ExprKind::Call { callee, args })
    }

    /// `name(args)`
    pub fn call_named(&mut self, name: &str, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        let callee = self.ident(name);
        self.call(callee, args)
    }

    pub fn member(&mut self, receiver: ExprId, property: &str) -> ExprId {
        let property = self.name(property);
        self.expr(ExprKind::Member { receiver, property })
    }

    /// `receiver.method(args)`
    pub fn method_call(
        &mut self,
        receiver: ExprId,
        method: &str,
        args: impl IntoIterator<Item = ExprId>,
    ) -> ExprId {
        let callee = self.member(receiver, method);
        self.call(callee, args)
    }

    pub fn index(&mut self, receiver: ExprId, index: ExprId) -> ExprId {
        self.expr(ExprKind::Index { receiver, index })
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        self.expr(ExprKind::Assign {
            target,
            op: None,
            value,
        })
    }

    /// `target op= value`
    pub fn compound_assign(&mut self, op: BinaryOp, target: ExprId, value: ExprId) -> ExprId {
        self.expr(ExprKind::Assign {
            target,
            op: Some(op),
            value,
        })
    }

    // ===== Functions =====

    fn function_def(&mut self, name: Option<&str>, params: &[&str], body: FunctionBody) -> FunctionDef {
        let name = name.map(|n| self.name(n));
        let params: Vec<Name> = params.iter().map(|p| self.name(p)).collect();
        FunctionDef {
            name,
            params: self.arena.alloc_params(params),
            body,
            span: self.span,
        }
    }

    /// `fn(params) => body`
    pub fn arrow(&mut self, params: &[&str], body: ExprId) -> ExprId {
        let def = self.function_def(None, params, FunctionBody::Expr(body));
        let id = self.arena.alloc_function(def);
        self.expr(ExprKind::Function(id))
    }

    /// `function(params) { body }`
    pub fn lambda(&mut self, params: &[&str], body: Vec<StmtId>) -> ExprId {
        let body = FunctionBody::Block(self.block(body));
        let def = self.function_def(None, params, body);
        let id = self.arena.alloc_function(def);
        self.expr(ExprKind::Function(id))
    }

    /// `function name(params) { body }` used as an expression.
    pub fn named_lambda(&mut self, name: &str, params: &[&str], body: Vec<StmtId>) -> ExprId {
        let body = FunctionBody::Block(self.block(body));
        let def = self.function_def(Some(name), params, body);
        let id = self.arena.alloc_function(def);
        self.expr(ExprKind::Function(id))
    }

    // ===== Statements =====

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    /// `let name = init;`
    pub fn let_stmt(&mut self, name: &str, init: ExprId) -> StmtId {
        let name = self.name(name);
        self.stmt(StmtKind::Let {
            name,
            init: Some(init),
        })
    }

    /// `let name;`
    pub fn let_uninit(&mut self, name: &str) -> StmtId {
        let name = self.name(name);
        self.stmt(StmtKind::Let { name, init: None })
    }

    /// `name = value;`
    pub fn assign_stmt(&mut self, name: &str, value: ExprId) -> StmtId {
        let target = self.ident(name);
        let assign = self.assign(target, value);
        self.expr_stmt(assign)
    }

    /// `function name(params) { body }`
    pub fn function(&mut self, name: &str, params: &[&str], body: Vec<StmtId>) -> StmtId {
        let body = FunctionBody::Block(self.block(body));
        let def = self.function_def(Some(name), params, body);
        let id = self.arena.alloc_function(def);
        self.stmt(StmtKind::Function(id))
    }

    pub fn if_stmt(
        &mut self,
        cond: ExprId,
        then_body: Vec<StmtId>,
        else_body: Option<Vec<StmtId>>,
    ) -> StmtId {
        self.if_chain(vec![(cond, then_body)], else_body)
    }

    /// `if (..) {..} elif (..) {..} ... else {..}`
    pub fn if_chain(
        &mut self,
        branches: Vec<(ExprId, Vec<StmtId>)>,
        else_body: Option<Vec<StmtId>>,
    ) -> StmtId {
        let branches: Vec<CondBranch> = branches
            .into_iter()
            .map(|(cond, body)| CondBranch {
                cond,
                body: self.block(body),
            })
            .collect();
        let branches = self.arena.alloc_branches(branches);
        let else_body = else_body.map(|body| self.block(body));
        self.stmt(StmtKind::If {
            branches,
            else_body,
        })
    }

    pub fn while_stmt(&mut self, cond: ExprId, body: Vec<StmtId>) -> StmtId {
        let body = self.block(body);
        self.stmt(StmtKind::While { cond, body })
    }

    /// `for (binding in iterable) { body }`
    pub fn for_in(&mut self, binding: &str, iterable: ExprId, body: Vec<StmtId>) -> StmtId {
        let binding = self.name(binding);
        let body = self.block(body);
        self.stmt(StmtKind::ForIn {
            binding,
            iterable,
            body,
        })
    }

    pub fn break_stmt(&mut self) -> StmtId {
        self.stmt(StmtKind::Break)
    }

    pub fn continue_stmt(&mut self) -> StmtId {
        self.stmt(StmtKind::Continue)
    }

    /// `return expr;`
    pub fn ret(&mut self, value: ExprId) -> StmtId {
        self.stmt(StmtKind::Return(Some(value)))
    }

    /// `return;`
    pub fn ret_void(&mut self) -> StmtId {
        self.stmt(StmtKind::Return(None))
    }

    pub fn throw(&mut self, value: ExprId) -> StmtId {
        self.stmt(StmtKind::Throw(value))
    }

    /// `try { body } except (binding) { handler } finally { finally }`
    ///
    /// At least one of `handler` and `finally` is expected; the builder
    /// does not enforce it.
    pub fn try_stmt(
        &mut self,
        body: Vec<StmtId>,
        handler: Option<(Option<&str>, Vec<StmtId>)>,
        finally: Option<Vec<StmtId>>,
    ) -> StmtId {
        let body = self.block(body);
        let handler = handler.map(|(binding, handler_body)| Handler {
            binding: binding.map(|b| self.name(b)),
            body: self.block(handler_body),
        });
        let finally = finally.map(|f| self.block(f));
        self.stmt(StmtKind::Try {
            body,
            handler,
            finally,
        })
    }

    /// `try { body } except (binding) { handler }`
    pub fn try_except(&mut self, body: Vec<StmtId>, binding: &str, handler: Vec<StmtId>) -> StmtId {
        self.try_stmt(body, Some((Some(binding), handler)), None)
    }

    /// `import module;`
    pub fn import(&mut self, module: &str) -> StmtId {
        let module = self.name(module);
        self.stmt(StmtKind::Import(module))
    }

    /// Finish building with `body` as the top-level statement list.
    pub fn finish(mut self, body: Vec<StmtId>) -> Program {
        let body = self.block(body);
        Program::new(SharedArena::new(self.arena), body)
    }
}

#[cfg(test)]
mod tests;
