//! Arena allocation for the flat AST.
//!
//! - Contiguous storage for all nodes of a program
//! - Child references use id/range indices
//! - Shared read-only by every closure created from the program

use crate::ast::{CondBranch, Expr, FunctionDef, ObjectEntry, Stmt};
use crate::{
    BranchRange, EntryRange, ExprId, ExprRange, FunctionId, Name, ParamRange, StmtId, StmtRange,
};
use std::fmt;
use std::sync::Arc;

/// Contiguous storage for all nodes in a program.
#[derive(Clone, Default)]
pub struct ExprArena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<Expr>,

    /// Flattened expression lists (call args, array elements).
    expr_lists: Vec<ExprId>,

    /// All statements (indexed by `StmtId`).
    stmts: Vec<Stmt>,

    /// Flattened statement lists (blocks).
    stmt_lists: Vec<StmtId>,

    /// Object literal entries.
    entries: Vec<ObjectEntry>,

    /// `if`/`elif` arms.
    branches: Vec<CondBranch>,

    /// Function parameter names.
    params: Vec<Name>,

    /// Function definitions (indexed by `FunctionId`).
    functions: Vec<FunctionDef>,
}

/// Push `items` onto `list` and return `(start, len)`.
fn extend_list<T>(list: &mut Vec<T>, items: impl IntoIterator<Item = T>) -> (u32, u32) {
    let start = list.len();
    list.extend(items);
    (to_u32(start), to_u32(list.len() - start))
}

#[inline]
fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or_else(|_| panic!("arena exceeded u32::MAX entries"))
}

impl ExprArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Expressions =====

    /// Allocate expression, return ID.
    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(to_u32(self.exprs.len()));
        self.exprs.push(expr);
        id
    }

    /// Get expression by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Get number of expressions.
    #[inline]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn alloc_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let (start, len) = extend_list(&mut self.expr_lists, exprs);
        ExprRange::new(start, len)
    }

    #[inline]
    pub fn get_expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.as_range()]
    }

    // ===== Statements =====

    /// Allocate statement, return ID.
    #[inline]
    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(to_u32(self.stmts.len()));
        self.stmts.push(stmt);
        id
    }

    /// Get statement by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn get_stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn alloc_stmt_list(&mut self, stmts: impl IntoIterator<Item = StmtId>) -> StmtRange {
        let (start, len) = extend_list(&mut self.stmt_lists, stmts);
        StmtRange::new(start, len)
    }

    #[inline]
    pub fn get_stmt_list(&self, range: StmtRange) -> &[StmtId] {
        &self.stmt_lists[range.as_range()]
    }

    // ===== Literal parts =====

    pub fn alloc_entries(&mut self, entries: impl IntoIterator<Item = ObjectEntry>) -> EntryRange {
        let (start, len) = extend_list(&mut self.entries, entries);
        EntryRange::new(start, len)
    }

    #[inline]
    pub fn get_entries(&self, range: EntryRange) -> &[ObjectEntry] {
        &self.entries[range.as_range()]
    }

    pub fn alloc_branches(
        &mut self,
        branches: impl IntoIterator<Item = CondBranch>,
    ) -> BranchRange {
        let (start, len) = extend_list(&mut self.branches, branches);
        BranchRange::new(start, len)
    }

    #[inline]
    pub fn get_branches(&self, range: BranchRange) -> &[CondBranch] {
        &self.branches[range.as_range()]
    }

    // ===== Functions =====

    pub fn alloc_params(&mut self, params: impl IntoIterator<Item = Name>) -> ParamRange {
        let (start, len) = extend_list(&mut self.params, params);
        ParamRange::new(start, len)
    }

    #[inline]
    pub fn get_params(&self, range: ParamRange) -> &[Name] {
        &self.params[range.as_range()]
    }

    pub fn alloc_function(&mut self, def: FunctionDef) -> FunctionId {
        let id = FunctionId::new(to_u32(self.functions.len()));
        self.functions.push(def);
        id
    }

    /// Get function definition by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn get_function(&self, id: FunctionId) -> &FunctionDef {
        &self.functions[id.index()]
    }
}

impl fmt::Debug for ExprArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExprArena")
            .field("exprs", &self.exprs.len())
            .field("stmts", &self.stmts.len())
            .field("functions", &self.functions.len())
            .finish_non_exhaustive()
    }
}

/// Read-only arena shared by a program and every closure created from it.
#[derive(Clone)]
pub struct SharedArena(Arc<ExprArena>);

impl SharedArena {
    pub fn new(arena: ExprArena) -> Self {
        SharedArena(Arc::new(arena))
    }

    /// Whether both handles point at the same arena.
    #[inline]
    pub fn ptr_eq(&self, other: &SharedArena) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for SharedArena {
    type Target = ExprArena;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SharedArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
