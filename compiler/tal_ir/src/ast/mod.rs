//! AST node types.
//!
//! Expressions and statements are stored flat in an
//! [`ExprArena`](crate::ExprArena); every child reference is an id or a range.
//! Optional type annotations in source are dropped by the front end and
//! never appear here.

mod operators;

pub use operators::{BinaryOp, UnaryOp};

use crate::{
    BranchRange, EntryRange, ExprId, ExprRange, FunctionId, Name, ParamRange, Span, StmtId,
    StmtRange,
};

/// Expression node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

/// Expression variants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExprKind {
    Null,
    Bool(bool),
    /// Number literal, stored as `f64::to_bits`.
    Number(u64),
    Str(Name),
    Ident(Name),
    Array(ExprRange),
    Object(EntryRange),
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// `cond ? then_expr : else_expr`
    Ternary {
        cond: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    },
    Call {
        callee: ExprId,
        args: ExprRange,
    },
    /// `receiver.property`
    Member {
        receiver: ExprId,
        property: Name,
    },
    /// `receiver[index]`
    Index {
        receiver: ExprId,
        index: ExprId,
    },
    /// `target = value`, or `target op= value` when `op` is set.
    Assign {
        target: ExprId,
        op: Option<BinaryOp>,
        value: ExprId,
    },
    /// Anonymous or named function expression.
    Function(FunctionId),
}

impl ExprKind {
    /// Decode a number literal.
    #[inline]
    pub fn number_value(bits: u64) -> f64 {
        f64::from_bits(bits)
    }
}

/// `key: value` entry in an object literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: Name,
    pub value: ExprId,
}

/// Statement node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub const fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

/// Statement variants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StmtKind {
    Expr(ExprId),
    /// `let name = init;`
    Let {
        name: Name,
        init: Option<ExprId>,
    },
    /// `function name(params) { ... }`
    Function(FunctionId),
    /// `if (c) {..} elif (c) {..} else {..}`
    If {
        branches: BranchRange,
        else_body: Option<StmtRange>,
    },
    While {
        cond: ExprId,
        body: StmtRange,
    },
    /// `for (binding in iterable) { ... }`
    ForIn {
        binding: Name,
        iterable: ExprId,
        body: StmtRange,
    },
    Break,
    Continue,
    Return(Option<ExprId>),
    Throw(ExprId),
    Try {
        body: StmtRange,
        handler: Option<Handler>,
        finally: Option<StmtRange>,
    },
    /// `import name;`
    Import(Name),
}

/// One `if`/`elif` arm.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CondBranch {
    pub cond: ExprId,
    pub body: StmtRange,
}

/// `except (binding) { body }`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Handler {
    pub binding: Option<Name>,
    pub body: StmtRange,
}

/// Function definition shared by declarations and function expressions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: Option<Name>,
    pub params: ParamRange,
    pub body: FunctionBody,
    pub span: Span,
}

/// Body of a function.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionBody {
    /// `function(params) { stmts }`
    Block(StmtRange),
    /// `fn(params) => expr`
    Expr(ExprId),
}
