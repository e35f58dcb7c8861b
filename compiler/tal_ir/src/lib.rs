//! Tal IR - the syntax tree handed to the evaluator.
//!
//! Lexing and parsing live outside this workspace. A front end (or a test)
//! produces a [`Program`] through [`AstBuilder`], and the evaluator walks it.
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers and string literals are `Name(u32)`
//! - **Flatten Everything**: no `Box<Expr>`, nodes refer to each other by
//!   `ExprId`/`StmtId` indices into an [`ExprArena`]
//! - **Share the arena**: closures keep the arena alive through [`SharedArena`]
//!
//! Types that contain floats store them as u64 bits for Hash compatibility.

mod arena;
pub mod ast;
mod builder;
mod ids;
mod interner;
mod name;
mod ranges;
mod span;

pub use arena::{ExprArena, SharedArena};
pub use ast::{
    BinaryOp, CondBranch, Expr, ExprKind, FunctionBody, FunctionDef, Handler, ObjectEntry, Stmt,
    StmtKind, UnaryOp,
};
pub use builder::{AstBuilder, Program};
pub use ids::{ExprId, FunctionId, StmtId};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use ranges::{BranchRange, EntryRange, ExprRange, ParamRange, StmtRange};
pub use span::Span;
