//! Quack syntax tree
//!
//! The tree vocabulary shared by every compiler pass: spans, static type
//! names, the closed node-kind enums, a read-only visitor and the desugarer
//! that runs before any semantic analysis.

pub mod ast;
pub mod desugar;
pub mod span;
pub mod ty;

pub use ast::{
    AssignTarget, BinaryOp, ClassDecl, ElifBranch, Expr, ExprKind, MethodDecl, Param, Program,
    Stmt, StmtKind, UnaryOp, Visitor,
};
pub use desugar::{desugar, DEFAULT_ENTRY_CLASS};
pub use span::Span;
pub use ty::Type;
