//! Compilation errors
//!
//! One taxonomy covers every stage. The first error aborts the whole
//! pipeline, so these are returned, never collected.

use quack_syntax::Span;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Errors that can occur while compiling a program
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    /// Two class declarations (or a class and a builtin) share a name
    #[error("duplicate class '{name}'")]
    DuplicateClass { name: String, span: Span },

    /// A superclass is not a known class, or the superclass chain loops
    #[error("unknown superclass '{superclass}' of class '{class}'")]
    UnknownSuperclass {
        class: String,
        superclass: String,
        span: Span,
    },

    /// A local variable is read on a path where it was never assigned
    #[error("variable '{name}' may be used before assignment in {method}")]
    UseBeforeAssignment {
        name: String,
        method: String,
        span: Span,
    },

    /// Incompatible types once both sides are resolved
    #[error("type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        expected: String,
        actual: String,
        span: Span,
    },

    /// Method or field not found anywhere along the receiver's superclass chain
    #[error("'{class}' has no {kind} '{member}'")]
    UnknownMember {
        class: String,
        member: String,
        kind: MemberKind,
        span: Span,
    },

    /// A type that could not be determined or does not exist
    #[error("unresolved type: {what}")]
    UnresolvedType { what: String, span: Span },

    /// A tree shape no pass expects to see
    #[error("internal compiler error: {message}")]
    StructuralInvariantViolation { message: String, span: Span },

    /// The builtin descriptor table could not be used
    #[error("invalid builtin table: {message}")]
    InvalidBuiltins { message: String },
}

/// Member kinds for [`CompileError::UnknownMember`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Field,
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberKind::Method => f.write_str("method"),
            MemberKind::Field => f.write_str("field"),
        }
    }
}

impl CompileError {
    /// Source location of the offending node, if there is one
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::DuplicateClass { span, .. }
            | CompileError::UnknownSuperclass { span, .. }
            | CompileError::UseBeforeAssignment { span, .. }
            | CompileError::TypeMismatch { span, .. }
            | CompileError::UnknownMember { span, .. }
            | CompileError::UnresolvedType { span, .. }
            | CompileError::StructuralInvariantViolation { span, .. } => Some(*span),
            CompileError::InvalidBuiltins { .. } => None,
        }
    }

    pub fn structural(message: impl Into<String>, span: Span) -> Self {
        CompileError::StructuralInvariantViolation {
            message: message.into(),
            span,
        }
    }

    pub fn mismatch(
        context: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
        span: Span,
    ) -> Self {
        CompileError::TypeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            span,
        }
    }
}
