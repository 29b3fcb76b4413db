//! Compilation errors
//!
//! Every stage shares one taxonomy, defined next to the class table.

pub use quack_types::error::{CompileError, CompileResult, MemberKind};
