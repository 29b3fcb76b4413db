//! Quack Type System
//!
//! Error taxonomy, builtin descriptor table and the whole-program class
//! table with its subtyping lattice.

pub mod builtins;
pub mod error;
pub mod subtyping;
pub mod symbols;

pub use builtins::{BuiltinClass, BuiltinMethod, BuiltinTable};
pub use error::{CompileError, CompileResult, MemberKind};
pub use symbols::{Ancestors, ClassEntry, MethodSignature, SymbolTable};
