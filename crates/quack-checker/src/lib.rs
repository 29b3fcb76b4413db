//! Quack Semantic Analysis
//!
//! Runs between desugaring and code generation:
//!
//! 1. class loading ([`Binder`]) builds the [`SymbolTable`]
//! 2. definite assignment ([`VarChecker`]) rejects reads of unassigned locals
//! 3. type inference ([`TypeInferencer`]) attaches a static type to every
//!    expression and assignment target
//! 4. type checking ([`TypeChecker`]) validates the converged types
//!
//! # Example
//!
//! ```ignore
//! use quack_checker::analyze;
//! use quack_types::BuiltinTable;
//!
//! let builtins = BuiltinTable::standard()?;
//! let mut program = quack_syntax::desugar(parsed, "Main");
//! let symbols = analyze(&mut program, &builtins)?;
//! ```

pub mod binder;
pub mod checker;
pub mod env;
pub mod flow;
pub mod infer;

pub use binder::Binder;
pub use checker::TypeChecker;
pub use env::VariableEnv;
pub use flow::{falls_through, VarChecker};
pub use infer::{Scope, TypeInferencer};

use quack_syntax::Program;
use quack_types::{BuiltinTable, CompileResult, SymbolTable};

/// Run every analysis stage over a desugared program, annotating it in place.
pub fn analyze(program: &mut Program, builtins: &BuiltinTable) -> CompileResult<SymbolTable> {
    let symbols = Binder::new(builtins).bind_program(program)?;
    VarChecker::new().check_program(program)?;

    {
        let mut inferencer = TypeInferencer::new(&symbols);
        inferencer.infer_program(program)?;
        TypeChecker::new(&symbols, &inferencer).check_program(program)?;
    }
    Ok(symbols)
}
