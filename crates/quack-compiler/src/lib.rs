//! Quack Compiler - syntax tree to stack machine assembly
//!
//! Drives the whole pipeline: desugar, class loading, definite assignment,
//! type inference and code generation. The first error aborts the run and
//! nothing is produced.
//!
//! # Example
//!
//! ```ignore
//! use quack_compiler::{CompileOptions, Compiler};
//! use quack_types::BuiltinTable;
//!
//! let builtins = BuiltinTable::standard()?;
//! let classes = Compiler::new(&builtins, CompileOptions::default()).compile(program)?;
//! for class in &classes {
//!     std::fs::write(class.file_name(), class.to_asm())?;
//! }
//! ```

pub mod asm;
pub mod codegen;
pub mod error;
pub mod instr;
pub mod module_builder;

pub use codegen::{CodeGenerator, LabelAllocator};
pub use error::{CompileError, CompileResult};
pub use instr::{Constant, Instr};
pub use module_builder::{CompiledClass, CompiledMethod};

use quack_syntax::{desugar, Program, DEFAULT_ENTRY_CLASS};
use quack_types::BuiltinTable;

/// Options for one compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name of the class wrapping the top-level statements
    pub entry_class: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            entry_class: DEFAULT_ENTRY_CLASS.to_string(),
        }
    }
}

/// Main compiler entry point
pub struct Compiler<'a> {
    builtins: &'a BuiltinTable,
    options: CompileOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(builtins: &'a BuiltinTable, options: CompileOptions) -> Self {
        Self { builtins, options }
    }

    /// Compile a parsed program into one unit per class
    pub fn compile(&self, program: Program) -> CompileResult<Vec<CompiledClass>> {
        let program = self.analyze(program)?;
        CodeGenerator::new().compile_program(&program)
    }

    /// Desugar and analyze without generating code, returning the typed tree
    pub fn analyze(&self, program: Program) -> CompileResult<Program> {
        log::debug!(
            "compiling {} classes, entry class '{}'",
            program.classes.len(),
            self.options.entry_class
        );
        let mut program = desugar(program, &self.options.entry_class);
        quack_checker::analyze(&mut program, self.builtins)?;
        Ok(program)
    }
}
