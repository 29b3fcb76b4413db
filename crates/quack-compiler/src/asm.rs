//! Assembly text output
//!
//! One `.asm` unit per class:
//!
//! ```text
//! .class Pt:Obj
//! .field x
//!
//! .method $constructor
//! .args x
//!     enter
//!     ...
//! ```

use crate::module_builder::{CompiledClass, CompiledMethod};
use std::fmt::{self, Write};

impl CompiledClass {
    /// File name of this unit
    pub fn file_name(&self) -> String {
        format!("{}.asm", self.name)
    }

    /// Render the assembler text of this unit
    pub fn to_asm(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = write_class(&mut out, self);
        out
    }
}

pub fn write_class(out: &mut impl Write, class: &CompiledClass) -> fmt::Result {
    writeln!(out, ".class {}:{}", class.name, class.superclass)?;
    for field in &class.fields {
        writeln!(out, ".field {}", field)?;
    }
    writeln!(out)?;
    for method in &class.methods {
        write_method(out, method)?;
    }
    Ok(())
}

fn write_method(out: &mut impl Write, method: &CompiledMethod) -> fmt::Result {
    writeln!(out, ".method {}", method.name)?;
    if !method.params.is_empty() {
        writeln!(out, ".args {}", method.params.join(","))?;
    }
    if !method.locals.is_empty() {
        writeln!(out, ".local {}", method.locals.join(","))?;
    }
    for instr in &method.instructions {
        if instr.is_label() {
            writeln!(out, "{}", instr)?;
        } else {
            writeln!(out, "\t{}", instr)?;
        }
    }
    writeln!(out)
}
