//! Compiled class units and the builder that assembles method bodies

use crate::instr::{Constant, Instr};
use serde::Serialize;

/// One method (or the constructor) of a compiled class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledMethod {
    pub name: String,
    pub params: Vec<String>,
    /// Locals in order of first assignment, parameters excluded
    pub locals: Vec<String>,
    pub instructions: Vec<Instr>,
}

impl CompiledMethod {
    /// Instruction text, one line per instruction, without indentation
    pub fn lines(&self) -> Vec<String> {
        self.instructions.iter().map(ToString::to_string).collect()
    }
}

/// One class unit, consumed independently by the assembler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledClass {
    pub name: String,
    pub superclass: String,
    pub fields: Vec<String>,
    /// Constructor first, then methods in declaration order
    pub methods: Vec<CompiledMethod>,
}

impl CompiledClass {
    pub fn method(&self, name: &str) -> Option<&CompiledMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Helper for building one method body
pub struct MethodBuilder {
    name: String,
    params: Vec<String>,
    locals: Vec<String>,
    code: Vec<Instr>,
}

impl MethodBuilder {
    pub fn new(name: String, params: Vec<String>, locals: Vec<String>) -> Self {
        Self {
            name,
            params,
            locals,
            code: vec![Instr::Enter],
        }
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn emit(&mut self, instr: Instr) {
        self.code.push(instr);
    }

    pub fn emit_const(&mut self, value: Constant) {
        self.code.push(Instr::Const(value));
    }

    pub fn emit_label(&mut self, label: &str) {
        self.code.push(Instr::Label(label.to_string()));
    }

    /// Check if the last emitted instruction returns
    pub fn ends_in_return(&self) -> bool {
        self.code.last().is_some_and(Instr::is_return)
    }

    pub fn build(self) -> CompiledMethod {
        CompiledMethod {
            name: self.name,
            params: self.params,
            locals: self.locals,
            instructions: self.code,
        }
    }
}
