//! Stack machine instructions
//!
//! `Display` renders the exact assembler text the VM loader expects.

use serde::Serialize;
use std::fmt;

/// Name a method body uses for its receiver
pub const SELF_SLOT: &str = "$";

/// Constant operand of `const`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    Int(i64),
    Str(String),
    Bool(bool),
    Nothing,
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "{}", value),
            Constant::Str(value) => {
                f.write_str("\"")?;
                for c in value.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
            Constant::Bool(true) => f.write_str("true"),
            Constant::Bool(false) => f.write_str("false"),
            Constant::Nothing => f.write_str("nothing"),
        }
    }
}

/// One line of a method body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Instr {
    /// Method prologue
    Enter,
    Const(Constant),
    Load(String),
    Store(String),
    LoadField { class: String, field: String },
    StoreField { class: String, field: String },
    New(String),
    Call { class: String, method: String },
    /// Move the value `n` slots down to the top of the stack
    Roll(usize),
    Pop,
    Jump(String),
    JumpIf(String),
    JumpIfNot(String),
    /// Jump target, written at column 0
    Label(String),
    /// Return the top of stack, popping `n` arguments
    Return(usize),
}

impl Instr {
    pub fn is_label(&self) -> bool {
        matches!(self, Instr::Label(_))
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Instr::Return(_))
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Enter => f.write_str("enter"),
            Instr::Const(value) => write!(f, "const {}", value),
            Instr::Load(name) => write!(f, "load {}", name),
            Instr::Store(name) => write!(f, "store {}", name),
            Instr::LoadField { class, field } => write!(f, "load_field {}:{}", class, field),
            Instr::StoreField { class, field } => write!(f, "store_field {}:{}", class, field),
            Instr::New(class) => write!(f, "new {}", class),
            Instr::Call { class, method } => write!(f, "call {}:{}", class, method),
            Instr::Roll(n) => write!(f, "roll {}", n),
            Instr::Pop => f.write_str("pop"),
            Instr::Jump(label) => write!(f, "jump {}", label),
            Instr::JumpIf(label) => write!(f, "jump_if {}", label),
            Instr::JumpIfNot(label) => write!(f, "jump_ifnot {}", label),
            Instr::Label(label) => write!(f, "{}:", label),
            Instr::Return(n) => write!(f, "return {}", n),
        }
    }
}
