//! Static type names
//!
//! Quack is nominal: a static type is just the name of a class, builtin or
//! user-defined. An unresolved type is represented by `Option<Type>::None`
//! wherever a type slot exists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of every inheritance chain.
pub const OBJ: &str = "Obj";
/// Integer literals.
pub const INT: &str = "Int";
/// String literals.
pub const STRING: &str = "String";
/// `true` / `false`, conditions and short-circuit results.
pub const BOOL: &str = "Bool";
/// The `none` literal and methods without a useful result.
pub const NOTHING: &str = "Nothing";

/// Method name under which a class constructor is registered and emitted.
pub const CONSTRUCTOR: &str = "$constructor";

/// Receiver name that always denotes the current object.
pub const THIS: &str = "this";

/// A class name used as a static type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Type(String);

impl Type {
    pub fn new(name: impl Into<String>) -> Self {
        Type(name.into())
    }

    pub fn obj() -> Self {
        Type::new(OBJ)
    }

    pub fn int() -> Self {
        Type::new(INT)
    }

    pub fn string() -> Self {
        Type::new(STRING)
    }

    pub fn bool() -> Self {
        Type::new(BOOL)
    }

    pub fn nothing() -> Self {
        Type::new(NOTHING)
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Type {
    fn from(name: &str) -> Self {
        Type::new(name)
    }
}

impl From<String> for Type {
    fn from(name: String) -> Self {
        Type(name)
    }
}
