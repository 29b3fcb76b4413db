//! Builtin Type Signatures
//!
//! The builtin descriptor table maps each builtin class to its superclass,
//! typed fields and method signatures. It is an external asset loaded before
//! compilation; a default table is embedded in this crate.

use crate::error::{CompileError, CompileResult};
use quack_syntax::ty::OBJ;
use quack_syntax::Type;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

const STANDARD_TABLE: &str = include_str!("../builtins/builtin_methods.json");

/// Method signature of a builtin class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltinMethod {
    #[serde(default)]
    pub params: Vec<Type>,
    pub ret: Type,
}

/// Descriptor of one builtin class
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuiltinClass {
    /// Superclass; absent means the root for every class but the root itself
    #[serde(rename = "super", default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub fields: FxHashMap<String, Type>,
    #[serde(default)]
    pub methods: FxHashMap<String, BuiltinMethod>,
}

impl BuiltinClass {
    pub fn new(superclass: Option<&str>) -> Self {
        Self {
            superclass: superclass.map(String::from),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, name: &str, params: Vec<&str>, ret: &str) -> Self {
        self.methods.insert(
            name.to_string(),
            BuiltinMethod {
                params: params.into_iter().map(Type::from).collect(),
                ret: Type::from(ret),
            },
        );
        self
    }

    pub fn with_field(mut self, name: &str, ty: &str) -> Self {
        self.fields.insert(name.to_string(), Type::from(ty));
        self
    }
}

/// Read-only table of builtin classes, keyed by class name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuiltinTable {
    classes: FxHashMap<String, BuiltinClass>,
}

impl BuiltinTable {
    /// The table shipped with the compiler
    pub fn standard() -> CompileResult<Self> {
        Self::from_json(STANDARD_TABLE)
    }

    /// Parse and validate a descriptor table
    pub fn from_json(source: &str) -> CompileResult<Self> {
        let table: BuiltinTable =
            serde_json::from_str(source).map_err(|e| CompileError::InvalidBuiltins {
                message: e.to_string(),
            })?;
        table.validate()?;
        Ok(table)
    }

    pub fn with_class(mut self, name: &str, class: BuiltinClass) -> Self {
        self.classes.insert(name.to_string(), class);
        self
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinClass> {
        self.classes.get(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes in name order, so symbol table seeding is deterministic
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BuiltinClass)> {
        let mut entries: Vec<_> = self.classes.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    /// Superclass of a builtin with the implicit root filled in
    pub fn superclass_of(&self, name: &str) -> Option<&str> {
        if name == OBJ {
            return None;
        }
        let class = self.classes.get(name)?;
        Some(class.superclass.as_deref().unwrap_or(OBJ))
    }

    fn validate(&self) -> CompileResult<()> {
        match self.classes.get(OBJ) {
            None => Err(CompileError::InvalidBuiltins {
                message: format!("missing root class '{}'", OBJ),
            }),
            Some(root) if root.superclass.is_some() => Err(CompileError::InvalidBuiltins {
                message: format!("root class '{}' cannot have a superclass", OBJ),
            }),
            Some(_) => Ok(()),
        }
    }
}
