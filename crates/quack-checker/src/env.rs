//! Per-method variable environments
//!
//! Local types only ever widen: every assignment joins the value type into
//! what is already known. An annotated local is pinned to its annotation and
//! later unannotated assignments never move it.

use quack_syntax::Type;
use quack_types::SymbolTable;
use rustc_hash::FxHashMap;

/// Local name → current type for one method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableEnv {
    types: FxHashMap<String, Type>,
    declared: FxHashMap<String, Type>,
}

impl VariableEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    /// First annotation seen for `name`
    pub fn declared(&self, name: &str) -> Option<&Type> {
        self.declared.get(name)
    }

    /// Record an annotation. Returns true if the environment changed.
    pub fn declare(&mut self, name: &str, ty: &Type) -> bool {
        let pinned = self
            .declared
            .entry(name.to_string())
            .or_insert_with(|| ty.clone())
            .clone();
        self.set(name, pinned)
    }

    /// Join an assigned value type into `name`. Returns true if the
    /// environment changed.
    pub fn record(&mut self, name: &str, ty: &Type, symbols: &SymbolTable) -> bool {
        if self.declared.contains_key(name) {
            return false;
        }
        let joined = symbols.join_opt(self.types.get(name), Some(ty));
        match joined {
            Some(joined) => self.set(name, joined),
            None => false,
        }
    }

    fn set(&mut self, name: &str, ty: Type) -> bool {
        if self.types.get(name) == Some(&ty) {
            return false;
        }
        self.types.insert(name.to_string(), ty);
        true
    }
}
