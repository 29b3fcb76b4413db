//! Subtyping and join over the class lattice
//!
//! Subtyping is nominal: `A <: B` iff `B` is on `A`'s superclass chain. The
//! join of two classes is their nearest common ancestor, which always exists
//! because every chain ends at the root.

use crate::symbols::SymbolTable;
use quack_syntax::Type;
use rustc_hash::FxHashSet;

impl SymbolTable {
    /// Check if `sub` is a subtype of `sup` (sub <: sup)
    pub fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        // Reflexivity: T <: T
        if sub == sup {
            return true;
        }
        self.ancestors(sub.name()).any(|entry| entry.name == sup.name())
    }

    /// Nearest common ancestor of `a` and `b`.
    ///
    /// A name missing from the table has no chain of its own, so the join
    /// falls back to the root.
    pub fn join(&self, a: &Type, b: &Type) -> Type {
        if a == b {
            return a.clone();
        }
        let left: FxHashSet<&str> = self.ancestors(a.name()).map(|e| e.name.as_str()).collect();
        self.ancestors(b.name())
            .find(|entry| left.contains(entry.name.as_str()))
            .map(|entry| entry.ty())
            .unwrap_or_else(Type::obj)
    }

    /// Join where `None` (not yet resolved) is the bottom element
    pub fn join_opt(&self, a: Option<&Type>, b: Option<&Type>) -> Option<Type> {
        match (a, b) {
            (None, None) => None,
            (Some(t), None) | (None, Some(t)) => Some(t.clone()),
            (Some(a), Some(b)) => Some(self.join(a, b)),
        }
    }

    /// Length of the longest superclass chain
    pub fn depth(&self) -> usize {
        self.entries()
            .map(|entry| self.ancestors(&entry.name).count())
            .max()
            .unwrap_or(0)
    }
}
