//! Whole-program class table
//!
//! Built once per compilation by the class loader, then shared read-only by
//! every later pass. Member lookup walks from a class up its superclass
//! chain and returns the most-derived definition.

use crate::builtins::BuiltinTable;
use crate::error::{CompileError, CompileResult};
use quack_syntax::ty::CONSTRUCTOR;
use quack_syntax::{Span, Type};
use rustc_hash::FxHashMap;

/// Parameter types and return type of a method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub params: Vec<Type>,
    /// Declared return type; `None` when it has to be inferred
    pub ret: Option<Type>,
}

impl MethodSignature {
    pub fn new(params: Vec<Type>, ret: Option<Type>) -> Self {
        Self { params, ret }
    }
}

/// One class in the table
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntry {
    pub name: String,
    /// `None` only for the root class
    pub superclass: Option<String>,
    /// Field types; user fields start untyped and are typed by inference
    pub fields: FxHashMap<String, Option<Type>>,
    pub methods: FxHashMap<String, MethodSignature>,
    pub builtin: bool,
    pub span: Span,
}

impl ClassEntry {
    pub fn new(name: impl Into<String>, superclass: Option<&str>) -> Self {
        Self {
            name: name.into(),
            superclass: superclass.map(String::from),
            fields: FxHashMap::default(),
            methods: FxHashMap::default(),
            builtin: false,
            span: Span::default(),
        }
    }

    pub fn ty(&self) -> Type {
        Type::new(self.name.clone())
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.get(name)
    }

    pub fn constructor(&self) -> Option<&MethodSignature> {
        self.methods.get(CONSTRUCTOR)
    }
}

/// Mapping from class name to [`ClassEntry`]
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    classes: FxHashMap<String, ClassEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding exactly the builtin classes
    pub fn from_builtins(builtins: &BuiltinTable) -> Self {
        let mut table = SymbolTable::new();
        for (name, class) in builtins.iter() {
            let mut entry = ClassEntry::new(name, builtins.superclass_of(name));
            entry.builtin = true;
            for (field, ty) in &class.fields {
                entry.fields.insert(field.clone(), Some(ty.clone()));
            }
            for (method, sig) in &class.methods {
                entry.methods.insert(
                    method.clone(),
                    MethodSignature::new(sig.params.clone(), Some(sig.ret.clone())),
                );
            }
            table.classes.insert(name.to_string(), entry);
        }
        table
    }

    /// Add a class, rejecting a name that is already taken
    pub fn define(&mut self, entry: ClassEntry) -> CompileResult<()> {
        if self.classes.contains_key(&entry.name) {
            return Err(CompileError::DuplicateClass {
                name: entry.name,
                span: entry.span,
            });
        }
        self.classes.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// `class` itself followed by its superclasses, root last.
    ///
    /// Stops after visiting every class once, so a malformed chain cannot
    /// loop forever; the class loader rejects cycles before anyone relies on
    /// this.
    pub fn ancestors<'a>(&'a self, class: &str) -> Ancestors<'a> {
        Ancestors {
            table: self,
            next: self.classes.get(class),
            remaining: self.classes.len(),
        }
    }

    /// Most-derived definition of `method` visible from `class`
    pub fn lookup_method(&self, class: &str, method: &str) -> Option<(&ClassEntry, &MethodSignature)> {
        self.ancestors(class)
            .find_map(|entry| entry.methods.get(method).map(|sig| (entry, sig)))
    }

    /// Most-derived declaration of `field` visible from `class`, with its
    /// declared type if it has one
    pub fn lookup_field(&self, class: &str, field: &str) -> Option<(&ClassEntry, Option<&Type>)> {
        self.ancestors(class)
            .find_map(|entry| entry.fields.get(field).map(|ty| (entry, ty.as_ref())))
    }

    /// Constructor signature of `class`; never inherited
    pub fn constructor(&self, class: &str) -> Option<&MethodSignature> {
        self.classes.get(class).and_then(ClassEntry::constructor)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &ClassEntry> {
        self.classes.values()
    }
}

/// Iterator over a superclass chain, see [`SymbolTable::ancestors`]
pub struct Ancestors<'a> {
    table: &'a SymbolTable,
    next: Option<&'a ClassEntry>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ClassEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next?;
        self.next = current
            .superclass
            .as_deref()
            .and_then(|name| self.table.classes.get(name));
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        let mut table = SymbolTable::from_builtins(&BuiltinTable::standard().unwrap());
        let mut shape = ClassEntry::new("Shape", Some("Obj"));
        shape.methods.insert(
            "area".into(),
            MethodSignature::new(vec![], Some(Type::int())),
        );
        shape.fields.insert("name".into(), Some(Type::string()));
        table.define(shape).unwrap();

        let mut square = ClassEntry::new("Square", Some("Shape"));
        square.methods.insert(
            "area".into(),
            MethodSignature::new(vec![], None),
        );
        square.methods.insert(
            CONSTRUCTOR.into(),
            MethodSignature::new(vec![Type::int()], Some(Type::new("Square"))),
        );
        table.define(square).unwrap();
        table
    }

    #[test]
    fn test_builtins_seeded() {
        let table = SymbolTable::from_builtins(&BuiltinTable::standard().unwrap());
        assert_eq!(table.len(), 5);
        assert!(table.get("Int").unwrap().builtin);
        assert_eq!(table.get("Obj").unwrap().superclass, None);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut table = table();
        let err = table.define(ClassEntry::new("Shape", None)).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateClass { ref name, .. } if name == "Shape"));
    }

    #[test]
    fn test_ancestors_end_at_root() {
        let table = table();
        let chain: Vec<_> = table.ancestors("Square").map(|c| c.name.as_str()).collect();
        assert_eq!(chain, vec!["Square", "Shape", "Obj"]);
        assert_eq!(table.ancestors("Missing").count(), 0);
    }

    #[test]
    fn test_lookup_prefers_most_derived() {
        let table = table();
        let (owner, sig) = table.lookup_method("Square", "area").unwrap();
        assert_eq!(owner.name, "Square");
        assert_eq!(sig.ret, None);

        let (owner, _) = table.lookup_method("Square", "print").unwrap();
        assert_eq!(owner.name, "Obj");
        assert!(table.lookup_method("Square", "fly").is_none());
    }

    #[test]
    fn test_lookup_field_through_chain() {
        let table = table();
        let (owner, ty) = table.lookup_field("Square", "name").unwrap();
        assert_eq!(owner.name, "Shape");
        assert_eq!(ty, Some(&Type::string()));
        assert!(table.lookup_field("Square", "side").is_none());
    }

    #[test]
    fn test_constructor_not_inherited() {
        let mut table = table();
        table.define(ClassEntry::new("Cube", Some("Square"))).unwrap();
        assert!(table.constructor("Square").is_some());
        assert!(table.constructor("Cube").is_none());
    }
}
