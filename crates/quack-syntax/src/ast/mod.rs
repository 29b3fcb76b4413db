//! Abstract Syntax Tree for Quack
//!
//! The tree is produced by an external grammar-driven parser and handed to
//! the compiler core, usually as JSON. Every node kind is a closed enum case
//! carrying only its own operands, so each pass gets exhaustiveness checking.
//!
//! # Example
//!
//! ```ignore
//! use quack_syntax::ast::*;
//!
//! // class C() { def m(): Int { return 1 + 2; } }
//! let class = ClassDecl::new("C", None)
//!     .with_method(MethodDecl::new("m", vec![], Some("Int"), vec![
//!         Stmt::ret(Some(Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2)))),
//!     ]));
//! ```

pub mod expression;
pub mod statement;
pub mod visitor;

pub use expression::*;
pub use statement::*;
pub use visitor::*;

use crate::span::Span;
use crate::ty::Type;
use serde::{Deserialize, Serialize};

/// A whole compilation unit: class declarations followed by top-level statements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    /// Top-level statements. Empty once the desugarer has wrapped them.
    #[serde(default)]
    pub main: Vec<Stmt>,
}

impl Program {
    pub fn new(classes: Vec<ClassDecl>, main: Vec<Stmt>) -> Self {
        Self { classes, main }
    }

    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// Formal parameter `name: Type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<Type>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// `class Name(params) extends Super { body methods }`
///
/// The statements of the class body form the constructor; fields are the
/// names stored through `this.f = ...` in that body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub span: Span,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>, superclass: Option<&str>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            superclass: superclass.map(String::from),
            body: Vec::new(),
            methods: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Vec<Stmt>) -> Self {
        self.body = body;
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Superclass name with the implicit root filled in.
    pub fn superclass_name(&self) -> &str {
        self.superclass.as_deref().unwrap_or(crate::ty::OBJ)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Fields stored through `this.f = ...` anywhere in the constructor body,
    /// in order of first appearance.
    pub fn field_names(&self) -> Vec<String> {
        let mut collector = FieldCollector::default();
        for stmt in &self.body {
            collector.visit_stmt(stmt);
        }
        collector.fields
    }
}

/// `def name(params): Ret { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub return_type: Option<Type>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

impl MethodDecl {
    pub fn new(
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: Option<&str>,
        body: Vec<Stmt>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type: return_type.map(Type::from),
            body,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Default)]
struct FieldCollector {
    fields: Vec<String>,
}

impl Visitor for FieldCollector {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let StmtKind::StoreField { object, field, .. } = &stmt.kind {
            if object.is_this() && !self.fields.iter().any(|f| f == field) {
                self.fields.push(field.clone());
            }
        }
        walk_stmt(self, stmt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_in_first_store_order() {
        let class = ClassDecl::new("Pt", None).with_body(vec![
            Stmt::store_field(Expr::this(), "x", Expr::int(1)),
            Stmt::if_(
                Expr::bool(true),
                vec![Stmt::store_field(Expr::this(), "y", Expr::int(2))],
                vec![],
                Some(vec![Stmt::store_field(Expr::this(), "x", Expr::int(3))]),
            ),
            Stmt::store_field(Expr::var("other"), "z", Expr::int(4)),
        ]);
        assert_eq!(class.field_names(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_superclass_defaults_to_root() {
        assert_eq!(ClassDecl::new("A", None).superclass_name(), "Obj");
        assert_eq!(ClassDecl::new("B", Some("A")).superclass_name(), "A");
    }
}
