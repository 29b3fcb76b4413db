//! AST visitor pattern for traversing the syntax tree
//!
//! Visitors are used for whole-tree queries that do not care about control
//! flow: collecting fields and locals, counting nodes. Passes with their own
//! flow rules (definite assignment, inference, code generation) match on the
//! node kinds directly.
//!
//! # Example
//!
//! ```ignore
//! use quack_syntax::ast::*;
//!
//! struct CountCalls {
//!     count: usize,
//! }
//!
//! impl Visitor for CountCalls {
//!     fn visit_expr(&mut self, expr: &Expr) {
//!         if matches!(expr.kind, ExprKind::Call { .. }) {
//!             self.count += 1;
//!         }
//!         walk_expr(self, expr);
//!     }
//! }
//! ```

use super::*;

/// AST visitor trait
///
/// Each visit method has a default implementation that calls the
/// corresponding walk function.
pub trait Visitor: Sized {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_class(&mut self, class: &ClassDecl) {
        walk_class(self, class);
    }

    fn visit_method(&mut self, method: &MethodDecl) {
        walk_method(self, method);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

// ============================================================================
// Walk Functions - Default Traversal Implementations
// ============================================================================

pub fn walk_program<V: Visitor>(visitor: &mut V, program: &Program) {
    for class in &program.classes {
        visitor.visit_class(class);
    }
    for stmt in &program.main {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_class<V: Visitor>(visitor: &mut V, class: &ClassDecl) {
    for stmt in &class.body {
        visitor.visit_stmt(stmt);
    }
    for method in &class.methods {
        visitor.visit_method(method);
    }
}

pub fn walk_method<V: Visitor>(visitor: &mut V, method: &MethodDecl) {
    for stmt in &method.body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &[Stmt]) {
    for stmt in block {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Expr(expr) => visitor.visit_expr(expr),
        StmtKind::Assign { value, .. } => visitor.visit_expr(value),
        StmtKind::StoreField { object, value, .. } => {
            visitor.visit_expr(value);
            visitor.visit_expr(object);
        }
        StmtKind::CompoundAssign { target, value, .. } => {
            if let AssignTarget::Field { object, .. } = target {
                visitor.visit_expr(object);
            }
            visitor.visit_expr(value);
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::If {
            cond,
            then_block,
            elifs,
            else_block,
        } => {
            visitor.visit_expr(cond);
            walk_block(visitor, then_block);
            for elif in elifs {
                visitor.visit_expr(&elif.cond);
                walk_block(visitor, &elif.block);
            }
            if let Some(else_block) = else_block {
                walk_block(visitor, else_block);
            }
        }
        StmtKind::While { cond, body } => {
            visitor.visit_expr(cond);
            walk_block(visitor, body);
        }
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Int(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Nothing
        | ExprKind::Var(_) => {}
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::And(left, right) | ExprKind::Or(left, right) => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Call { receiver, args, .. } => {
            visitor.visit_expr(receiver);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::New { args, .. } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::LoadField { object, .. } => visitor.visit_expr(object),
    }
}

/// Counts statements and expressions; bounds the inference fixed point.
#[derive(Debug, Default)]
pub struct NodeCounter {
    pub count: usize,
}

impl Visitor for NodeCounter {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        self.count += 1;
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        self.count += 1;
        walk_expr(self, expr);
    }
}

/// Local variables assigned in a body, in order of first assignment.
pub fn assigned_locals(body: &[Stmt]) -> Vec<String> {
    struct Locals(Vec<String>);

    impl Visitor for Locals {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let StmtKind::Assign { target, .. } = &stmt.kind {
                if !self.0.contains(target) {
                    self.0.push(target.clone());
                }
            }
            walk_stmt(self, stmt);
        }
    }

    let mut locals = Locals(Vec::new());
    walk_block(&mut locals, body);
    locals.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_counter() {
        let program = Program::new(
            vec![],
            vec![Stmt::assign(
                "x",
                None,
                Expr::call(Expr::int(1), "plus", vec![Expr::int(2)]),
            )],
        );
        let mut counter = NodeCounter::default();
        counter.visit_program(&program);
        // assign + call + two literals
        assert_eq!(counter.count, 4);
    }

    #[test]
    fn test_assigned_locals_in_order() {
        let body = vec![
            Stmt::assign("b", None, Expr::int(1)),
            Stmt::while_(
                Expr::bool(true),
                vec![Stmt::assign("a", None, Expr::int(2)), Stmt::assign("b", None, Expr::int(3))],
            ),
        ];
        assert_eq!(assigned_locals(&body), vec!["b".to_string(), "a".to_string()]);
    }
}
