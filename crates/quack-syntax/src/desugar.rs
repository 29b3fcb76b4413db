//! Desugaring
//!
//! Rewrites surface syntax into the core forms every later pass works on:
//!
//! - operators become calls of the builtin method they stand for
//!   (`a + b` → `a.plus(b)`, `a != b` → `a.equals(b).not()`, `-a` → `a.neg()`)
//! - compound assignments become a plain assignment (or a load-then-store
//!   field pair) of the matching binary call
//! - top-level statements are wrapped into a synthetic entry class whose
//!   constructor runs them
//!
//! The rewrite is purely syntactic and cannot fail.

use crate::ast::*;
use crate::span::Span;
use crate::ty::OBJ;

/// Default name of the synthesized entry class.
pub const DEFAULT_ENTRY_CLASS: &str = "Main";

/// Desugar a parsed program, wrapping its top-level statements into
/// `entry_class`.
pub fn desugar(program: Program, entry_class: &str) -> Program {
    let mut classes: Vec<ClassDecl> = program.classes.into_iter().map(desugar_class).collect();

    let main_span = program
        .main
        .first()
        .map(|s| s.span)
        .unwrap_or_default();
    let entry = ClassDecl::new(entry_class, Some(OBJ))
        .with_body(desugar_block(program.main))
        .with_span(main_span);
    classes.push(entry);

    log::debug!("desugared {} classes (entry class '{}')", classes.len(), entry_class);

    Program {
        classes,
        main: Vec::new(),
    }
}

fn desugar_class(mut class: ClassDecl) -> ClassDecl {
    class.body = desugar_block(std::mem::take(&mut class.body));
    for method in &mut class.methods {
        method.body = desugar_block(std::mem::take(&mut method.body));
    }
    class
}

fn desugar_block(block: Vec<Stmt>) -> Vec<Stmt> {
    block.into_iter().map(desugar_stmt).collect()
}

fn desugar_stmt(stmt: Stmt) -> Stmt {
    let span = stmt.span;
    let kind = match stmt.kind {
        StmtKind::Expr(expr) => StmtKind::Expr(desugar_expr(expr)),
        StmtKind::Assign {
            target,
            declared,
            value,
            target_ty,
        } => StmtKind::Assign {
            target,
            declared,
            value: desugar_expr(value),
            target_ty,
        },
        StmtKind::StoreField {
            object,
            field,
            value,
        } => StmtKind::StoreField {
            object: desugar_expr(object),
            field,
            value: desugar_expr(value),
        },
        StmtKind::CompoundAssign { target, op, value } => {
            let value = desugar_expr(value);
            match target {
                AssignTarget::Var(name) => {
                    let current = Expr::var(name.clone()).with_span(span);
                    StmtKind::Assign {
                        target: name,
                        declared: None,
                        value: operator_call(op, current, value, span),
                        target_ty: None,
                    }
                }
                AssignTarget::Field { object, field } => {
                    let object = desugar_expr(*object);
                    let current = Expr::load_field(object.clone(), field.clone()).with_span(span);
                    StmtKind::StoreField {
                        object,
                        field,
                        value: operator_call(op, current, value, span),
                    }
                }
            }
        }
        StmtKind::Return(value) => StmtKind::Return(value.map(desugar_expr)),
        StmtKind::If {
            cond,
            then_block,
            elifs,
            else_block,
        } => StmtKind::If {
            cond: desugar_expr(cond),
            then_block: desugar_block(then_block),
            elifs: elifs
                .into_iter()
                .map(|elif| ElifBranch {
                    cond: desugar_expr(elif.cond),
                    block: desugar_block(elif.block),
                })
                .collect(),
            else_block: else_block.map(desugar_block),
        },
        StmtKind::While { cond, body } => StmtKind::While {
            cond: desugar_expr(cond),
            body: desugar_block(body),
        },
    };
    Stmt::new(kind, span)
}

fn desugar_expr(expr: Expr) -> Expr {
    let span = expr.span;
    match expr.kind {
        ExprKind::Binary { op, left, right } => {
            operator_call(op, desugar_expr(*left), desugar_expr(*right), span)
        }
        ExprKind::Unary { op, operand } => {
            Expr::call(desugar_expr(*operand), op.method_name(), vec![]).with_span(span)
        }
        ExprKind::And(left, right) => {
            Expr::and(desugar_expr(*left), desugar_expr(*right)).with_span(span)
        }
        ExprKind::Or(left, right) => {
            Expr::or(desugar_expr(*left), desugar_expr(*right)).with_span(span)
        }
        ExprKind::Call {
            receiver,
            method,
            args,
        } => Expr::call(
            desugar_expr(*receiver),
            method,
            args.into_iter().map(desugar_expr).collect(),
        )
        .with_span(span),
        ExprKind::New { class, args } => {
            Expr::new_object(class, args.into_iter().map(desugar_expr).collect()).with_span(span)
        }
        ExprKind::LoadField { object, field } => {
            Expr::load_field(desugar_expr(*object), field).with_span(span)
        }
        kind @ (ExprKind::Int(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Nothing
        | ExprKind::Var(_)) => Expr {
            kind,
            span,
            ty: expr.ty,
        },
    }
}

fn operator_call(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Expr {
    let call = Expr::call(left, op.method_name(), vec![right]).with_span(span);
    if op == BinaryOp::NotEqual {
        Expr::call(call, UnaryOp::Not.method_name(), vec![]).with_span(span)
    } else {
        call
    }
}
