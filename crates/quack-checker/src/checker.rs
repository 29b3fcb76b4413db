//! Type checker
//!
//! Runs once inference has converged. Every expression must carry a type by
//! now; this walk reports the first member that does not exist, the first
//! type that stayed unresolved and the first value that does not fit where it
//! is used.

use crate::flow::falls_through;
use crate::infer::{Scope, TypeInferencer};
use quack_syntax::ast::*;
use quack_syntax::{Span, Type};
use quack_types::{CompileError, CompileResult, MemberKind, SymbolTable};

/// Type checker over an inferred program
pub struct TypeChecker<'a> {
    symbols: &'a SymbolTable,
    inferred: &'a TypeInferencer<'a>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(symbols: &'a SymbolTable, inferred: &'a TypeInferencer<'a>) -> Self {
        TypeChecker { symbols, inferred }
    }

    pub fn check_program(&self, program: &Program) -> CompileResult<()> {
        for class in &program.classes {
            let scope = Scope::constructor(class);
            self.check_block(&scope, &class.body)?;

            for method in &class.methods {
                let scope = Scope::method(&class.name, method);
                self.check_block(&scope, &method.body)?;
                if falls_through(&method.body) {
                    // The implicit epilogue returns `nothing`
                    self.check_return(&scope, method.span, None)?;
                }
            }
        }
        Ok(())
    }

    fn check_block(&self, scope: &Scope, block: &[Stmt]) -> CompileResult<()> {
        block.iter().try_for_each(|stmt| self.check_stmt(scope, stmt))
    }

    fn check_stmt(&self, scope: &Scope, stmt: &Stmt) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.check_expr(scope, expr).map(drop),
            StmtKind::Assign {
                target,
                declared,
                value,
                target_ty,
            } => self.check_assign(scope, stmt.span, target, declared.as_ref(), value, target_ty.as_ref()),
            StmtKind::StoreField {
                object,
                field,
                value,
            } => {
                let value_ty = self.check_expr(scope, value)?;
                let object_ty = self.check_expr(scope, object)?;
                let Some((owner, _)) = self.symbols.lookup_field(object_ty.name(), field) else {
                    return Err(unknown_member(&object_ty, field, MemberKind::Field, stmt.span));
                };
                let field_ty = self.inferred.field_type(object_ty.name(), field).ok_or_else(|| {
                    CompileError::UnresolvedType {
                        what: format!("field {}.{}", owner.name, field),
                        span: stmt.span,
                    }
                })?;
                self.expect_subtype(
                    &value_ty,
                    &field_ty,
                    format!("store to field {}.{}", owner.name, field),
                    value.span,
                )
            }
            StmtKind::Return(value) => self.check_return(scope, stmt.span, value.as_ref()),
            StmtKind::If {
                cond,
                then_block,
                elifs,
                else_block,
            } => {
                self.check_condition(scope, cond, "if condition")?;
                self.check_block(scope, then_block)?;
                for elif in elifs {
                    self.check_condition(scope, &elif.cond, "elif condition")?;
                    self.check_block(scope, &elif.block)?;
                }
                match else_block {
                    Some(block) => self.check_block(scope, block),
                    None => Ok(()),
                }
            }
            StmtKind::While { cond, body } => {
                self.check_condition(scope, cond, "while condition")?;
                self.check_block(scope, body)
            }
            StmtKind::CompoundAssign { .. } => Err(CompileError::structural(
                "compound assignment survived desugaring",
                stmt.span,
            )),
        }
    }

    fn check_assign(
        &self,
        scope: &Scope,
        span: Span,
        target: &str,
        declared: Option<&Type>,
        value: &Expr,
        target_ty: Option<&Type>,
    ) -> CompileResult<()> {
        let value_ty = self.check_expr(scope, value)?;

        if let Some(param) = scope.param(target) {
            return self.expect_subtype(
                &value_ty,
                param,
                format!("assignment to parameter '{}'", target),
                value.span,
            );
        }

        let pinned = self
            .inferred
            .env(&scope.class, &scope.method)
            .and_then(|env| env.declared(target));
        if let Some(declared) = declared {
            if !self.symbols.contains(declared.name()) {
                return Err(CompileError::UnresolvedType {
                    what: format!("unknown type '{}'", declared),
                    span,
                });
            }
            if let Some(pinned) = pinned {
                if pinned != declared {
                    return Err(CompileError::mismatch(
                        format!("annotation of '{}'", target),
                        pinned,
                        declared,
                        span,
                    ));
                }
            }
        }

        let Some(target_ty) = target_ty else {
            return Err(CompileError::UnresolvedType {
                what: format!("variable '{}' in {}", target, scope.label()),
                span,
            });
        };
        if pinned.is_some() {
            self.expect_subtype(&value_ty, target_ty, format!("assignment to '{}'", target), value.span)?;
        }
        Ok(())
    }

    fn check_return(&self, scope: &Scope, span: Span, value: Option<&Expr>) -> CompileResult<()> {
        let value_ty = match value {
            Some(value) => self.check_expr(scope, value)?,
            None => Type::nothing(),
        };

        if scope.constructor {
            return match value {
                None => Ok(()),
                Some(_) => Err(CompileError::mismatch(
                    format!("return in constructor of {}", scope.class),
                    "no value",
                    value_ty,
                    span,
                )),
            };
        }

        match &scope.declared_ret {
            Some(ret) => self.expect_subtype(&value_ty, ret, format!("return from {}", scope.label()), span),
            None => Ok(()),
        }
    }

    fn check_condition(&self, scope: &Scope, cond: &Expr, context: &str) -> CompileResult<()> {
        let ty = self.check_expr(scope, cond)?;
        self.expect_subtype(&ty, &Type::bool(), context, cond.span)
    }

    /// Check an expression and return its static type
    fn check_expr(&self, scope: &Scope, expr: &Expr) -> CompileResult<Type> {
        match &expr.kind {
            ExprKind::Int(_) | ExprKind::Str(_) | ExprKind::Bool(_) | ExprKind::Nothing => {}
            ExprKind::Var(name) => {
                if expr.ty.is_none() {
                    return Err(CompileError::UnresolvedType {
                        what: format!("variable '{}' in {}", name, scope.label()),
                        span: expr.span,
                    });
                }
            }
            ExprKind::And(left, right) => {
                self.check_condition(scope, left, "operand of 'and'")?;
                self.check_condition(scope, right, "operand of 'and'")?;
            }
            ExprKind::Or(left, right) => {
                self.check_condition(scope, left, "operand of 'or'")?;
                self.check_condition(scope, right, "operand of 'or'")?;
            }
            ExprKind::Call {
                receiver,
                method,
                args,
            } => {
                let receiver_ty = self.check_expr(scope, receiver)?;
                let Some((owner, sig)) = self.symbols.lookup_method(receiver_ty.name(), method) else {
                    return Err(unknown_member(&receiver_ty, method, MemberKind::Method, expr.span));
                };
                let context = format!("call to {}:{}", owner.name, method);
                self.check_args(scope, &context, &sig.params, args, expr.span)?;
                if expr.ty.is_none() {
                    return Err(CompileError::UnresolvedType {
                        what: format!("result of {}:{}", owner.name, method),
                        span: expr.span,
                    });
                }
            }
            ExprKind::New { class, args } => {
                if !self.symbols.contains(class) {
                    return Err(CompileError::UnresolvedType {
                        what: format!("unknown class '{}'", class),
                        span: expr.span,
                    });
                }
                let params = self
                    .symbols
                    .constructor(class)
                    .map(|sig| sig.params.as_slice())
                    .unwrap_or(&[]);
                let context = format!("constructor of {}", class);
                self.check_args(scope, &context, params, args, expr.span)?;
            }
            ExprKind::LoadField { object, field } => {
                let object_ty = self.check_expr(scope, object)?;
                let Some((owner, _)) = self.symbols.lookup_field(object_ty.name(), field) else {
                    return Err(unknown_member(&object_ty, field, MemberKind::Field, expr.span));
                };
                if expr.ty.is_none() {
                    return Err(CompileError::UnresolvedType {
                        what: format!("field {}.{}", owner.name, field),
                        span: expr.span,
                    });
                }
            }
            ExprKind::Binary { .. } | ExprKind::Unary { .. } => {
                return Err(CompileError::structural("operator survived desugaring", expr.span));
            }
        }

        expr.ty.clone().ok_or_else(|| CompileError::UnresolvedType {
            what: format!("expression in {}", scope.label()),
            span: expr.span,
        })
    }

    fn check_args(
        &self,
        scope: &Scope,
        context: &str,
        params: &[Type],
        args: &[Expr],
        span: Span,
    ) -> CompileResult<()> {
        if params.len() != args.len() {
            return Err(CompileError::mismatch(
                context,
                format!("{} arguments", params.len()),
                format!("{} arguments", args.len()),
                span,
            ));
        }
        for (index, (param, arg)) in params.iter().zip(args).enumerate() {
            let arg_ty = self.check_expr(scope, arg)?;
            self.expect_subtype(
                &arg_ty,
                param,
                format!("argument {} of {}", index + 1, context),
                arg.span,
            )?;
        }
        Ok(())
    }

    fn expect_subtype(
        &self,
        actual: &Type,
        expected: &Type,
        context: impl Into<String>,
        span: Span,
    ) -> CompileResult<()> {
        if self.symbols.is_subtype(actual, expected) {
            Ok(())
        } else {
            Err(CompileError::mismatch(context, expected, actual, span))
        }
    }
}

fn unknown_member(class: &Type, member: &str, kind: MemberKind, span: Span) -> CompileError {
    CompileError::UnknownMember {
        class: class.to_string(),
        member: member.to_string(),
        kind,
        span,
    }
}
