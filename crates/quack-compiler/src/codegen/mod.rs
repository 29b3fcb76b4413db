//! Code Generation
//!
//! Lowers the typed, desugared tree into stack machine instructions, one
//! [`CompiledClass`] per class. Calls and field accesses are resolved against
//! the static type inference attached to the receiver.

mod control;

pub use control::LabelAllocator;

use crate::instr::{Constant, Instr, SELF_SLOT};
use crate::module_builder::{CompiledClass, CompiledMethod, MethodBuilder};
use quack_syntax::ast::*;
use quack_syntax::ty::{CONSTRUCTOR, THIS};
use quack_types::{CompileError, CompileResult};

/// Code generator for a whole program
pub struct CodeGenerator {
    labels: LabelAllocator,
    /// Whether the body being compiled is a constructor
    constructor: bool,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            labels: LabelAllocator::new(),
            constructor: false,
        }
    }

    /// Compile every class of an analyzed program, in declaration order
    pub fn compile_program(&mut self, program: &Program) -> CompileResult<Vec<CompiledClass>> {
        let classes = program
            .classes
            .iter()
            .map(|class| self.compile_class(class))
            .collect::<CompileResult<Vec<_>>>()?;
        log::debug!(
            "generated {} classes ({} labels)",
            classes.len(),
            self.labels.allocated()
        );
        Ok(classes)
    }

    fn compile_class(&mut self, class: &ClassDecl) -> CompileResult<CompiledClass> {
        let mut methods = Vec::with_capacity(class.methods.len() + 1);

        self.constructor = true;
        methods.push(self.compile_body(CONSTRUCTOR, &class.params, &class.body)?);

        self.constructor = false;
        for method in &class.methods {
            methods.push(self.compile_body(&method.name, &method.params, &method.body)?);
        }

        Ok(CompiledClass {
            name: class.name.clone(),
            superclass: class.superclass_name().to_string(),
            fields: class.field_names(),
            methods,
        })
    }

    fn compile_body(&mut self, name: &str, params: &[Param], body: &[Stmt]) -> CompileResult<CompiledMethod> {
        let params: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
        let locals = assigned_locals(body)
            .into_iter()
            .filter(|local| !params.contains(local))
            .collect();

        let mut builder = MethodBuilder::new(name.to_string(), params, locals);
        self.compile_block(&mut builder, body)?;
        if !builder.ends_in_return() {
            self.emit_bare_return(&mut builder);
        }
        Ok(builder.build())
    }

    fn compile_block(&mut self, builder: &mut MethodBuilder, block: &[Stmt]) -> CompileResult<()> {
        for stmt in block {
            self.compile_stmt(builder, stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, builder: &mut MethodBuilder, stmt: &Stmt) -> CompileResult<()> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.compile_expr(builder, expr)?;
                builder.emit(Instr::Pop);
            }
            StmtKind::Assign { target, value, .. } => {
                self.compile_expr(builder, value)?;
                builder.emit(Instr::Store(target.clone()));
            }
            StmtKind::StoreField {
                object,
                field,
                value,
            } => {
                self.compile_expr(builder, value)?;
                self.compile_expr(builder, object)?;
                builder.emit(Instr::StoreField {
                    class: static_type(object)?,
                    field: field.clone(),
                });
            }
            StmtKind::Return(Some(value)) => {
                self.compile_expr(builder, value)?;
                builder.emit(Instr::Return(builder.param_count()));
            }
            StmtKind::Return(None) => self.emit_bare_return(builder),
            StmtKind::If {
                cond,
                then_block,
                elifs,
                else_block,
            } => self.compile_if(builder, cond, then_block, elifs, else_block.as_deref())?,
            StmtKind::While { cond, body } => self.compile_while(builder, cond, body)?,
            StmtKind::CompoundAssign { .. } => {
                return Err(CompileError::structural(
                    "compound assignment survived desugaring",
                    stmt.span,
                ));
            }
        }
        Ok(())
    }

    /// Every arm jumps to the next untested condition when its own is false
    /// and to the shared join label after running. Arm labels are allocated
    /// up front so earlier arms can name later ones.
    fn compile_if(
        &mut self,
        builder: &mut MethodBuilder,
        cond: &Expr,
        then_block: &[Stmt],
        elifs: &[ElifBranch],
        else_block: Option<&[Stmt]>,
    ) -> CompileResult<()> {
        let join = self.labels.fresh("join");
        let mut arms: Vec<String> = elifs.iter().map(|_| self.labels.fresh("elif")).collect();
        if else_block.is_some() {
            arms.push(self.labels.fresh("else"));
        }

        self.compile_expr(builder, cond)?;
        builder.emit(Instr::JumpIfNot(arms.first().unwrap_or(&join).clone()));
        self.compile_block(builder, then_block)?;
        if !arms.is_empty() {
            builder.emit(Instr::Jump(join.clone()));
        }

        for (index, elif) in elifs.iter().enumerate() {
            let next = arms.get(index + 1).unwrap_or(&join);
            builder.emit_label(&arms[index]);
            self.compile_expr(builder, &elif.cond)?;
            builder.emit(Instr::JumpIfNot(next.clone()));
            self.compile_block(builder, &elif.block)?;
            if *next != join {
                builder.emit(Instr::Jump(join.clone()));
            }
        }

        if let (Some(block), Some(label)) = (else_block, arms.last()) {
            builder.emit_label(label);
            self.compile_block(builder, block)?;
        }

        builder.emit_label(&join);
        Ok(())
    }

    /// Test at the bottom: jump to the condition, run the body while it holds
    fn compile_while(&mut self, builder: &mut MethodBuilder, cond: &Expr, body: &[Stmt]) -> CompileResult<()> {
        let block = self.labels.fresh("while_block");
        let check = self.labels.fresh("while_cond");

        builder.emit(Instr::Jump(check.clone()));
        builder.emit_label(&block);
        self.compile_block(builder, body)?;
        builder.emit_label(&check);
        self.compile_expr(builder, cond)?;
        builder.emit(Instr::JumpIf(block));
        Ok(())
    }

    fn compile_expr(&mut self, builder: &mut MethodBuilder, expr: &Expr) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::Int(value) => builder.emit_const(Constant::Int(*value)),
            ExprKind::Str(value) => builder.emit_const(Constant::Str(value.clone())),
            ExprKind::Bool(value) => builder.emit_const(Constant::Bool(*value)),
            ExprKind::Nothing => builder.emit_const(Constant::Nothing),
            ExprKind::Var(name) => {
                let slot = if name == THIS { SELF_SLOT } else { name.as_str() };
                builder.emit(Instr::Load(slot.to_string()));
            }
            ExprKind::And(left, right) => self.compile_short_circuit(builder, left, right, "and", false)?,
            ExprKind::Or(left, right) => self.compile_short_circuit(builder, left, right, "or", true)?,
            ExprKind::Call {
                receiver,
                method,
                args,
            } => {
                self.compile_expr(builder, receiver)?;
                for arg in args {
                    self.compile_expr(builder, arg)?;
                }
                // The call pops the receiver first
                if !args.is_empty() {
                    builder.emit(Instr::Roll(args.len()));
                }
                builder.emit(Instr::Call {
                    class: static_type(receiver)?,
                    method: method.clone(),
                });
            }
            ExprKind::New { class, args } => {
                for arg in args {
                    self.compile_expr(builder, arg)?;
                }
                builder.emit(Instr::New(class.clone()));
                builder.emit(Instr::Call {
                    class: class.clone(),
                    method: CONSTRUCTOR.to_string(),
                });
            }
            ExprKind::LoadField { object, field } => {
                self.compile_expr(builder, object)?;
                builder.emit(Instr::LoadField {
                    class: static_type(object)?,
                    field: field.clone(),
                });
            }
            ExprKind::Binary { .. } | ExprKind::Unary { .. } => {
                return Err(CompileError::structural("operator survived desugaring", expr.span));
            }
        }
        Ok(())
    }

    /// `and` skips its right operand once the left is false, `or` once it is
    /// true. Both paths push the result as a constant before the join label.
    fn compile_short_circuit(
        &mut self,
        builder: &mut MethodBuilder,
        left: &Expr,
        right: &Expr,
        prefix: &'static str,
        short_value: bool,
    ) -> CompileResult<()> {
        self.compile_expr(builder, left)?;
        let short = self.labels.fresh(prefix);
        let join = self.labels.fresh(prefix);
        let branch = |label: &String| {
            if short_value {
                Instr::JumpIf(label.clone())
            } else {
                Instr::JumpIfNot(label.clone())
            }
        };

        builder.emit(branch(&short));
        self.compile_expr(builder, right)?;
        builder.emit(branch(&short));
        builder.emit_const(Constant::Bool(!short_value));
        builder.emit(Instr::Jump(join.clone()));
        builder.emit_label(&short);
        builder.emit_const(Constant::Bool(short_value));
        builder.emit_label(&join);
        Ok(())
    }

    /// `return;` and the implicit epilogue: the new object from a
    /// constructor, `nothing` from a method
    fn emit_bare_return(&self, builder: &mut MethodBuilder) {
        if self.constructor {
            builder.emit(Instr::Load(SELF_SLOT.to_string()));
        } else {
            builder.emit_const(Constant::Nothing);
        }
        builder.emit(Instr::Return(builder.param_count()));
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn static_type(expr: &Expr) -> CompileResult<String> {
    expr.ty
        .as_ref()
        .map(ToString::to_string)
        .ok_or_else(|| CompileError::UnresolvedType {
            what: "static type of receiver".to_string(),
            span: expr.span,
        })
}
