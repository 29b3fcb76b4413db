//! Class loading - builds the symbol table from the AST
//!
//! Two phases, so declaration order never matters:
//! 1. collect every class declaration (signatures only, declared types only)
//! 2. link: every superclass must exist and every chain must reach the root,
//!    signature types must name known classes, overrides must keep arity

use quack_syntax::ast::*;
use quack_syntax::ty::{CONSTRUCTOR, OBJ};
use quack_syntax::{Span, Type};
use quack_types::{BuiltinTable, ClassEntry, CompileError, CompileResult, MethodSignature, SymbolTable};
use rustc_hash::FxHashSet;

/// Binder - builds the whole-program class table
pub struct Binder<'a> {
    builtins: &'a BuiltinTable,
}

impl<'a> Binder<'a> {
    /// Create a new binder seeded with the builtin descriptor table
    pub fn new(builtins: &'a BuiltinTable) -> Self {
        Binder { builtins }
    }

    /// Bind a desugared program (entry point)
    pub fn bind_program(self, program: &Program) -> CompileResult<SymbolTable> {
        if !program.main.is_empty() {
            return Err(CompileError::structural(
                "top-level statements must be wrapped before class loading",
                program.main[0].span,
            ));
        }

        let mut symbols = SymbolTable::from_builtins(self.builtins);
        for class in &program.classes {
            symbols.define(self.collect_class(class)?)?;
        }
        for class in &program.classes {
            self.link_class(&symbols, class)?;
        }

        log::debug!(
            "class loader: {} classes ({} builtin)",
            symbols.len(),
            self.builtins.len()
        );
        Ok(symbols)
    }

    /// Phase 1: signatures, fields and superclass name of one class
    fn collect_class(&self, class: &ClassDecl) -> CompileResult<ClassEntry> {
        let mut entry = ClassEntry::new(class.name.clone(), Some(class.superclass_name()));
        entry.span = class.span;

        for field in class.field_names() {
            entry.fields.insert(field, None);
        }

        entry.methods.insert(
            CONSTRUCTOR.to_string(),
            MethodSignature::new(param_types(&class.params), Some(Type::new(class.name.clone()))),
        );

        for method in &class.methods {
            if entry.methods.contains_key(&method.name) {
                return Err(CompileError::structural(
                    format!("method '{}' declared twice in class '{}'", method.name, class.name),
                    method.span,
                ));
            }
            entry.methods.insert(
                method.name.clone(),
                MethodSignature::new(param_types(&method.params), method.return_type.clone()),
            );
        }

        Ok(entry)
    }

    /// Phase 2: validate one class against the complete table
    fn link_class(&self, symbols: &SymbolTable, class: &ClassDecl) -> CompileResult<()> {
        let superclass = class.superclass_name();
        if !symbols.contains(superclass) {
            return Err(CompileError::UnknownSuperclass {
                class: class.name.clone(),
                superclass: superclass.to_string(),
                span: class.span,
            });
        }
        check_acyclic(symbols, class)?;

        for param in &class.params {
            require_type(symbols, &param.ty, class.span)?;
        }

        for method in &class.methods {
            for param in &method.params {
                require_type(symbols, &param.ty, method.span)?;
            }
            if let Some(ret) = &method.return_type {
                require_type(symbols, ret, method.span)?;
            }

            if let Some((owner, inherited)) = symbols.lookup_method(superclass, &method.name) {
                if inherited.params.len() != method.params.len() {
                    return Err(CompileError::mismatch(
                        format!("override of {}:{}", owner.name, method.name),
                        format!("{} parameters", inherited.params.len()),
                        format!("{} parameters", method.params.len()),
                        method.span,
                    ));
                }
            }
        }
        Ok(())
    }
}

fn param_types(params: &[Param]) -> Vec<Type> {
    params.iter().map(|p| p.ty.clone()).collect()
}

fn require_type(symbols: &SymbolTable, ty: &Type, span: Span) -> CompileResult<()> {
    if symbols.contains(ty.name()) {
        Ok(())
    } else {
        Err(CompileError::UnresolvedType {
            what: format!("unknown type '{}'", ty),
            span,
        })
    }
}

/// Follow superclass names from `class` until the root; revisiting a class
/// means the chain never terminates.
fn check_acyclic(symbols: &SymbolTable, class: &ClassDecl) -> CompileResult<()> {
    let mut seen = FxHashSet::default();
    let mut current = class.name.as_str();
    while let Some(entry) = symbols.get(current) {
        if !seen.insert(entry.name.as_str()) {
            return Err(CompileError::UnknownSuperclass {
                class: class.name.clone(),
                superclass: format!("{} (inheritance cycle)", entry.name),
                span: class.span,
            });
        }
        match entry.superclass.as_deref() {
            Some(parent) => current = parent,
            None => {
                debug_assert_eq!(entry.name, OBJ);
                return Ok(());
            }
        }
    }
    Err(CompileError::UnknownSuperclass {
        class: class.name.clone(),
        superclass: current.to_string(),
        span: class.span,
    })
}
