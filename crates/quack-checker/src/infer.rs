//! Fixed-point type inference
//!
//! Each pass walks every constructor and method body, attaches a type to
//! every expression and to every assignment target, and widens three
//! overlays by join:
//!
//! - local variable types, per method
//! - types of user fields, from the `this.f = e` stores in the constructor
//! - return types of methods without an annotation, from their `return`s
//!   plus `Nothing` when the body can fall off the end
//!
//! Passes repeat until nothing changes. Every slot only moves up a lattice
//! of finite height, so the loop terminates; a pass cap guards against a
//! slot that keeps flipping anyway.

use crate::env::VariableEnv;
use crate::flow::falls_through;
use quack_syntax::ast::*;
use quack_syntax::ty::{CONSTRUCTOR, THIS};
use quack_syntax::Type;
use quack_types::{ClassEntry, CompileError, CompileResult, SymbolTable};
use rustc_hash::FxHashMap;

/// `(class, member)` key of the inference overlays
pub type MemberKey = (String, String);

/// The method body being walked
#[derive(Debug, Clone)]
pub struct Scope {
    pub class: String,
    pub method: String,
    pub params: Vec<Param>,
    pub constructor: bool,
    pub declared_ret: Option<Type>,
}

impl Scope {
    pub fn constructor(class: &ClassDecl) -> Self {
        Scope {
            class: class.name.clone(),
            method: CONSTRUCTOR.to_string(),
            params: class.params.clone(),
            constructor: true,
            declared_ret: None,
        }
    }

    pub fn method(class: &str, method: &MethodDecl) -> Self {
        Scope {
            class: class.to_string(),
            method: method.name.clone(),
            params: method.params.clone(),
            constructor: false,
            declared_ret: method.return_type.clone(),
        }
    }

    pub fn key(&self) -> MemberKey {
        (self.class.clone(), self.method.clone())
    }

    pub fn param(&self, name: &str) -> Option<&Type> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.ty)
    }

    /// `Class:method` as it appears in diagnostics
    pub fn label(&self) -> String {
        format!("{}:{}", self.class, self.method)
    }
}

/// Whole-program type inferencer
pub struct TypeInferencer<'a> {
    symbols: &'a SymbolTable,
    envs: FxHashMap<MemberKey, VariableEnv>,
    field_types: FxHashMap<MemberKey, Type>,
    return_types: FxHashMap<MemberKey, Type>,
    changed: bool,
    /// Overrides the size-derived pass cap
    pass_limit: Option<usize>,
}

impl<'a> TypeInferencer<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        TypeInferencer {
            symbols,
            envs: FxHashMap::default(),
            field_types: FxHashMap::default(),
            return_types: FxHashMap::default(),
            changed: false,
            pass_limit: None,
        }
    }

    pub(crate) fn with_pass_limit(mut self, limit: usize) -> Self {
        self.pass_limit = Some(limit);
        self
    }

    /// Run passes until the fixed point. Returns the number of passes.
    pub fn infer_program(&mut self, program: &mut Program) -> CompileResult<usize> {
        let limit = self
            .pass_limit
            .unwrap_or_else(|| pass_limit(self.symbols, program));
        let mut passes = 0;
        loop {
            passes += 1;
            let changed = self.pass(program)?;
            log::trace!("inference pass {}: changed={}", passes, changed);
            if !changed {
                break;
            }
            if passes >= limit {
                return Err(CompileError::UnresolvedType {
                    what: format!("inference did not converge after {} passes", passes),
                    span: Default::default(),
                });
            }
        }
        log::debug!("type inference converged after {} passes", passes);
        Ok(passes)
    }

    /// One pass over the whole program. Returns true if any type moved.
    pub fn pass(&mut self, program: &mut Program) -> CompileResult<bool> {
        self.changed = false;
        for class in &mut program.classes {
            let scope = Scope::constructor(class);
            self.infer_block(&scope, &mut class.body)?;

            for method in &mut class.methods {
                let scope = Scope::method(&class.name, method);
                self.infer_block(&scope, &mut method.body)?;
                if scope.declared_ret.is_none() && falls_through(&method.body) {
                    self.changed |= widen(&mut self.return_types, scope.key(), &Type::nothing(), self.symbols);
                }
            }
        }
        Ok(self.changed)
    }

    /// Local environment of one method, once inference has seen it
    pub fn env(&self, class: &str, method: &str) -> Option<&VariableEnv> {
        self.envs.get(&(class.to_string(), method.to_string()))
    }

    /// Type of a name in scope: `this`, a parameter or a local
    pub fn var_type(&self, scope: &Scope, name: &str) -> Option<Type> {
        if name == THIS {
            return Some(Type::new(scope.class.clone()));
        }
        if let Some(ty) = scope.param(name) {
            return Some(ty.clone());
        }
        self.envs.get(&scope.key())?.get(name).cloned()
    }

    /// Result type of `method` called on a receiver of static type `class`
    pub fn method_return(&self, class: &str, method: &str) -> Option<Type> {
        let (owner, sig) = self.symbols.lookup_method(class, method)?;
        match &sig.ret {
            Some(ret) => Some(ret.clone()),
            None => self
                .return_types
                .get(&(owner.name.clone(), method.to_string()))
                .cloned(),
        }
    }

    /// Type of `field` read through a receiver of static type `class`
    pub fn field_type(&self, class: &str, field: &str) -> Option<Type> {
        let (owner, declared) = self.symbols.lookup_field(class, field)?;
        match declared {
            Some(ty) => Some(ty.clone()),
            None => self
                .field_types
                .get(&(owner.name.clone(), field.to_string()))
                .cloned(),
        }
    }

    fn infer_block(&mut self, scope: &Scope, block: &mut [Stmt]) -> CompileResult<()> {
        for stmt in block {
            self.infer_stmt(scope, stmt)?;
        }
        Ok(())
    }

    fn infer_stmt(&mut self, scope: &Scope, stmt: &mut Stmt) -> CompileResult<()> {
        match &mut stmt.kind {
            StmtKind::Expr(expr) => {
                self.infer_expr(scope, expr)?;
            }
            StmtKind::Assign {
                target,
                declared,
                value,
                target_ty,
            } => {
                let value_ty = self.infer_expr(scope, value)?;
                if target.as_str() == THIS {
                    return Err(CompileError::structural("assignment to 'this'", stmt.span));
                }

                let resolved = if let Some(param) = scope.param(target) {
                    Some(param.clone())
                } else {
                    let env = self.envs.entry(scope.key()).or_default();
                    let moved = match (declared.as_ref(), value_ty.as_ref()) {
                        (Some(declared), _) => env.declare(target, declared),
                        (None, Some(value_ty)) => env.record(target, value_ty, self.symbols),
                        (None, None) => false,
                    };
                    self.changed |= moved;
                    env.get(target).cloned()
                };
                self.update(target_ty, resolved);
            }
            StmtKind::StoreField {
                object,
                field,
                value,
            } => {
                let value_ty = self.infer_expr(scope, value)?;
                self.infer_expr(scope, object)?;
                if scope.constructor && object.is_this() && self.is_untyped_field(&scope.class, field) {
                    if let Some(value_ty) = value_ty {
                        let key = (scope.class.clone(), field.clone());
                        self.changed |= widen(&mut self.field_types, key, &value_ty, self.symbols);
                    }
                }
            }
            StmtKind::Return(value) => {
                let value_ty = match value {
                    Some(value) => self.infer_expr(scope, value)?,
                    None => Some(Type::nothing()),
                };
                if !scope.constructor && scope.declared_ret.is_none() {
                    if let Some(value_ty) = value_ty {
                        self.changed |= widen(&mut self.return_types, scope.key(), &value_ty, self.symbols);
                    }
                }
            }
            StmtKind::If {
                cond,
                then_block,
                elifs,
                else_block,
            } => {
                self.infer_expr(scope, cond)?;
                self.infer_block(scope, then_block)?;
                for elif in elifs {
                    self.infer_expr(scope, &mut elif.cond)?;
                    self.infer_block(scope, &mut elif.block)?;
                }
                if let Some(block) = else_block {
                    self.infer_block(scope, block)?;
                }
            }
            StmtKind::While { cond, body } => {
                self.infer_expr(scope, cond)?;
                self.infer_block(scope, body)?;
            }
            StmtKind::CompoundAssign { .. } => {
                return Err(CompileError::structural(
                    "compound assignment survived desugaring",
                    stmt.span,
                ));
            }
        }
        Ok(())
    }

    fn infer_expr(&mut self, scope: &Scope, expr: &mut Expr) -> CompileResult<Option<Type>> {
        let ty = match &mut expr.kind {
            ExprKind::Int(_) => Some(Type::int()),
            ExprKind::Str(_) => Some(Type::string()),
            ExprKind::Bool(_) => Some(Type::bool()),
            ExprKind::Nothing => Some(Type::nothing()),
            ExprKind::Var(name) => self.var_type(scope, name),
            ExprKind::And(left, right) | ExprKind::Or(left, right) => {
                self.infer_expr(scope, left)?;
                self.infer_expr(scope, right)?;
                Some(Type::bool())
            }
            ExprKind::Call {
                receiver,
                method,
                args,
            } => {
                let receiver_ty = self.infer_expr(scope, receiver)?;
                for arg in args.iter_mut() {
                    self.infer_expr(scope, arg)?;
                }
                // Missing members are reported once the fixed point is reached
                receiver_ty.and_then(|ty| self.method_return(ty.name(), method))
            }
            ExprKind::New { class, args } => {
                for arg in args.iter_mut() {
                    self.infer_expr(scope, arg)?;
                }
                self.symbols.get(class).map(ClassEntry::ty)
            }
            ExprKind::LoadField { object, field } => {
                let object_ty = self.infer_expr(scope, object)?;
                object_ty.and_then(|ty| self.field_type(ty.name(), field))
            }
            ExprKind::Binary { .. } | ExprKind::Unary { .. } => {
                return Err(CompileError::structural("operator survived desugaring", expr.span));
            }
        };
        self.update(&mut expr.ty, ty.clone());
        Ok(ty)
    }

    fn is_untyped_field(&self, class: &str, field: &str) -> bool {
        self.symbols
            .get(class)
            .and_then(|entry| entry.fields.get(field))
            .is_some_and(Option::is_none)
    }

    fn update(&mut self, slot: &mut Option<Type>, ty: Option<Type>) {
        if *slot != ty {
            *slot = ty;
            self.changed = true;
        }
    }
}

fn widen(map: &mut FxHashMap<MemberKey, Type>, key: MemberKey, ty: &Type, symbols: &SymbolTable) -> bool {
    let Some(joined) = symbols.join_opt(map.get(&key), Some(ty)) else {
        return false;
    };
    if map.get(&key) == Some(&joined) {
        return false;
    }
    map.insert(key, joined);
    true
}

/// Upper bound on passes: every slot can widen at most once per level of
/// the class hierarchy.
fn pass_limit(symbols: &SymbolTable, program: &Program) -> usize {
    let mut counter = NodeCounter::default();
    counter.visit_program(program);

    let slots: usize = program
        .classes
        .iter()
        .map(|class| {
            let methods: usize = class
                .methods
                .iter()
                .map(|m| assigned_locals(&m.body).len() + usize::from(m.return_type.is_none()))
                .sum();
            class.field_names().len() + assigned_locals(&class.body).len() + methods
        })
        .sum();

    (counter.count + slots + 1) * (symbols.depth() + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Binder;
    use quack_types::BuiltinTable;

    fn infer(mut program: Program) -> (Program, CompileResult<usize>) {
        let builtins = BuiltinTable::standard().unwrap();
        let symbols = Binder::new(&builtins).bind_program(&program).unwrap();
        let result = TypeInferencer::new(&symbols).infer_program(&mut program);
        (program, result)
    }

    fn return_value(program: &Program, class: &str, method: &str, index: usize) -> Option<Type> {
        match &program.class(class).unwrap().method(method).unwrap().body[index].kind {
            StmtKind::Return(Some(expr)) => expr.ty.clone(),
            other => panic!("expected return, got {:?}", other),
        }
    }

    #[test]
    fn test_literals_and_calls() {
        let class = ClassDecl::new("C", None).with_method(MethodDecl::new(
            "m",
            vec![],
            None,
            vec![Stmt::ret(Some(Expr::call(Expr::int(1), "less", vec![Expr::int(2)])))],
        ));
        let (program, result) = infer(Program::new(vec![class], vec![]));
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(return_value(&program, "C", "m", 0), Some(Type::bool()));
    }

    #[test]
    fn test_local_widens_to_join() {
        // x = A(); if c { x = B(); }  with B <: A  → x: A
        let a = ClassDecl::new("A", None);
        let b = ClassDecl::new("B", Some("A"));
        let c = ClassDecl::new("D", Some("A"));
        let main = ClassDecl::new("M", None).with_method(MethodDecl::new(
            "m",
            vec![Param::new("c", "Bool")],
            None,
            vec![
                Stmt::assign("x", None, Expr::new_object("B", vec![])),
                Stmt::if_(
                    Expr::var("c"),
                    vec![Stmt::assign("x", None, Expr::new_object("D", vec![]))],
                    vec![],
                    None,
                ),
                Stmt::ret(Some(Expr::var("x"))),
            ],
        ));
        let (program, result) = infer(Program::new(vec![a, b, c, main], vec![]));
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(return_value(&program, "M", "m", 2), Some(Type::new("A")));
    }

    #[test]
    fn test_loop_carried_variable() {
        // x = B(); while c { y = x; x = D(); }  → y sees the join on the second pass
        let a = ClassDecl::new("A", None);
        let b = ClassDecl::new("B", Some("A"));
        let d = ClassDecl::new("D", Some("A"));
        let main = ClassDecl::new("M", None).with_method(MethodDecl::new(
            "m",
            vec![Param::new("c", "Bool")],
            None,
            vec![
                Stmt::assign("x", None, Expr::new_object("B", vec![])),
                Stmt::while_(
                    Expr::var("c"),
                    vec![
                        Stmt::assign("y", None, Expr::var("x")),
                        Stmt::assign("x", None, Expr::new_object("D", vec![])),
                    ],
                ),
                Stmt::ret(Some(Expr::var("x"))),
            ],
        ));
        let (program, result) = infer(Program::new(vec![a, b, d, main], vec![]));
        let passes = result.unwrap();
        assert!(passes >= 2);
        let body = &program.class("M").unwrap().method("m").unwrap().body;
        let StmtKind::While { body, .. } = &body[1].kind else {
            panic!("expected while");
        };
        let StmtKind::Assign { target_ty, .. } = &body[0].kind else {
            panic!("expected assign");
        };
        assert_eq!(target_ty, &Some(Type::new("A")));
    }

    #[test]
    fn test_field_type_from_constructor_store() {
        let pt = ClassDecl::new("Pt", None)
            .with_params(vec![Param::new("x", "Int")])
            .with_body(vec![Stmt::store_field(Expr::this(), "x", Expr::var("x"))])
            .with_method(MethodDecl::new(
                "get",
                vec![],
                None,
                vec![Stmt::ret(Some(Expr::load_field(Expr::this(), "x")))],
            ));
        let (program, result) = infer(Program::new(vec![pt], vec![]));
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(return_value(&program, "Pt", "get", 0), Some(Type::int()));
    }

    #[test]
    fn test_inferred_return_type_flows_to_callers() {
        // Callers appear before the callee, so the return type arrives late
        let c = ClassDecl::new("C", None)
            .with_method(MethodDecl::new(
                "caller",
                vec![],
                None,
                vec![Stmt::ret(Some(Expr::call(Expr::this(), "callee", vec![])))],
            ))
            .with_method(MethodDecl::new(
                "callee",
                vec![],
                None,
                vec![Stmt::ret(Some(Expr::string("hi")))],
            ));
        let (program, result) = infer(Program::new(vec![c], vec![]));
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(return_value(&program, "C", "caller", 0), Some(Type::string()));
    }

    #[test]
    fn test_rerun_after_convergence_is_stable() {
        let c = ClassDecl::new("C", None).with_method(MethodDecl::new(
            "m",
            vec![],
            None,
            vec![
                Stmt::assign("x", None, Expr::int(1)),
                Stmt::ret(Some(Expr::call(Expr::var("x"), "plus", vec![Expr::int(2)]))),
            ],
        ));
        let mut program = Program::new(vec![c], vec![]);
        let builtins = BuiltinTable::standard().unwrap();
        let symbols = Binder::new(&builtins).bind_program(&program).unwrap();
        let mut inferencer = TypeInferencer::new(&symbols);
        inferencer.infer_program(&mut program).unwrap();

        let snapshot = program.clone();
        assert!(!inferencer.pass(&mut program).unwrap());
        assert_eq!(program, snapshot);
        assert_eq!(
            inferencer.env("C", "m").and_then(|env| env.get("x")),
            Some(&Type::int())
        );
    }

    #[test]
    fn test_annotation_is_authoritative() {
        let c = ClassDecl::new("C", None).with_method(MethodDecl::new(
            "m",
            vec![],
            None,
            vec![
                Stmt::assign("x", Some("Obj"), Expr::int(1)),
                Stmt::ret(Some(Expr::var("x"))),
            ],
        ));
        let (program, result) = infer(Program::new(vec![c], vec![]));
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(return_value(&program, "C", "m", 1), Some(Type::obj()));
    }

    #[test]
    fn test_method_without_return_yields_nothing() {
        let c = ClassDecl::new("C", None)
            .with_method(MethodDecl::new("empty", vec![], None, vec![]))
            .with_method(MethodDecl::new(
                "caller",
                vec![],
                None,
                vec![Stmt::ret(Some(Expr::call(Expr::this(), "empty", vec![])))],
            ));
        let (program, result) = infer(Program::new(vec![c], vec![]));
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(return_value(&program, "C", "caller", 0), Some(Type::nothing()));
    }

    #[test]
    fn test_fall_through_joins_nothing() {
        // def m(c: Bool) { if c { return 1; } }  → Int ⊔ Nothing = Obj
        let c = ClassDecl::new("C", None)
            .with_method(MethodDecl::new(
                "m",
                vec![Param::new("c", "Bool")],
                None,
                vec![Stmt::if_(Expr::var("c"), vec![Stmt::ret(Some(Expr::int(1)))], vec![], None)],
            ))
            .with_method(MethodDecl::new(
                "caller",
                vec![],
                None,
                vec![Stmt::ret(Some(Expr::call(Expr::this(), "m", vec![Expr::bool(false)])))],
            ));
        let (program, result) = infer(Program::new(vec![c], vec![]));
        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(return_value(&program, "C", "caller", 0), Some(Type::obj()));
    }

    #[test]
    fn test_pass_cap_reports_unresolved() {
        let c = ClassDecl::new("C", None).with_method(MethodDecl::new(
            "m",
            vec![],
            None,
            vec![Stmt::ret(Some(Expr::int(1)))],
        ));
        let mut program = Program::new(vec![c], vec![]);
        let builtins = BuiltinTable::standard().unwrap();
        let symbols = Binder::new(&builtins).bind_program(&program).unwrap();
        let err = TypeInferencer::new(&symbols)
            .with_pass_limit(1)
            .infer_program(&mut program)
            .unwrap_err();
        assert!(
            matches!(&err, CompileError::UnresolvedType { what, .. } if what.contains("did not converge")),
            "{:?}",
            err
        );
    }
}
