//! Definite assignment
//!
//! Every local must be assigned on every path before it is read. Parameters
//! and `this` count as assigned on entry. At a branch join the assigned set
//! is the intersection of the arm sets; a missing `else` contributes the
//! incoming set. A `while` body may run zero times, so assignments inside it
//! never escape the loop. A path that ended in `return` is dead and takes no
//! part in the intersection.

use quack_syntax::ast::*;
use quack_syntax::ty::{CONSTRUCTOR, THIS};
use quack_types::{CompileError, CompileResult};
use rustc_hash::FxHashSet;

/// Names definitely assigned at one program point
#[derive(Debug, Clone, PartialEq)]
struct Assigned {
    vars: FxHashSet<String>,
    /// Control cannot reach this point
    dead: bool,
}

impl Assigned {
    fn entry(params: &[Param]) -> Self {
        let mut vars: FxHashSet<String> = params.iter().map(|p| p.name.clone()).collect();
        vars.insert(THIS.to_string());
        Assigned { vars, dead: false }
    }

    fn dead() -> Self {
        Assigned {
            vars: FxHashSet::default(),
            dead: true,
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.dead || self.vars.contains(name)
    }

    fn insert(&mut self, name: &str) {
        if !self.dead {
            self.vars.insert(name.to_string());
        }
    }

    /// Merge two paths meeting at a join point
    fn meet(self, other: Assigned) -> Assigned {
        match (self.dead, other.dead) {
            (true, _) => other,
            (_, true) => self,
            _ => Assigned {
                vars: self.vars.intersection(&other.vars).cloned().collect(),
                dead: false,
            },
        }
    }
}

/// Per-method definite assignment checker
#[derive(Debug, Default)]
pub struct VarChecker {
    /// `Class:method` currently being checked
    method: String,
}

impl VarChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every constructor and method of a desugared program
    pub fn check_program(&mut self, program: &Program) -> CompileResult<()> {
        for class in &program.classes {
            self.method = format!("{}:{}", class.name, CONSTRUCTOR);
            self.check_block(&class.body, Assigned::entry(&class.params))?;

            for method in &class.methods {
                self.method = format!("{}:{}", class.name, method.name);
                self.check_block(&method.body, Assigned::entry(&method.params))?;
            }
        }
        log::debug!("definite assignment: {} classes ok", program.classes.len());
        Ok(())
    }

    fn check_block(&self, block: &[Stmt], mut state: Assigned) -> CompileResult<Assigned> {
        for stmt in block {
            state = self.check_stmt(stmt, state)?;
        }
        Ok(state)
    }

    fn check_stmt(&self, stmt: &Stmt, mut state: Assigned) -> CompileResult<Assigned> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.check_expr(expr, &state)?;
                Ok(state)
            }
            StmtKind::Assign { target, value, .. } => {
                self.check_expr(value, &state)?;
                state.insert(target);
                Ok(state)
            }
            StmtKind::StoreField { object, value, .. } => {
                self.check_expr(value, &state)?;
                self.check_expr(object, &state)?;
                Ok(state)
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(value, &state)?;
                }
                Ok(Assigned::dead())
            }
            StmtKind::If {
                cond,
                then_block,
                elifs,
                else_block,
            } => {
                self.check_expr(cond, &state)?;
                let mut out = self.check_block(then_block, state.clone())?;
                for elif in elifs {
                    self.check_expr(&elif.cond, &state)?;
                    out = out.meet(self.check_block(&elif.block, state.clone())?);
                }
                let otherwise = match else_block {
                    Some(block) => self.check_block(block, state)?,
                    None => state,
                };
                Ok(out.meet(otherwise))
            }
            StmtKind::While { cond, body } => {
                self.check_expr(cond, &state)?;
                self.check_block(body, state.clone())?;
                Ok(state)
            }
            StmtKind::CompoundAssign { .. } => Err(CompileError::structural(
                "compound assignment survived desugaring",
                stmt.span,
            )),
        }
    }

    fn check_expr(&self, expr: &Expr, state: &Assigned) -> CompileResult<()> {
        match &expr.kind {
            ExprKind::Int(_) | ExprKind::Str(_) | ExprKind::Bool(_) | ExprKind::Nothing => Ok(()),
            ExprKind::Var(name) => {
                if state.contains(name) {
                    Ok(())
                } else {
                    Err(CompileError::UseBeforeAssignment {
                        name: name.clone(),
                        method: self.method.clone(),
                        span: expr.span,
                    })
                }
            }
            ExprKind::And(left, right) | ExprKind::Or(left, right) => {
                self.check_expr(left, state)?;
                self.check_expr(right, state)
            }
            ExprKind::Call { receiver, args, .. } => {
                self.check_expr(receiver, state)?;
                args.iter().try_for_each(|arg| self.check_expr(arg, state))
            }
            ExprKind::New { args, .. } => args.iter().try_for_each(|arg| self.check_expr(arg, state)),
            ExprKind::LoadField { object, .. } => self.check_expr(object, state),
            ExprKind::Binary { .. } | ExprKind::Unary { .. } => Err(CompileError::structural(
                "operator survived desugaring",
                expr.span,
            )),
        }
    }
}

/// True if control can run off the end of `block` without a `return`.
///
/// Uses the same reachability as definite assignment: a `return` kills the
/// path, an `if` kills it only when every arm (including an `else`) does, and
/// a `while` never does since its body may not run.
pub fn falls_through(block: &[Stmt]) -> bool {
    !block.iter().any(always_returns)
}

fn always_returns(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::If {
            then_block,
            elifs,
            else_block: Some(else_block),
            ..
        } => {
            !falls_through(then_block)
                && elifs.iter().all(|elif| !falls_through(&elif.block))
                && !falls_through(else_block)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_method(params: Vec<Param>, body: Vec<Stmt>) -> CompileResult<()> {
        let class = ClassDecl::new("C", None).with_method(MethodDecl::new("m", params, None, body));
        VarChecker::new().check_program(&Program::new(vec![class], vec![]))
    }

    fn print(name: &str) -> Stmt {
        Stmt::expr(Expr::call(Expr::var(name), "print", vec![]))
    }

    fn cond() -> Expr {
        Expr::var("c")
    }

    fn bool_param() -> Vec<Param> {
        vec![Param::new("c", "Bool")]
    }

    #[test]
    fn test_params_and_this_assigned_on_entry() {
        let result = check_method(bool_param(), vec![print("c"), print("this")]);
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_read_before_write() {
        let err = check_method(vec![], vec![print("x"), Stmt::assign("x", None, Expr::int(1))])
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::UseBeforeAssignment { ref name, ref method, .. }
                if name == "x" && method == "C:m"
        ));
    }

    #[test]
    fn test_assigned_on_both_branches() {
        let result = check_method(
            bool_param(),
            vec![
                Stmt::if_(
                    cond(),
                    vec![Stmt::assign("x", None, Expr::int(1))],
                    vec![],
                    Some(vec![Stmt::assign("x", None, Expr::int(2))]),
                ),
                print("x"),
            ],
        );
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_assigned_on_one_branch_only() {
        let err = check_method(
            bool_param(),
            vec![
                Stmt::if_(cond(), vec![Stmt::assign("x", None, Expr::int(1))], vec![], None),
                print("x"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UseBeforeAssignment { .. }));
    }

    #[test]
    fn test_elif_arm_missing_assignment() {
        let err = check_method(
            bool_param(),
            vec![
                Stmt::if_(
                    cond(),
                    vec![Stmt::assign("x", None, Expr::int(1))],
                    vec![(cond(), vec![])],
                    Some(vec![Stmt::assign("x", None, Expr::int(2))]),
                ),
                print("x"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UseBeforeAssignment { .. }));
    }

    #[test]
    fn test_while_body_does_not_escape() {
        let err = check_method(
            bool_param(),
            vec![
                Stmt::while_(cond(), vec![Stmt::assign("x", None, Expr::int(1))]),
                print("x"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UseBeforeAssignment { ref name, .. } if name == "x"));
    }

    #[test]
    fn test_assignment_visible_inside_while_body() {
        let result = check_method(
            bool_param(),
            vec![Stmt::while_(
                cond(),
                vec![Stmt::assign("x", None, Expr::int(1)), print("x")],
            )],
        );
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_returning_branch_is_dead() {
        let result = check_method(
            bool_param(),
            vec![
                Stmt::if_(
                    cond(),
                    vec![Stmt::ret(Some(Expr::int(0)))],
                    vec![],
                    Some(vec![Stmt::assign("x", None, Expr::int(2))]),
                ),
                print("x"),
            ],
        );
        assert!(result.is_ok(), "{:?}", result);
    }

    #[test]
    fn test_constructor_checked_with_class_params() {
        let class = ClassDecl::new("P", None)
            .with_params(vec![Param::new("v", "Int")])
            .with_body(vec![
                Stmt::store_field(Expr::this(), "v", Expr::var("v")),
                Stmt::store_field(Expr::this(), "w", Expr::var("w")),
            ]);
        let err = VarChecker::new()
            .check_program(&Program::new(vec![class], vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::UseBeforeAssignment { ref name, ref method, .. }
                if name == "w" && method == "P:$constructor"
        ));
    }

    #[test]
    fn test_leftover_operator_is_structural() {
        let err = check_method(
            vec![],
            vec![Stmt::expr(Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2)))],
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::StructuralInvariantViolation { .. }));
    }

    #[test]
    fn test_falls_through() {
        let ret = || Stmt::ret(Some(Expr::int(1)));
        assert!(falls_through(&[]));
        assert!(falls_through(&[print("c")]));
        assert!(!falls_through(&[print("c"), ret()]));
        assert!(falls_through(&[Stmt::if_(cond(), vec![ret()], vec![], None)]));
        assert!(falls_through(&[Stmt::while_(cond(), vec![ret()])]));
        assert!(!falls_through(&[Stmt::if_(
            cond(),
            vec![ret()],
            vec![],
            Some(vec![Stmt::ret(None)])
        )]));
        assert!(falls_through(&[Stmt::if_(
            cond(),
            vec![ret()],
            vec![(cond(), vec![print("c")])],
            Some(vec![ret()])
        )]));
    }
}
