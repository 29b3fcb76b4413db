use quack_syntax::ast::*;
use quack_syntax::{desugar, Span, Type};

// ============================================================================
// Tree Input Tests
// ============================================================================

#[test]
fn test_tree_from_json() {
    let source = r#"{
        "classes": [{
            "name": "Pt",
            "superclass": "Shape",
            "params": [{ "name": "x", "ty": "Int" }],
            "body": [{
                "kind": { "store_field": {
                    "object": { "kind": { "var": "this" } },
                    "field": "x",
                    "value": { "kind": { "var": "x" } }
                } },
                "span": { "start": 10, "end": 20, "line": 2, "column": 5 }
            }]
        }],
        "main": [
            { "kind": { "return": null } }
        ]
    }"#;
    let program: Program = serde_json::from_str(source).unwrap();

    let class = program.class("Pt").unwrap();
    assert_eq!(class.superclass_name(), "Shape");
    assert_eq!(class.params[0].ty, Type::int());
    assert_eq!(class.body[0].span, Span::new(10, 20, 2, 5));
    assert_eq!(class.field_names(), vec!["x".to_string()]);
    assert_eq!(program.main[0].kind, StmtKind::Return(None));
}

#[test]
fn test_untyped_tree_serializes_without_types() {
    let program = Program::new(vec![], vec![Stmt::assign("x", None, Expr::int(1))]);
    let json = serde_json::to_string(&program).unwrap();
    assert!(!json.contains("\"ty\""));
    assert!(!json.contains("target_ty"));

    let back: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(back, program);
}

// ============================================================================
// Desugaring Tests
// ============================================================================

#[test]
fn test_desugared_tree_has_only_core_forms() {
    struct Surface(usize);

    impl Visitor for Surface {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if matches!(stmt.kind, StmtKind::CompoundAssign { .. }) {
                self.0 += 1;
            }
            walk_stmt(self, stmt);
        }

        fn visit_expr(&mut self, expr: &Expr) {
            if matches!(expr.kind, ExprKind::Binary { .. } | ExprKind::Unary { .. }) {
                self.0 += 1;
            }
            walk_expr(self, expr);
        }
    }

    let class = ClassDecl::new("C", None).with_method(MethodDecl::new(
        "m",
        vec![Param::new("a", "Int")],
        None,
        vec![
            Stmt::compound(AssignTarget::Var("a".into()), BinaryOp::Mul, Expr::int(2)),
            Stmt::while_(
                Expr::binary(BinaryOp::AtMost, Expr::var("a"), Expr::int(9)),
                vec![Stmt::expr(Expr::unary(UnaryOp::Neg, Expr::var("a")))],
            ),
        ],
    ));
    let main = vec![Stmt::if_(
        Expr::unary(UnaryOp::Not, Expr::bool(false)),
        vec![],
        vec![(Expr::binary(BinaryOp::NotEqual, Expr::int(1), Expr::int(2)), vec![])],
        None,
    )];

    let mut before = Surface(0);
    let program = Program::new(vec![class], main);
    before.visit_program(&program);
    assert_eq!(before.0, 5);

    let program = desugar(program, "Main");
    let mut after = Surface(0);
    after.visit_program(&program);
    assert_eq!(after.0, 0);
}

#[test]
fn test_operator_spans_carried_to_calls() {
    let span = Span::new(4, 9, 1, 5);
    let main = vec![Stmt::expr(
        Expr::binary(BinaryOp::Sub, Expr::int(7), Expr::int(3)).with_span(span),
    )];
    let program = desugar(Program::new(vec![], main), "Main");

    let StmtKind::Expr(call) = &program.classes[0].body[0].kind else {
        panic!("expected expression statement");
    };
    assert_eq!(call.span, span);
    assert!(matches!(&call.kind, ExprKind::Call { method, .. } if method == "minus"));
}
