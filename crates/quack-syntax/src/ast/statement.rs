//! Statement AST nodes

use super::*;

/// A statement with its source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtKind {
    /// Expression evaluated for its effect; the value is discarded.
    Expr(Expr),

    /// `x = value;` or `x: T = value;`
    Assign {
        target: String,
        #[serde(default)]
        declared: Option<Type>,
        value: Expr,
        /// Resolved type of `target`, attached by type inference.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_ty: Option<Type>,
    },

    /// `object.field = value;`
    StoreField {
        object: Expr,
        field: String,
        value: Expr,
    },

    /// `target op= value;`, removed by the desugarer.
    CompoundAssign {
        target: AssignTarget,
        op: BinaryOp,
        value: Expr,
    },

    /// `return;` / `return value;`
    Return(Option<Expr>),

    /// `if cond { .. } elif cond { .. } else { .. }`
    If {
        cond: Expr,
        then_block: Vec<Stmt>,
        #[serde(default)]
        elifs: Vec<ElifBranch>,
        #[serde(default)]
        else_block: Option<Vec<Stmt>>,
    },

    /// `while cond { .. }`
    While { cond: Expr, body: Vec<Stmt> },
}

/// One `elif cond { block }` arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElifBranch {
    pub cond: Expr,
    pub block: Vec<Stmt>,
}

/// Left-hand side of a compound assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignTarget {
    Var(String),
    Field { object: Box<Expr>, field: String },
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn expr(expr: Expr) -> Self {
        let span = expr.span;
        Stmt::new(StmtKind::Expr(expr), span)
    }

    pub fn assign(target: impl Into<String>, declared: Option<&str>, value: Expr) -> Self {
        let span = value.span;
        Stmt::new(
            StmtKind::Assign {
                target: target.into(),
                declared: declared.map(Type::from),
                value,
                target_ty: None,
            },
            span,
        )
    }

    pub fn store_field(object: Expr, field: impl Into<String>, value: Expr) -> Self {
        let span = object.span;
        Stmt::new(
            StmtKind::StoreField {
                object,
                field: field.into(),
                value,
            },
            span,
        )
    }

    pub fn compound(target: AssignTarget, op: BinaryOp, value: Expr) -> Self {
        let span = value.span;
        Stmt::new(StmtKind::CompoundAssign { target, op, value }, span)
    }

    pub fn ret(value: Option<Expr>) -> Self {
        let span = value.as_ref().map(|v| v.span).unwrap_or_default();
        Stmt::new(StmtKind::Return(value), span)
    }

    pub fn if_(
        cond: Expr,
        then_block: Vec<Stmt>,
        elifs: Vec<(Expr, Vec<Stmt>)>,
        else_block: Option<Vec<Stmt>>,
    ) -> Self {
        let span = cond.span;
        Stmt::new(
            StmtKind::If {
                cond,
                then_block,
                elifs: elifs
                    .into_iter()
                    .map(|(cond, block)| ElifBranch { cond, block })
                    .collect(),
                else_block,
            },
            span,
        )
    }

    pub fn while_(cond: Expr, body: Vec<Stmt>) -> Self {
        let span = cond.span;
        Stmt::new(StmtKind::While { cond, body }, span)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, StmtKind::Return(_))
    }
}
