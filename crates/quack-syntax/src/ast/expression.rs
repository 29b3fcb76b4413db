//! Expression AST nodes

use super::*;

/// An expression with its source location and attached static type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(default)]
    pub span: Span,
    /// Inferred type; `None` until type inference resolves it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    /// Integer literal: 42
    Int(i64),

    /// String literal, unescaped contents
    Str(String),

    /// `true` / `false`
    Bool(bool),

    /// `none`
    Nothing,

    /// Local variable, parameter or `this`
    Var(String),

    /// Operator syntax, removed by the desugarer
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Prefix operator syntax, removed by the desugarer
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Short-circuit `left and right`
    And(Box<Expr>, Box<Expr>),

    /// Short-circuit `left or right`
    Or(Box<Expr>, Box<Expr>),

    /// `receiver.method(args)`
    Call {
        receiver: Box<Expr>,
        method: String,
        #[serde(default)]
        args: Vec<Expr>,
    },

    /// Constructor call `Class(args)`
    New {
        class: String,
        #[serde(default)]
        args: Vec<Expr>,
    },

    /// `object.field`
    LoadField { object: Box<Expr>, field: String },
}

/// Infix operators and the builtin method each one becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    AtMost,
    More,
    AtLeast,
    Equal,
    NotEqual,
}

impl BinaryOp {
    /// Name of the method the operator is dispatched to. `!=` calls
    /// `equals` and negates the result.
    pub fn method_name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "plus",
            BinaryOp::Sub => "minus",
            BinaryOp::Mul => "times",
            BinaryOp::Div => "divide",
            BinaryOp::Mod => "mod",
            BinaryOp::Less => "less",
            BinaryOp::AtMost => "atmost",
            BinaryOp::More => "more",
            BinaryOp::AtLeast => "atleast",
            BinaryOp::Equal | BinaryOp::NotEqual => "equals",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `not x`
    Not,
}

impl UnaryOp {
    pub fn method_name(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Not => "not",
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }

    pub fn int(value: i64) -> Self {
        Expr::new(ExprKind::Int(value), Span::default())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::Str(value.into()), Span::default())
    }

    pub fn bool(value: bool) -> Self {
        Expr::new(ExprKind::Bool(value), Span::default())
    }

    pub fn nothing() -> Self {
        Expr::new(ExprKind::Nothing, Span::default())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Var(name.into()), Span::default())
    }

    pub fn this() -> Self {
        Expr::var(crate::ty::THIS)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let span = left.span.combine(&right.span);
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        let span = operand.span;
        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        let span = left.span.combine(&right.span);
        Expr::new(ExprKind::And(Box::new(left), Box::new(right)), span)
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        let span = left.span.combine(&right.span);
        Expr::new(ExprKind::Or(Box::new(left), Box::new(right)), span)
    }

    pub fn call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        let span = receiver.span;
        Expr::new(
            ExprKind::Call {
                receiver: Box::new(receiver),
                method: method.into(),
                args,
            },
            span,
        )
    }

    pub fn new_object(class: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::New {
                class: class.into(),
                args,
            },
            Span::default(),
        )
    }

    pub fn load_field(object: Expr, field: impl Into<String>) -> Self {
        let span = object.span;
        Expr::new(
            ExprKind::LoadField {
                object: Box::new(object),
                field: field.into(),
            },
            span,
        )
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Check if this expression is the `this` receiver
    pub fn is_this(&self) -> bool {
        matches!(&self.kind, ExprKind::Var(name) if name == crate::ty::THIS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_method_names() {
        assert_eq!(BinaryOp::Add.method_name(), "plus");
        assert_eq!(BinaryOp::AtLeast.method_name(), "atleast");
        assert_eq!(BinaryOp::NotEqual.method_name(), "equals");
        assert_eq!(UnaryOp::Neg.method_name(), "neg");
    }

    #[test]
    fn test_is_this() {
        assert!(Expr::this().is_this());
        assert!(!Expr::var("self").is_this());
    }
}
