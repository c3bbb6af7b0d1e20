use crate::{lexer::tokens::Token, Span};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // LITERALS
    Integer(i32),
    Real(f64),
    Char(u8),
    Boolean(bool),
    Nil,
    /// String literal, escapes already resolved. Addressable like a char array.
    String(String),

    // LVALUES
    Symbol(String),
    /// The implicit result variable of the enclosing function.
    Result,
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Deref(Box<Expr>),

    // RVALUES
    AddressOf(Box<Expr>),
    Prefix {
        operator: Token,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Call(CallExpr),
}

/// Call Expression
/// A call of a named procedure or function with positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: String,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    /// Whether the expression denotes a storage location.
    pub fn is_lvalue(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Symbol(_)
                | ExprKind::Result
                | ExprKind::String(_)
                | ExprKind::Index { .. }
                | ExprKind::Deref(_)
        )
    }
}
