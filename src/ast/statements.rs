use crate::Span;

use super::expressions::{CallExpr, Expr};

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Empty,
    Block(BlockStmt),
    Assign {
        target: Expr,
        value: Expr,
    },
    Call(CallExpr),
    If {
        condition: Expr,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    Goto {
        label: String,
    },
    Return,
    /// `new p` or `new [size] p`.
    New {
        size: Option<Expr>,
        target: Expr,
    },
    /// `dispose p` or `dispose [] p`.
    Dispose {
        is_array: bool,
        target: Expr,
    },
}

/// Block Statement
/// `begin ... end`, a sequence of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}
