//! Typed Abstract Syntax Tree definitions.
//!
//! This module contains the typed variants of AST nodes produced by
//! the type checker. Each typed node has been validated for type
//! correctness, and the tree mirrors the untyped one except that:
//! - every expression carries its resolved type
//! - every name is resolved to the unique storage symbol it denotes
//! - every call carries the callee's formal parameters
//!
//! This typed AST is consumed by the code generator to produce LLVM IR.

use crate::{ast::types::Type, lexer::tokens::TokenKind, Span};

#[derive(Debug, Clone, PartialEq)]
pub struct TypedProgram {
    pub name: String,
    pub body: TypedBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedBody {
    pub decls: Vec<TypedDecl>,
    pub block: Vec<TypedStmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedDecl {
    Variable {
        name: String,
        storage: String,
        ty: Type,
    },
    Routine(TypedRoutine),
    Forward(TypedHeader),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedRoutine {
    pub header: TypedHeader,
    pub body: TypedBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedHeader {
    pub name: String,
    /// Symbol of the generated function.
    pub storage: String,
    pub formals: Vec<TypedFormal>,
    pub return_type: Option<Type>,
    /// Slot of the implicit `result` variable, functions only.
    pub result_storage: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFormal {
    pub name: String,
    pub storage: String,
    pub ty: Type,
    pub by_reference: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedStmt {
    pub kind: TypedStmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmtKind {
    Empty,
    Block(Vec<TypedStmt>),
    Assign {
        target: TypedExpr,
        value: TypedExpr,
    },
    Call(TypedCall),
    If {
        condition: TypedExpr,
        then_body: Box<TypedStmt>,
        else_body: Option<Box<TypedStmt>>,
    },
    While {
        condition: TypedExpr,
        body: Box<TypedStmt>,
    },
    Labeled {
        label: String,
        body: Box<TypedStmt>,
    },
    Goto {
        label: String,
    },
    Return,
    New {
        size: Option<TypedExpr>,
        target: TypedExpr,
    },
    Dispose {
        is_array: bool,
        target: TypedExpr,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    Integer(i32),
    Real(f64),
    Char(u8),
    Boolean(bool),
    Nil,
    String(String),
    /// A variable, formal or `result`.
    Variable {
        name: String,
        storage: String,
        by_reference: bool,
    },
    Index {
        array: Box<TypedExpr>,
        index: Box<TypedExpr>,
    },
    Deref(Box<TypedExpr>),
    AddressOf(Box<TypedExpr>),
    Prefix {
        operator: TokenKind,
        operand: Box<TypedExpr>,
    },
    Binary {
        left: Box<TypedExpr>,
        operator: TokenKind,
        right: Box<TypedExpr>,
    },
    Call(TypedCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedCall {
    pub name: String,
    /// Symbol of the called function, the link name for runtime routines.
    pub storage: String,
    pub formals: Vec<TypedFormal>,
    pub arguments: Vec<TypedExpr>,
    pub return_type: Option<Type>,
    pub is_external: bool,
}

impl TypedExpr {
    pub fn new(kind: TypedExprKind, ty: Type, span: Span) -> Self {
        TypedExpr { kind, ty, span }
    }

    /// Whether the expression denotes a storage location.
    pub fn is_lvalue(&self) -> bool {
        matches!(
            self.kind,
            TypedExprKind::Variable { .. }
                | TypedExprKind::String(_)
                | TypedExprKind::Index { .. }
                | TypedExprKind::Deref(_)
        )
    }
}

impl TypedStmt {
    pub fn new(kind: TypedStmtKind, span: Span) -> Self {
        TypedStmt { kind, span }
    }
}
