//! Declaration-level nodes of the syntax tree.
//!
//! A program is a name and a body; a body is a list of local declarations
//! followed by a block. Routines nest: every routine owns its own body.

use crate::Span;

use super::{statements::BlockStmt, types::Type};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub body: Body,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub locals: Vec<Local>,
    pub block: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Local {
    Var(VarDecl),
    Label(LabelDecl),
    Routine(RoutineDecl),
    Forward(Header),
}

/// `var a, b : T;`: one group of identifiers sharing a type.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub names: Vec<String>,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelDecl {
    pub names: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    Procedure,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub kind: RoutineKind,
    pub name: String,
    pub formals: Vec<Formal>,
    /// Present exactly for functions.
    pub return_type: Option<Type>,
    pub span: Span,
}

/// A group of formal parameters sharing a type and passing mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Formal {
    pub by_reference: bool,
    pub names: Vec<String>,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutineDecl {
    pub header: Header,
    pub body: Body,
    pub span: Span,
}
