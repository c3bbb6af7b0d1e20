use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("and", TokenKind::And);
        map.insert("array", TokenKind::Array);
        map.insert("begin", TokenKind::Begin);
        map.insert("boolean", TokenKind::Boolean);
        map.insert("char", TokenKind::Char);
        map.insert("dispose", TokenKind::Dispose);
        map.insert("div", TokenKind::Div);
        map.insert("do", TokenKind::Do);
        map.insert("else", TokenKind::Else);
        map.insert("end", TokenKind::End);
        map.insert("false", TokenKind::False);
        map.insert("forward", TokenKind::Forward);
        map.insert("function", TokenKind::Function);
        map.insert("goto", TokenKind::Goto);
        map.insert("if", TokenKind::If);
        map.insert("integer", TokenKind::Integer);
        map.insert("label", TokenKind::Label);
        map.insert("mod", TokenKind::Mod);
        map.insert("new", TokenKind::New);
        map.insert("nil", TokenKind::Nil);
        map.insert("not", TokenKind::Not);
        map.insert("of", TokenKind::Of);
        map.insert("or", TokenKind::Or);
        map.insert("procedure", TokenKind::Procedure);
        map.insert("program", TokenKind::Program);
        map.insert("real", TokenKind::Real);
        map.insert("result", TokenKind::Result);
        map.insert("return", TokenKind::Return);
        map.insert("then", TokenKind::Then);
        map.insert("true", TokenKind::True);
        map.insert("var", TokenKind::Var);
        map.insert("while", TokenKind::While);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    IntegerLiteral,
    RealLiteral,
    CharLiteral,
    String,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,

    Walrus,    // :=
    Equals,    // =
    NotEquals, // <>
    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Plus,
    Dash,
    Star,
    Slash,
    Caret, // ^
    At,    // @

    Dot,
    Semicolon,
    Colon,
    Comma,

    // Reserved
    And,
    Array,
    Begin,
    Boolean,
    Char,
    Dispose,
    Div,
    Do,
    Else,
    End,
    False,
    Forward,
    Function,
    Goto,
    If,
    Integer,
    Label,
    Mod,
    New,
    Nil,
    Not,
    Of,
    Or,
    Procedure,
    Program,
    Real,
    Result,
    Return,
    Then,
    True,
    Var,
    While,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_one_of_many(&[
            TokenKind::String,
            TokenKind::Identifier,
            TokenKind::IntegerLiteral,
            TokenKind::RealLiteral,
            TokenKind::CharLiteral,
        ]) {
            write!(f, "{} ({:?}) @ line {}", self.kind, self.value, self.span.start.line)
        } else {
            write!(f, "{} @ line {}", self.kind, self.span.start.line)
        }
    }
}

impl Token {
    fn is_one_of_many(&self, tokens: &[TokenKind]) -> bool {
        tokens.contains(&self.kind)
    }
}
