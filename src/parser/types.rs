//! Type parsing implementation.
//!
//! This module handles parsing of type annotations. PCL types are all
//! prefix forms:
//!
//! - Scalar types (`integer`, `real`, `boolean`, `char`)
//! - Sized and unsized array types (`array [n] of T`, `array of T`)
//! - Pointer types (`^T`)
//!
//! Like expression parsing, handlers are looked up by the leading token.

use std::collections::HashMap;

use crate::{
    ast::types::Type,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

/// Type alias for type handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> Result<Type, Error>;

/// Type alias for type lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Initializes the type parsing lookup table.
///
/// # Arguments
///
/// * `parser` - Mutable reference to the parser to initialize
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Integer, parse_scalar_type);
    parser.type_nud(TokenKind::Real, parse_scalar_type);
    parser.type_nud(TokenKind::Boolean, parse_scalar_type);
    parser.type_nud(TokenKind::Char, parse_scalar_type);
    parser.type_nud(TokenKind::Array, parse_array_type);
    parser.type_nud(TokenKind::Caret, parse_pointer_type);
}

pub fn parse_type(parser: &mut Parser) -> Result<Type, Error> {
    let token_kind = parser.current_token_kind();
    match parser.get_type_nud_lookup().get(&token_kind).copied() {
        Some(type_fn) => type_fn(parser),
        None => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected a type"),
            },
            parser.get_position(),
        )),
    }
}

pub fn parse_scalar_type(parser: &mut Parser) -> Result<Type, Error> {
    let token = parser.advance();
    match token.kind {
        TokenKind::Integer => Ok(Type::INTEGER),
        TokenKind::Real => Ok(Type::REAL),
        TokenKind::Boolean => Ok(Type::BOOLEAN),
        TokenKind::Char => Ok(Type::CHAR),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken { token: token.value },
            token.span.start,
        )),
    }
}

pub fn parse_array_type(parser: &mut Parser) -> Result<Type, Error> {
    parser.expect(TokenKind::Array)?;

    let length = if parser.current_token_kind() == TokenKind::OpenBracket {
        parser.advance();
        let token = parser.expect(TokenKind::IntegerLiteral)?;
        let length = token.value.parse::<u32>().map_err(|_| {
            Error::new(
                ErrorImpl::NumberParseError {
                    token: token.value.clone(),
                },
                token.span.start.clone(),
            )
        })?;
        parser.expect(TokenKind::CloseBracket)?;
        Some(length)
    } else {
        None
    };

    parser.expect(TokenKind::Of)?;
    let element = parse_type(parser)?;

    Ok(match length {
        Some(length) => Type::const_array(length, element),
        None => Type::var_array(element),
    })
}

pub fn parse_pointer_type(parser: &mut Parser) -> Result<Type, Error> {
    parser.expect(TokenKind::Caret)?;
    Ok(Type::pointer(parse_type(parser)?))
}
