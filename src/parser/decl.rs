//! Declaration parsing: the program, bodies, local declarations and routine
//! headers.

use crate::{
    ast::ast::{Body, Formal, Header, LabelDecl, Local, Program, RoutineDecl, RoutineKind, VarDecl},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{parser::Parser, stmt::parse_block, types::parse_type};

pub fn parse_program(parser: &mut Parser) -> Result<Program, Error> {
    let start = parser.expect(TokenKind::Program)?.span.start;
    let name = parser.expect_identifier("after `program`")?;
    parser.expect(TokenKind::Semicolon)?;

    let body = parse_body(parser)?;
    parser.expect(TokenKind::Dot)?;

    if parser.has_tokens() {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected end of file after the program"),
            },
            parser.get_position(),
        ));
    }

    Ok(Program {
        name,
        body,
        span: Span {
            start,
            end: parser.last_position(),
        },
    })
}

pub fn parse_body(parser: &mut Parser) -> Result<Body, Error> {
    let start = parser.get_position();
    let mut locals = vec![];

    loop {
        match parser.current_token_kind() {
            TokenKind::Var => parse_var_decls(parser, &mut locals)?,
            TokenKind::Label => locals.push(parse_label_decl(parser)?),
            TokenKind::Procedure | TokenKind::Function => {
                locals.push(parse_routine_decl(parser)?)
            }
            TokenKind::Forward => locals.push(parse_forward_decl(parser)?),
            _ => break,
        }
    }

    let block = parse_block(parser)?;

    Ok(Body {
        locals,
        block,
        span: Span {
            start,
            end: parser.last_position(),
        },
    })
}

fn parse_identifier_list(parser: &mut Parser, context: &str) -> Result<Vec<String>, Error> {
    let mut names = vec![parser.expect_identifier(context)?];

    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        names.push(parser.expect_identifier(context)?);
    }

    Ok(names)
}

/// `var` followed by one or more `a, b : T;` groups.
fn parse_var_decls(parser: &mut Parser, locals: &mut Vec<Local>) -> Result<(), Error> {
    parser.expect(TokenKind::Var)?;

    loop {
        let start = parser.get_position();
        let names = parse_identifier_list(parser, "in variable declaration")?;
        parser.expect(TokenKind::Colon)?;
        let ty = parse_type(parser)?;
        parser.expect(TokenKind::Semicolon)?;

        locals.push(Local::Var(VarDecl {
            names,
            ty,
            span: Span {
                start,
                end: parser.last_position(),
            },
        }));

        if parser.current_token_kind() != TokenKind::Identifier {
            return Ok(());
        }
    }
}

fn parse_label_decl(parser: &mut Parser) -> Result<Local, Error> {
    let start = parser.expect(TokenKind::Label)?.span.start;
    let names = parse_identifier_list(parser, "in label declaration")?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Local::Label(LabelDecl {
        names,
        span: Span {
            start,
            end: parser.last_position(),
        },
    }))
}

fn parse_routine_decl(parser: &mut Parser) -> Result<Local, Error> {
    let start = parser.get_position();
    let header = parse_header(parser)?;
    parser.expect(TokenKind::Semicolon)?;
    let body = parse_body(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Local::Routine(RoutineDecl {
        header,
        body,
        span: Span {
            start,
            end: parser.last_position(),
        },
    }))
}

fn parse_forward_decl(parser: &mut Parser) -> Result<Local, Error> {
    parser.expect(TokenKind::Forward)?;
    let header = parse_header(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Local::Forward(header))
}

pub fn parse_header(parser: &mut Parser) -> Result<Header, Error> {
    let token = parser.advance();
    let kind = match token.kind {
        TokenKind::Procedure => RoutineKind::Procedure,
        TokenKind::Function => RoutineKind::Function,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: token.value,
                    message: String::from("expected `procedure` or `function`"),
                },
                token.span.start,
            ))
        }
    };

    let name = parser.expect_identifier("as routine name")?;
    parser.expect(TokenKind::OpenParen)?;

    let mut formals = vec![];
    if parser.current_token_kind() != TokenKind::CloseParen {
        formals.push(parse_formal(parser)?);
        while parser.current_token_kind() == TokenKind::Semicolon {
            parser.advance();
            formals.push(parse_formal(parser)?);
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let return_type = match kind {
        RoutineKind::Function => {
            parser.expect(TokenKind::Colon)?;
            Some(parse_type(parser)?)
        }
        RoutineKind::Procedure => None,
    };

    Ok(Header {
        kind,
        name,
        formals,
        return_type,
        span: Span {
            start: token.span.start,
            end: parser.last_position(),
        },
    })
}

fn parse_formal(parser: &mut Parser) -> Result<Formal, Error> {
    let start = parser.get_position();

    let by_reference = parser.current_token_kind() == TokenKind::Var;
    if by_reference {
        parser.advance();
    }

    let names = parse_identifier_list(parser, "in parameter list")?;
    parser.expect(TokenKind::Colon)?;
    let ty = parse_type(parser)?;

    Ok(Formal {
        by_reference,
        names,
        ty,
        span: Span {
            start,
            end: parser.last_position(),
        },
    })
}
