use crate::{
    ast::{
        expressions::{Expr, ExprKind},
        statements::{BlockStmt, Stmt, StmtKind},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
    Span,
};

use super::parser::Parser;

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let kind = parser.current_token_kind();

    if let Some(stmt_fn) = parser.get_stmt_lookup().get(&kind).copied() {
        return stmt_fn(parser);
    }

    // The empty statement is recognised by what may follow it.
    if matches!(kind, TokenKind::Semicolon | TokenKind::End | TokenKind::Else) {
        let position = parser.get_position();
        return Ok(Stmt::new(
            StmtKind::Empty,
            Span {
                start: position.clone(),
                end: position,
            },
        ));
    }

    if kind == TokenKind::Identifier && parser.peek_kind() == TokenKind::Colon {
        return parse_labeled_stmt(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;

    if parser.current_token_kind() == TokenKind::Walrus {
        parser.advance();
        expect_lvalue(&expr, "on the left of `:=`")?;
        let value = parse_expr(parser, BindingPower::Default)?;

        let span = Span {
            start: expr.span.start.clone(),
            end: value.span.end.clone(),
        };

        return Ok(Stmt::new(StmtKind::Assign { target: expr, value }, span));
    }

    match expr.kind {
        ExprKind::Call(call) => Ok(Stmt::new(StmtKind::Call(call), expr.span)),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected `:=` or a procedure call"),
            },
            parser.get_position(),
        )),
    }
}

fn expect_lvalue(expr: &Expr, context: &str) -> Result<(), Error> {
    if expr.is_lvalue() {
        Ok(())
    } else {
        Err(Error::new(
            ErrorImpl::ExpectedLValue {
                context: String::from(context),
            },
            expr.span.start.clone(),
        ))
    }
}

/// Parses `begin stmt; ...; stmt end` without wrapping it in a statement.
pub fn parse_block(parser: &mut Parser) -> Result<BlockStmt, Error> {
    let start = parser.expect(TokenKind::Begin)?.span.start;

    let mut body = vec![parse_stmt(parser)?];
    while parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();
        body.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::End)?;

    Ok(BlockStmt {
        body,
        span: Span {
            start,
            end: parser.last_position(),
        },
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let block = parse_block(parser)?;
    let span = block.span.clone();
    Ok(Stmt::new(StmtKind::Block(block), span))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Then)?;
    let then_body = parse_stmt(parser)?;

    let else_body = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(Box::new(parse_stmt(parser)?))
    } else {
        None
    };

    Ok(Stmt::new(
        StmtKind::If {
            condition,
            then_body: Box::new(then_body),
            else_body,
        },
        Span {
            start,
            end: parser.last_position(),
        },
    ))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Do)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::new(
        StmtKind::While {
            condition,
            body: Box::new(body),
        },
        Span {
            start,
            end: parser.last_position(),
        },
    ))
}

pub fn parse_labeled_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let label = parser.expect_identifier("as label")?;
    parser.expect(TokenKind::Colon)?;
    let body = parse_stmt(parser)?;

    Ok(Stmt::new(
        StmtKind::Labeled {
            label,
            body: Box::new(body),
        },
        Span {
            start,
            end: parser.last_position(),
        },
    ))
}

pub fn parse_goto_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;
    let label = parser.expect_identifier("after `goto`")?;

    Ok(Stmt::new(
        StmtKind::Goto { label },
        Span {
            start,
            end: parser.last_position(),
        },
    ))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let token = parser.advance();
    Ok(Stmt::new(StmtKind::Return, token.span))
}

pub fn parse_new_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let size = if parser.current_token_kind() == TokenKind::OpenBracket {
        parser.advance();
        let size = parse_expr(parser, BindingPower::Default)?;
        parser.expect(TokenKind::CloseBracket)?;
        Some(size)
    } else {
        None
    };

    let target = parse_expr(parser, BindingPower::Default)?;
    expect_lvalue(&target, "after `new`")?;

    Ok(Stmt::new(
        StmtKind::New { size, target },
        Span {
            start,
            end: parser.last_position(),
        },
    ))
}

pub fn parse_dispose_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let is_array = if parser.current_token_kind() == TokenKind::OpenBracket {
        parser.advance();
        parser.expect(TokenKind::CloseBracket)?;
        true
    } else {
        false
    };

    let target = parse_expr(parser, BindingPower::Default)?;
    expect_lvalue(&target, "after `dispose`")?;

    Ok(Stmt::new(
        StmtKind::Dispose { is_array, target },
        Span {
            start,
            end: parser.last_position(),
        },
    ))
}
