//! Unit tests for the parser module.
//!
//! This module contains tests for parsing declarations, statements,
//! expressions with precedence, types, and syntax errors.

use std::rc::Rc;

use crate::{
    ast::{
        ast::{Local, Program, RoutineKind},
        expressions::{Expr, ExprKind},
        statements::{Stmt, StmtKind},
        types::Type,
    },
    errors::errors::Error,
    lexer::{lexer::tokenize, tokens::TokenKind},
};

use super::parser::parse;

fn parse_source(source: &str) -> Result<Program, Error> {
    let tokens = tokenize(source.to_string(), Some("test.pcl".to_string()))?;
    let (_, result) = parse(tokens, Rc::new("test.pcl".to_string()));
    result
}

/// Parses `program t; begin <statement> end.` and returns the statement.
fn parse_statement(statement: &str) -> Stmt {
    let program = parse_source(&format!("program t; begin {} end.", statement)).unwrap();
    program.body.block.body[0].clone()
}

fn assigned_value(statement: &str) -> Expr {
    match parse_statement(statement).kind {
        StmtKind::Assign { value, .. } => value,
        other => panic!("Expected assignment, found {:?}", other),
    }
}

#[test]
fn test_parse_minimal_program() {
    let program = parse_source("program hello; begin end.").unwrap();

    assert_eq!(program.name, "hello");
    assert!(program.body.locals.is_empty());
    assert_eq!(program.body.block.body.len(), 1);
    assert_eq!(program.body.block.body[0].kind, StmtKind::Empty);
}

#[test]
fn test_parse_var_declarations() {
    let program = parse_source(
        "program p; var x, y : integer; s : array [10] of char; q : ^array of real; begin end.",
    )
    .unwrap();

    assert_eq!(program.body.locals.len(), 3);
    match &program.body.locals[0] {
        Local::Var(decl) => {
            assert_eq!(decl.names, vec!["x".to_string(), "y".to_string()]);
            assert_eq!(decl.ty, Type::INTEGER);
        }
        other => panic!("Expected var declaration, found {:?}", other),
    }
    match &program.body.locals[1] {
        Local::Var(decl) => assert_eq!(decl.ty, Type::const_array(10, Type::CHAR)),
        other => panic!("Expected var declaration, found {:?}", other),
    }
    match &program.body.locals[2] {
        Local::Var(decl) => assert_eq!(decl.ty, Type::pointer(Type::var_array(Type::REAL))),
        other => panic!("Expected var declaration, found {:?}", other),
    }
}

#[test]
fn test_parse_routines_and_forward() {
    let program = parse_source(
        "program p;
         forward function f(n : integer) : integer;
         procedure swap(var a, b : integer; var s : array of char);
           var t : integer;
         begin t := a; a := b; b := t end;
         function f(n : integer) : integer;
         begin result := n end;
         begin end.",
    )
    .unwrap();

    assert_eq!(program.body.locals.len(), 3);

    match &program.body.locals[0] {
        Local::Forward(header) => {
            assert_eq!(header.kind, RoutineKind::Function);
            assert_eq!(header.return_type, Some(Type::INTEGER));
        }
        other => panic!("Expected forward declaration, found {:?}", other),
    }

    match &program.body.locals[1] {
        Local::Routine(routine) => {
            assert_eq!(routine.header.name, "swap");
            assert_eq!(routine.header.kind, RoutineKind::Procedure);
            assert_eq!(routine.header.formals.len(), 2);
            assert!(routine.header.formals[0].by_reference);
            assert_eq!(routine.header.formals[0].names.len(), 2);
            assert_eq!(routine.header.formals[1].ty, Type::var_array(Type::CHAR));
            assert_eq!(routine.body.locals.len(), 1);
            assert_eq!(routine.body.block.body.len(), 3);
        }
        other => panic!("Expected routine, found {:?}", other),
    }
}

#[test]
fn test_parse_labels_and_goto() {
    let program = parse_source("program p; label l1, l2; begin l1: goto l2; l2: end.").unwrap();

    match &program.body.locals[0] {
        Local::Label(decl) => assert_eq!(decl.names.len(), 2),
        other => panic!("Expected label declaration, found {:?}", other),
    }

    let body = &program.body.block.body;
    match &body[0].kind {
        StmtKind::Labeled { label, body } => {
            assert_eq!(label, "l1");
            assert!(matches!(&body.kind, StmtKind::Goto { label } if label == "l2"));
        }
        other => panic!("Expected labeled statement, found {:?}", other),
    }
    match &body[1].kind {
        StmtKind::Labeled { body, .. } => assert_eq!(body.kind, StmtKind::Empty),
        other => panic!("Expected labeled statement, found {:?}", other),
    }
}

#[test]
fn test_precedence() {
    // a + b * c  =>  a + (b * c)
    match assigned_value("x := a + b * c").kind {
        ExprKind::Binary {
            operator, right, ..
        } => {
            assert_eq!(operator.kind, TokenKind::Plus);
            assert!(matches!(
                right.kind,
                ExprKind::Binary { ref operator, .. } if operator.kind == TokenKind::Star
            ));
        }
        other => panic!("Expected binary expression, found {:?}", other),
    }

    // a < b or c  =>  a < (b or c)
    match assigned_value("x := a < b or c").kind {
        ExprKind::Binary { operator, .. } => assert_eq!(operator.kind, TokenKind::Less),
        other => panic!("Expected binary expression, found {:?}", other),
    }
}

#[test]
fn test_left_associativity() {
    // a - b - c  =>  (a - b) - c
    match assigned_value("x := a - b - c").kind {
        ExprKind::Binary { left, right, .. } => {
            assert!(matches!(left.kind, ExprKind::Binary { .. }));
            assert_eq!(right.kind, ExprKind::Symbol("c".to_string()));
        }
        other => panic!("Expected binary expression, found {:?}", other),
    }
}

#[test]
fn test_prefix_binds_tighter_than_binary() {
    // -a * b  =>  (-a) * b
    match assigned_value("x := -a * b").kind {
        ExprKind::Binary { left, operator, .. } => {
            assert_eq!(operator.kind, TokenKind::Star);
            assert!(matches!(left.kind, ExprKind::Prefix { .. }));
        }
        other => panic!("Expected binary expression, found {:?}", other),
    }

    // not p^  =>  not (p^)
    match assigned_value("x := not p^").kind {
        ExprKind::Prefix { operand, .. } => assert!(matches!(operand.kind, ExprKind::Deref(_))),
        other => panic!("Expected prefix expression, found {:?}", other),
    }
}

#[test]
fn test_postfix_chain() {
    // p^[i + 1]  =>  Index(Deref(p), i + 1)
    match assigned_value("x := p^[i + 1]").kind {
        ExprKind::Index { array, index } => {
            assert!(matches!(array.kind, ExprKind::Deref(_)));
            assert!(matches!(index.kind, ExprKind::Binary { .. }));
        }
        other => panic!("Expected index expression, found {:?}", other),
    }
}

#[test]
fn test_address_of() {
    match assigned_value("p := @a[3]").kind {
        ExprKind::AddressOf(operand) => assert!(matches!(operand.kind, ExprKind::Index { .. })),
        other => panic!("Expected address-of, found {:?}", other),
    }
}

#[test]
fn test_address_of_non_lvalue() {
    let result = parse_source("program p; begin q := @(1 + 2) end.");
    assert_eq!(result.unwrap_err().get_error_name(), "AddressOfNonLValue");
}

#[test]
fn test_literals() {
    assert_eq!(assigned_value("x := 42").kind, ExprKind::Integer(42));
    assert_eq!(assigned_value("x := 1.5").kind, ExprKind::Real(1.5));
    assert_eq!(assigned_value("x := 'a'").kind, ExprKind::Char(b'a'));
    assert_eq!(assigned_value("x := true").kind, ExprKind::Boolean(true));
    assert_eq!(assigned_value("x := nil").kind, ExprKind::Nil);
    assert_eq!(assigned_value("result := 0").kind, ExprKind::Integer(0));
}

#[test]
fn test_call_statement_and_expression() {
    match parse_statement("writeString(\"hi\")").kind {
        StmtKind::Call(call) => {
            assert_eq!(call.callee, "writeString");
            assert_eq!(call.arguments[0].kind, ExprKind::String("hi".to_string()));
        }
        other => panic!("Expected call, found {:?}", other),
    }

    match assigned_value("x := f(1, g(), y)").kind {
        ExprKind::Call(call) => {
            assert_eq!(call.arguments.len(), 3);
            assert!(matches!(&call.arguments[1].kind, ExprKind::Call(inner) if inner.arguments.is_empty()));
        }
        other => panic!("Expected call, found {:?}", other),
    }
}

#[test]
fn test_if_while_and_dangling_else() {
    match parse_statement("if a then if b then x := 1 else x := 2").kind {
        StmtKind::If {
            then_body,
            else_body,
            ..
        } => {
            assert!(else_body.is_none());
            assert!(matches!(then_body.kind, StmtKind::If { else_body: Some(_), .. }));
        }
        other => panic!("Expected if, found {:?}", other),
    }

    assert!(matches!(
        parse_statement("while i < 10 do begin i := i + 1 end").kind,
        StmtKind::While { .. }
    ));
}

#[test]
fn test_new_and_dispose() {
    match parse_statement("new [n * 2] p").kind {
        StmtKind::New { size, target } => {
            assert!(size.is_some());
            assert_eq!(target.kind, ExprKind::Symbol("p".to_string()));
        }
        other => panic!("Expected new, found {:?}", other),
    }

    assert!(matches!(
        parse_statement("dispose [] p").kind,
        StmtKind::Dispose { is_array: true, .. }
    ));
    assert!(matches!(
        parse_statement("dispose p").kind,
        StmtKind::Dispose { is_array: false, .. }
    ));
}

#[test]
fn test_assignment_to_non_lvalue() {
    let result = parse_source("program p; begin 1 := x end.");
    assert_eq!(result.unwrap_err().get_error_name(), "ExpectedLValue");
}

#[test]
fn test_expression_statement_rejected() {
    let result = parse_source("program p; begin x + 1 end.");
    assert_eq!(result.unwrap_err().get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_missing_semicolon() {
    let result = parse_source("program p; begin x := 1 y := 2 end.");
    assert!(result.is_err());
}

#[test]
fn test_missing_final_dot() {
    let result = parse_source("program p; begin end");
    assert!(result.is_err());
}

#[test]
fn test_trailing_tokens() {
    let result = parse_source("program p; begin end. x");
    assert_eq!(result.unwrap_err().get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_integer_overflow() {
    let result = parse_source("program p; begin x := 99999999999 end.");
    assert_eq!(result.unwrap_err().get_error_name(), "NumberParseError");
}

#[test]
fn test_statement_spans_carry_lines() {
    let program = parse_source("program p;\nbegin\n  x := 1;\n  y := 2\nend.").unwrap();

    assert_eq!(program.body.block.body[0].span.start.line, 3);
    assert_eq!(program.body.block.body[1].span.start.line, 4);
}
