//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Integer, real and character literals
//! - String literals with escape sequences
//! - Operators and punctuation
//! - Comments and line tracking
//! - Error cases

use super::{lexer::tokenize, tokens::TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source.to_string(), Some("test.pcl".to_string()))
        .unwrap()
        .iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let tokens = kinds("program begin end var label procedure function forward result return");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Program,
            TokenKind::Begin,
            TokenKind::End,
            TokenKind::Var,
            TokenKind::Label,
            TokenKind::Procedure,
            TokenKind::Function,
            TokenKind::Forward,
            TokenKind::Result,
            TokenKind::Return,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_type_keywords() {
    let tokens = kinds("integer real boolean char array of nil");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Integer,
            TokenKind::Real,
            TokenKind::Boolean,
            TokenKind::Char,
            TokenKind::Array,
            TokenKind::Of,
            TokenKind::Nil,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = tokenize(
        "foo bar_1 Begin writeInteger".to_string(),
        Some("test.pcl".to_string()),
    )
    .unwrap();

    assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Identifier));
    assert_eq!(tokens[1].value, "bar_1");
    // Keywords are case sensitive.
    assert_eq!(tokens[2].value, "Begin");
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize(
        "42 3.14 2.5e-3 1e".to_string(),
        Some("test.pcl".to_string()),
    )
    .unwrap();

    assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::RealLiteral);
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::RealLiteral);
    assert_eq!(tokens[2].value, "2.5e-3");
    // `1e` is an integer followed by an identifier.
    assert_eq!(tokens[3].kind, TokenKind::IntegerLiteral);
    assert_eq!(tokens[4].kind, TokenKind::Identifier);
}

#[test]
fn test_integer_then_dot() {
    assert_eq!(
        kinds("1."),
        vec![TokenKind::IntegerLiteral, TokenKind::Dot, TokenKind::EOF]
    );
}

#[test]
fn test_tokenize_chars() {
    let tokens = tokenize(
        r"'a' '\n' '\'' '\0'".to_string(),
        Some("test.pcl".to_string()),
    )
    .unwrap();

    assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
    assert_eq!(tokens[0].value, "a");
    assert_eq!(tokens[1].value, "\n");
    assert_eq!(tokens[2].value, "'");
    assert_eq!(tokens[3].value, "\0");
}

#[test]
fn test_tokenize_string_with_escapes() {
    let tokens = tokenize(
        r#""Hello\tworld\n" "say \"hi\"""#.to_string(),
        Some("test.pcl".to_string()),
    )
    .unwrap();

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "Hello\tworld\n");
    assert_eq!(tokens[1].value, "say \"hi\"");
}

#[test]
fn test_tokenize_operators() {
    let tokens = kinds(":= = <> < <= > >= + - * / ^ @ ( ) [ ] ; : . ,");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Walrus,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::LessEquals,
            TokenKind::Greater,
            TokenKind::GreaterEquals,
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Caret,
            TokenKind::At,
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::Dot,
            TokenKind::Comma,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_word_operators() {
    assert_eq!(
        kinds("a div b mod c and not d or e"),
        vec![
            TokenKind::Identifier,
            TokenKind::Div,
            TokenKind::Identifier,
            TokenKind::Mod,
            TokenKind::Identifier,
            TokenKind::And,
            TokenKind::Not,
            TokenKind::Identifier,
            TokenKind::Or,
            TokenKind::Identifier,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_comments_are_skipped_and_lines_tracked() {
    let source = "(* header\n   spans lines *)\nx := 1; (* inline *)\ny";
    let tokens = tokenize(source.to_string(), Some("test.pcl".to_string())).unwrap();

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].span.start.line, 3);
    assert_eq!(tokens[4].value, "y");
    assert_eq!(tokens[4].span.start.line, 4);
}

#[test]
fn test_token_offsets() {
    let tokens = tokenize("a  := 10".to_string(), Some("test.pcl".to_string())).unwrap();

    assert_eq!(tokens[1].span.start.offset, 3);
    assert_eq!(tokens[1].span.end.offset, 5);
    assert_eq!(tokens[2].span.start.offset, 6);
}

#[test]
fn test_empty_source() {
    assert_eq!(kinds(""), vec![TokenKind::EOF]);
}

#[test]
fn test_unrecognised_token() {
    let result = tokenize("x := 1 $ 2".to_string(), Some("test.pcl".to_string()));

    let error = result.unwrap_err();
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().offset, 7);
}

#[test]
fn test_unterminated_comment() {
    let result = tokenize("x (* never closed".to_string(), None);
    assert_eq!(result.unwrap_err().get_error_name(), "UnterminatedComment");
}

#[test]
fn test_invalid_char_literal() {
    let result = tokenize("c := 'ab'".to_string(), None);
    assert_eq!(result.unwrap_err().get_error_name(), "InvalidCharLiteral");

    let result = tokenize(r"c := '\q'".to_string(), None);
    assert_eq!(result.unwrap_err().get_error_name(), "InvalidCharLiteral");
}

#[test]
fn test_default_file_name() {
    let tokens = tokenize("x".to_string(), None).unwrap();
    assert_eq!(tokens[0].span.start.file.as_str(), "<stdin>");
}
