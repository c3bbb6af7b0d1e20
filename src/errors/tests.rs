//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip, Warning, WarningImpl};
use crate::Position;
use std::rc::Rc;

fn position(offset: u32, line: u32) -> Position {
    Position::new(offset, line, Rc::new("test.pcl".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        position(10, 1),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_error_class(), "LexError");
}

#[test]
fn test_error_position() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "begin".to_string(),
        },
        position(42, 3),
    );

    assert_eq!(error.get_position().offset, 42);
    assert_eq!(error.get_position().line, 3);
    assert_eq!(error.get_position().file.as_str(), "test.pcl");
}

#[test]
fn test_error_classes() {
    let parse = Error::new(ErrorImpl::AddressOfNonLValue, position(0, 1));
    assert_eq!(parse.get_error_class(), "ParseError");

    let semantic = Error::new(
        ErrorImpl::ArityMismatch {
            routine: "f".to_string(),
            expected: 2,
            received: 1,
        },
        position(0, 1),
    );
    assert_eq!(semantic.get_error_class(), "SemanticError");

    let internal = Error::codegen("bad shape", Position::null());
    assert_eq!(internal.get_error_class(), "CodegenError");
    assert_eq!(internal.get_error_name(), "Codegen");
}

#[test]
fn test_type_mismatch_tip() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            expected: "integer".to_string(),
            received: "real".to_string(),
        },
        position(5, 2),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(msg) => {
            assert!(msg.contains("integer"));
            assert!(msg.contains("real"));
        }
        ErrorTip::None => panic!("Expected suggestion"),
    }
}

#[test]
fn test_unrecognised_token_has_no_tip() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "{".to_string(),
        },
        position(0, 1),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
    assert_eq!(format!("{}", error.get_tip()), "");
}

#[test]
fn test_error_display() {
    let error_impl = ErrorImpl::MissingForwardDeclaration {
        routine: "fact".to_string(),
    };

    assert_eq!(
        format!("{}", error_impl),
        "recursive call to \"fact\" without a forward declaration"
    );
}

#[test]
fn test_warning() {
    let warning = Warning::new(
        WarningImpl::UnsetResult {
            function: "f".to_string(),
        },
        position(30, 4),
    );

    assert_eq!(warning.get_warning_name(), "UnsetResult");
    assert_eq!(warning.get_position().line, 4);
    assert!(warning.to_string().contains("\"f\""));
}
