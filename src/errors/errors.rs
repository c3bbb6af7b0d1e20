use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    /// Shorthand for an internal code generation failure.
    pub fn codegen(message: impl Into<String>, position: Position) -> Self {
        Error::new(
            ErrorImpl::Codegen {
                message: message.into(),
            },
            position,
        )
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::InvalidCharLiteral { .. } => "InvalidCharLiteral",
            ErrorImpl::UnterminatedComment => "UnterminatedComment",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::AddressOfNonLValue => "AddressOfNonLValue",
            ErrorImpl::ExpectedLValue { .. } => "ExpectedLValue",
            ErrorImpl::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            ErrorImpl::UnknownIdentifier { .. } => "UnknownIdentifier",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::ArityMismatch { .. } => "ArityMismatch",
            ErrorImpl::InvalidDereference { .. } => "InvalidDereference",
            ErrorImpl::InvalidNew { .. } => "InvalidNew",
            ErrorImpl::InvalidDispose { .. } => "InvalidDispose",
            ErrorImpl::MissingForwardDeclaration { .. } => "MissingForwardDeclaration",
            ErrorImpl::IllegalArrayByValue { .. } => "IllegalArrayByValue",
            ErrorImpl::ForwardSignatureMismatch { .. } => "ForwardSignatureMismatch",
            ErrorImpl::UndefinedForward { .. } => "UndefinedForward",
            ErrorImpl::IllegalType { .. } => "IllegalType",
            ErrorImpl::LabelNotPlaced { .. } => "LabelNotPlaced",
            ErrorImpl::NonLValueByReference { .. } => "NonLValueByReference",
            ErrorImpl::ScopeUnderflow => "ScopeUnderflow",
            ErrorImpl::Codegen { .. } => "Codegen",
        }
    }

    /// The diagnostic class reported to the user.
    pub fn get_error_class(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::InvalidCharLiteral { .. }
            | ErrorImpl::UnterminatedComment
            | ErrorImpl::NumberParseError { .. } => "LexError",
            ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::AddressOfNonLValue
            | ErrorImpl::ExpectedLValue { .. } => "ParseError",
            ErrorImpl::ScopeUnderflow | ErrorImpl::Codegen { .. } => "CodegenError",
            _ => "SemanticError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::InvalidCharLiteral { token } => ErrorTip::Suggestion(format!(
                "Invalid character literal `{}`, only one character or escape is allowed",
                token
            )),
            ErrorImpl::UnterminatedComment => {
                ErrorTip::Suggestion(String::from("Comment opened with `(*` is never closed"))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::AddressOfNonLValue => ErrorTip::Suggestion(String::from(
                "`@` can only be applied to a variable, an array element or a dereference",
            )),
            ErrorImpl::ExpectedLValue { context } => {
                ErrorTip::Suggestion(format!("Expected an assignable expression {}", context))
            }
            ErrorImpl::DuplicateDeclaration { name } => {
                ErrorTip::Suggestion(format!("`{}` is already declared in this scope", name))
            }
            ErrorImpl::UnknownIdentifier { name } => {
                ErrorTip::Suggestion(format!("Unknown identifier `{}`", name))
            }
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ArityMismatch {
                routine,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` expects {} arguments, received {}",
                routine, expected, received
            )),
            ErrorImpl::InvalidDereference { received } => ErrorTip::Suggestion(format!(
                "Only pointers can be dereferenced, received `{}`",
                received
            )),
            ErrorImpl::InvalidNew { message } => {
                ErrorTip::Suggestion(format!("Invalid `new`: {}", message))
            }
            ErrorImpl::InvalidDispose { message } => {
                ErrorTip::Suggestion(format!("Invalid `dispose`: {}", message))
            }
            ErrorImpl::MissingForwardDeclaration { routine } => ErrorTip::Suggestion(format!(
                "`{}` calls itself, add `forward` before its definition",
                routine
            )),
            ErrorImpl::IllegalArrayByValue { formal } => ErrorTip::Suggestion(format!(
                "Array parameter `{}` must be passed with `var`",
                formal
            )),
            ErrorImpl::ForwardSignatureMismatch { routine } => ErrorTip::Suggestion(format!(
                "Definition of `{}` does not match its forward declaration",
                routine
            )),
            ErrorImpl::UndefinedForward { routine } => ErrorTip::Suggestion(format!(
                "`{}` is declared `forward` but never defined",
                routine
            )),
            ErrorImpl::IllegalType { type_, reason } => {
                ErrorTip::Suggestion(format!("Type `{}` cannot be used {}", type_, reason))
            }
            ErrorImpl::LabelNotPlaced { label } => ErrorTip::Suggestion(format!(
                "Label `{}` is targeted by `goto` but never placed",
                label
            )),
            ErrorImpl::NonLValueByReference { formal } => ErrorTip::Suggestion(format!(
                "Argument for `var` parameter `{}` must be assignable",
                formal
            )),
            ErrorImpl::ScopeUnderflow => {
                ErrorTip::Suggestion(String::from("Tried to close a scope that was never opened"))
            }
            ErrorImpl::Codegen { message } => ErrorTip::Suggestion(message.clone()),
        }
    }
}

impl From<BuilderError> for Error {
    fn from(error: BuilderError) -> Self {
        Error::codegen(error.to_string(), Position::null())
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("invalid character literal: {token:?}")]
    InvalidCharLiteral { token: String },
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },

    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("address-of applied to a non-lvalue")]
    AddressOfNonLValue,
    #[error("expected lvalue {context}")]
    ExpectedLValue { context: String },

    #[error("{name:?} already declared")]
    DuplicateDeclaration { name: String },
    #[error("unknown identifier {name:?}")]
    UnknownIdentifier { name: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMismatch { expected: String, received: String },
    #[error("{routine:?} expects {expected} arguments, received {received}")]
    ArityMismatch {
        routine: String,
        expected: usize,
        received: usize,
    },
    #[error("cannot dereference {received}")]
    InvalidDereference { received: String },
    #[error("invalid new: {message}")]
    InvalidNew { message: String },
    #[error("invalid dispose: {message}")]
    InvalidDispose { message: String },
    #[error("recursive call to {routine:?} without a forward declaration")]
    MissingForwardDeclaration { routine: String },
    #[error("array parameter {formal:?} passed by value")]
    IllegalArrayByValue { formal: String },
    #[error("definition of {routine:?} does not match its forward declaration")]
    ForwardSignatureMismatch { routine: String },
    #[error("forward declaration of {routine:?} is never defined")]
    UndefinedForward { routine: String },
    #[error("illegal type {type_} {reason}")]
    IllegalType { type_: String, reason: String },
    #[error("label {label:?} is never placed")]
    LabelNotPlaced { label: String },
    #[error("non-lvalue passed to by-reference parameter {formal:?}")]
    NonLValueByReference { formal: String },

    #[error("tried to pop nonexistent scope")]
    ScopeUnderflow,
    #[error("code generation failed: {message}")]
    Codegen { message: String },
}

/// A diagnostic that never aborts compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    internal_warning: WarningImpl,
    position: Position,
}

impl Warning {
    pub fn new(warning_impl: WarningImpl, position: Position) -> Self {
        Warning {
            internal_warning: warning_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_warning(&self) -> &WarningImpl {
        &self.internal_warning
    }

    pub fn get_warning_name(&self) -> &str {
        match &self.internal_warning {
            WarningImpl::UnsetResult { .. } => "UnsetResult",
            WarningImpl::UsedBeforeSet { .. } => "UsedBeforeSet",
            WarningImpl::UnreferencedLabel { .. } => "UnreferencedLabel",
            WarningImpl::RecursiveStaticStorage { .. } => "RecursiveStaticStorage",
        }
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_warning)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WarningImpl {
    #[error("result of function {function:?} may be returned without being set")]
    UnsetResult { function: String },
    #[error("variable {variable:?} may be used before being set")]
    UsedBeforeSet { variable: String },
    #[error("label {label:?} is declared but never used")]
    UnreferencedLabel { label: String },
    #[error("recursive call to {routine:?} shares the caller's local storage")]
    RecursiveStaticStorage { routine: String },
}
