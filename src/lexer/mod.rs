//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts PCL source code
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using anchored regex patterns
//! - Recognition of keywords, identifiers, literals, and operators
//! - Token position (offset and line) tracking for error reporting
//! - `(* ... *)` comments and whitespace handling

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
