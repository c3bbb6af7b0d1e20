//! Type checking and semantic analysis module.
//!
//! This module performs type checking and semantic analysis on the AST.
//! It transforms the untyped AST into a typed AST while:
//!
//! - Verifying type correctness of expressions and statements
//! - Resolving every name to a unique storage symbol
//! - Checking routine signatures, forward declarations and arguments
//! - Managing scopes, labels and the builtin routines
//! - Warning about variables and results that may be read before being set
//!
//! Independent errors are accumulated so that one run reports all of them.

pub mod dataflow;
pub mod stdlib;
pub mod symbol_table;
pub mod type_checker;
pub mod typed_ast;

#[cfg(test)]
mod tests;
