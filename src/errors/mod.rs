//! Error types and error handling for the compiler.
//!
//! This module defines the diagnostics produced throughout the compilation
//! process. It includes:
//!
//! - Error structures with source position information
//! - Error variants grouped by phase (lexical, syntactic, semantic, internal)
//! - Warnings, which are reported but never abort compilation
//! - Helpful error messages and suggestions

pub mod errors;

#[cfg(test)]
mod tests;
