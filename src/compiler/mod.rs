//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that transforms
//! the typed AST into an LLVM module. It handles:
//!
//! - Static storage for variables, value parameters and function results
//! - Routines, labels and the control flow between basic blocks
//! - Expressions, calls and heap allocation
//! - Declarations of the runtime library routines
//! - Verification, optimization and output for the host target

pub mod compiler;
pub mod expr;
pub mod stdlib;
pub mod stmt;
