/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Program, body and declaration nodes
/// - expressions: The closed set of expression variants
/// - statements: The closed set of statement variants
/// - types: The structural PCL type system
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
