//! Declarations of the runtime library routines.
//!
//! The builtins are implemented outside of the compiled module. A routine is
//! declared with external linkage the first time a call to it is lowered, so
//! modules only reference what they use.

use inkwell::{module::Linkage, values::FunctionValue};
use tracing::debug;

use crate::{errors::errors::Error, type_checker::typed_ast::TypedCall};

use super::compiler::Compiler;

/// Returns the declaration of the runtime routine called by `call`, adding it
/// to the module if needed.
pub fn get_runtime_function<'a>(
    compiler: &Compiler<'a>,
    call: &TypedCall,
) -> Result<FunctionValue<'a>, Error> {
    if let Some(function) = compiler.module.get_function(&call.storage) {
        return Ok(function);
    }

    let function_type = compiler.function_type(&call.formals, call.return_type.as_ref(), true)?;
    debug!("Declaring runtime routine {}", call.storage);

    Ok(compiler
        .module
        .add_function(&call.storage, function_type, Some(Linkage::External)))
}

/// The names of the runtime routines the module calls.
pub fn declared_runtime_functions(compiler: &Compiler) -> Vec<String> {
    compiler
        .module
        .get_functions()
        .filter(|function| function.count_basic_blocks() == 0)
        .filter(|function| !matches!(function.get_name().to_bytes(), b"malloc" | b"free"))
        .map(|function| function.get_name().to_string_lossy().into_owned())
        .collect()
}
