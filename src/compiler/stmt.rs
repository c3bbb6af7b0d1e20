use inkwell::types::BasicType;
use tracing::debug;

use crate::{
    ast::types::Type,
    errors::errors::Error,
    type_checker::typed_ast::{TypedExpr, TypedExprKind, TypedStmt, TypedStmtKind},
};

use super::{
    compiler::Compiler,
    expr::{coerce, gen_address, gen_call, gen_expression},
};

/// Generates a sequence of statements in the current block.
pub fn gen_block<'a>(compiler: &mut Compiler<'a>, block: &[TypedStmt]) -> Result<(), Error> {
    for stmt in block.iter() {
        gen_statement(compiler, stmt)?;
    }

    Ok(())
}

/// Generates a statement.
///
/// The builder always ends up in an open block: after a jump, lowering
/// continues in a fresh block that nothing branches to.
pub fn gen_statement<'a>(compiler: &mut Compiler<'a>, stmt: &TypedStmt) -> Result<(), Error> {
    match &stmt.kind {
        TypedStmtKind::Empty => {}
        TypedStmtKind::Block(block) => gen_block(compiler, block)?,
        TypedStmtKind::Assign { target, value } => gen_assignment(compiler, target, value)?,
        TypedStmtKind::Call(call) => {
            gen_call(compiler, call)?;
        }
        TypedStmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            let condition = gen_expression(compiler, condition)?.into_int_value();

            let then_block = compiler.append_block("then")?;
            let end_block = compiler.append_block("endif")?;
            let else_block = match else_body {
                Some(_) => compiler.append_block("else")?,
                None => end_block,
            };

            compiler
                .builder
                .build_conditional_branch(condition, then_block, else_block)?;

            compiler.builder.position_at_end(then_block);
            gen_statement(compiler, then_body)?;
            compiler.branch_if_open(end_block)?;

            if let Some(else_body) = else_body {
                compiler.builder.position_at_end(else_block);
                gen_statement(compiler, else_body)?;
                compiler.branch_if_open(end_block)?;
            }

            compiler.builder.position_at_end(end_block);
        }
        TypedStmtKind::While { condition, body } => {
            let condition_block = compiler.append_block("while")?;
            let body_block = compiler.append_block("do")?;
            let end_block = compiler.append_block("endwhile")?;

            compiler.branch_if_open(condition_block)?;
            compiler.builder.position_at_end(condition_block);
            let condition = gen_expression(compiler, condition)?.into_int_value();
            compiler
                .builder
                .build_conditional_branch(condition, body_block, end_block)?;

            compiler.builder.position_at_end(body_block);
            gen_statement(compiler, body)?;
            compiler.branch_if_open(condition_block)?;

            compiler.builder.position_at_end(end_block);
        }
        TypedStmtKind::Labeled { label, body } => {
            let block = compiler.label_block(label)?;
            compiler.branch_if_open(block)?;
            compiler.builder.position_at_end(block);

            gen_statement(compiler, body)?;

            let next = compiler.append_block("next")?;
            compiler.branch_if_open(next)?;
            compiler.builder.position_at_end(next);
        }
        TypedStmtKind::Goto { label } => {
            let block = compiler.label_block(label)?;
            compiler.builder.build_unconditional_branch(block)?;
            compiler.open_continuation("after_goto")?;
        }
        TypedStmtKind::Return => {
            let return_block = compiler.current()?.return_block;
            compiler.builder.build_unconditional_branch(return_block)?;
            compiler.open_continuation("after_return")?;
        }
        TypedStmtKind::New { size, target } => gen_new(compiler, size.as_ref(), target)?,
        TypedStmtKind::Dispose { target, .. } => {
            // Evaluated once; the target may contain calls.
            let address = gen_address(compiler, target)?;
            let handle = compiler
                .builder
                .build_load(address, "handle")?
                .into_pointer_value();
            compiler.builder.build_free(handle)?;

            compiler
                .builder
                .build_store(address, handle.get_type().const_null())?;
        }
    }

    Ok(())
}

fn gen_assignment<'a>(
    compiler: &Compiler<'a>,
    target: &TypedExpr,
    value: &TypedExpr,
) -> Result<(), Error> {
    // A string literal stored into a char array is padded with NULs to the
    // array's length.
    if let (TypedExprKind::String(text), Type::ConstArray(length, element)) =
        (&value.kind, &target.ty)
    {
        if **element != Type::CHAR || text.len() >= *length as usize {
            return Err(Error::codegen(
                format!("string literal does not fit `{}`", target.ty),
                value.span.start.clone(),
            ));
        }

        let char_type = compiler.context.i8_type();
        let mut bytes = text
            .bytes()
            .map(|byte| char_type.const_int(byte as u64, false))
            .collect::<Vec<_>>();
        bytes.resize(*length as usize, char_type.const_zero());

        let address = gen_address(compiler, target)?;
        compiler
            .builder
            .build_store(address, char_type.const_array(&bytes))?;

        return Ok(());
    }

    let converted = gen_expression(compiler, value)?;
    let converted = coerce(compiler, converted, &value.ty, &target.ty)?;
    let address = gen_address(compiler, target)?;
    compiler.builder.build_store(address, converted)?;

    Ok(())
}

/// `new p` allocates one pointee, `new [n] p` an array of `n` elements.
fn gen_new<'a>(
    compiler: &Compiler<'a>,
    size: Option<&TypedExpr>,
    target: &TypedExpr,
) -> Result<(), Error> {
    let pointer_type = compiler.convert_type(&target.ty)?.into_pointer_type();
    let pointee = target.ty.pointee().ok_or_else(|| {
        Error::codegen(
            format!("cannot allocate through `{}`", target.ty),
            target.span.start.clone(),
        )
    })?;

    let handle = match size {
        Some(size) => {
            let element = pointee.element().ok_or_else(|| {
                Error::codegen(
                    format!("cannot allocate an array of `{}`", pointee),
                    target.span.start.clone(),
                )
            })?;
            let element_type = compiler.convert_type(element)?;
            let count = gen_expression(compiler, size)?.into_int_value();

            debug!("Allocating an array of {}", element);
            let elements = compiler
                .builder
                .build_array_malloc(element_type.as_basic_type_enum(), count, "new")?;
            compiler
                .builder
                .build_pointer_cast(elements, pointer_type, "")?
        }
        None => compiler
            .builder
            .build_malloc(compiler.convert_type(pointee)?, "new")?,
    };

    let address = gen_address(compiler, target)?;
    compiler.builder.build_store(address, handle)?;

    Ok(())
}
