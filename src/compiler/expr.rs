use inkwell::{
    module::Linkage,
    types::BasicType,
    values::{BasicMetadataValueEnum, BasicValueEnum, PointerValue},
    AddressSpace, FloatPredicate, IntPredicate,
};

use crate::{
    ast::types::{ScalarType, Type},
    errors::errors::Error,
    lexer::tokens::TokenKind,
    type_checker::typed_ast::{TypedCall, TypedExpr, TypedExprKind},
    Position,
};

use super::{
    compiler::{Compiler, Storage},
    stdlib::get_runtime_function,
};

fn unexpected(expr: &TypedExpr, what: &str) -> Error {
    Error::codegen(
        format!("cannot lower {} of type `{}`", what, expr.ty),
        expr.span.start.clone(),
    )
}

/// Generates the value of an expression.
pub fn gen_expression<'a>(
    compiler: &Compiler<'a>,
    expr: &TypedExpr,
) -> Result<BasicValueEnum<'a>, Error> {
    Ok(match &expr.kind {
        TypedExprKind::Integer(value) => compiler
            .context
            .i32_type()
            .const_int(*value as u64, true)
            .into(),
        TypedExprKind::Real(value) => compiler.context.f64_type().const_float(*value).into(),
        TypedExprKind::Char(value) => compiler
            .context
            .i8_type()
            .const_int(*value as u64, false)
            .into(),
        TypedExprKind::Boolean(value) => compiler
            .context
            .bool_type()
            .const_int(*value as u64, false)
            .into(),
        TypedExprKind::Nil => compiler
            .context
            .i8_type()
            .ptr_type(AddressSpace::default())
            .const_null()
            .into(),
        TypedExprKind::String(_)
        | TypedExprKind::Variable { .. }
        | TypedExprKind::Index { .. }
        | TypedExprKind::Deref(_) => {
            let address = gen_address(compiler, expr)?;
            compiler.builder.build_load(address, "")?
        }
        TypedExprKind::AddressOf(operand) => gen_address(compiler, operand)?.into(),
        TypedExprKind::Prefix { operator, operand } => {
            gen_prefix(compiler, expr, operator, operand)?
        }
        TypedExprKind::Binary {
            left,
            operator,
            right,
        } => gen_binary(compiler, left, operator, right)?,
        TypedExprKind::Call(call) => gen_call(compiler, call)?
            .ok_or_else(|| unexpected(expr, "a procedure call as a value"))?,
    })
}

/// Generates the handle of an lvalue.
pub fn gen_address<'a>(
    compiler: &Compiler<'a>,
    expr: &TypedExpr,
) -> Result<PointerValue<'a>, Error> {
    match &expr.kind {
        TypedExprKind::Variable { storage, .. } => match compiler.storage(storage)? {
            Storage::Slot(slot) => Ok(slot),
            Storage::Reference(cell) => Ok(compiler
                .builder
                .build_load(cell, storage)?
                .into_pointer_value()),
        },
        TypedExprKind::String(value) => {
            let literal = compiler.context.const_string(value.as_bytes(), true);
            let global = compiler.module.add_global(literal.get_type(), None, ".str");
            global.set_linkage(Linkage::Private);
            global.set_initializer(&literal);

            Ok(global.as_pointer_value())
        }
        TypedExprKind::Index { array, index } => {
            let base = gen_address(compiler, array)?;
            let index = gen_expression(compiler, index)?.into_int_value();
            let zero = compiler.context.i32_type().const_zero();

            // The base points to an array, so step through it first.
            Ok(unsafe { compiler.builder.build_gep(base, &[zero, index], "index")? })
        }
        TypedExprKind::Deref(pointer) => Ok(gen_expression(compiler, pointer)?.into_pointer_value()),
        _ => Err(unexpected(expr, "the address of a value")),
    }
}

/// Converts `value` from type `from` to the type `to` it is used as.
pub fn coerce<'a>(
    compiler: &Compiler<'a>,
    value: BasicValueEnum<'a>,
    from: &Type,
    to: &Type,
) -> Result<BasicValueEnum<'a>, Error> {
    Ok(match (from, to) {
        (Type::Scalar(ScalarType::Integer), Type::Scalar(ScalarType::Real)) => compiler
            .builder
            .build_signed_int_to_float(value.into_int_value(), compiler.context.f64_type(), "")?
            .into(),
        (Type::Nil, Type::Pointer(_)) => compiler
            .convert_type(to)?
            .into_pointer_type()
            .const_null()
            .into(),
        (Type::Pointer(_), Type::Pointer(_)) if from != to => compiler
            .builder
            .build_pointer_cast(
                value.into_pointer_value(),
                compiler.convert_type(to)?.into_pointer_type(),
                "",
            )?
            .into(),
        _ => value,
    })
}

fn gen_prefix<'a>(
    compiler: &Compiler<'a>,
    expr: &TypedExpr,
    operator: &TokenKind,
    operand: &TypedExpr,
) -> Result<BasicValueEnum<'a>, Error> {
    let value = gen_expression(compiler, operand)?;

    Ok(match (operator, &operand.ty) {
        (TokenKind::Not, _) => compiler
            .builder
            .build_not(value.into_int_value(), "")?
            .into(),
        (TokenKind::Plus, _) => value,
        (TokenKind::Dash, Type::Scalar(ScalarType::Real)) => compiler
            .builder
            .build_float_neg(value.into_float_value(), "")?
            .into(),
        (TokenKind::Dash, Type::Scalar(ScalarType::Integer)) => compiler
            .builder
            .build_int_neg(value.into_int_value(), "")?
            .into(),
        _ => return Err(unexpected(expr, "a prefix operation")),
    })
}

fn gen_binary<'a>(
    compiler: &Compiler<'a>,
    left: &TypedExpr,
    operator: &TokenKind,
    right: &TypedExpr,
) -> Result<BasicValueEnum<'a>, Error> {
    let left_value = gen_expression(compiler, left)?;
    let right_value = gen_expression(compiler, right)?;
    let builder = &compiler.builder;

    match operator {
        TokenKind::And => {
            return Ok(builder
                .build_and(left_value.into_int_value(), right_value.into_int_value(), "")?
                .into())
        }
        TokenKind::Or => {
            return Ok(builder
                .build_or(left_value.into_int_value(), right_value.into_int_value(), "")?
                .into())
        }
        _ => {}
    }

    // Pointers compare by address.
    if left.ty.is_pointer_like() && right.ty.is_pointer_like() {
        let predicate = match operator {
            TokenKind::Equals => IntPredicate::EQ,
            TokenKind::NotEquals => IntPredicate::NE,
            _ => return Err(unexpected(left, "a pointer comparison")),
        };
        let address_type = compiler.context.i64_type();
        let left_address =
            builder.build_ptr_to_int(left_value.into_pointer_value(), address_type, "")?;
        let right_address =
            builder.build_ptr_to_int(right_value.into_pointer_value(), address_type, "")?;

        return Ok(builder
            .build_int_compare(predicate, left_address, right_address, "")?
            .into());
    }

    let is_real = left.ty == Type::REAL || right.ty == Type::REAL || *operator == TokenKind::Slash;
    if is_real {
        let left_value = coerce(compiler, left_value, &left.ty, &Type::REAL)?.into_float_value();
        let right_value = coerce(compiler, right_value, &right.ty, &Type::REAL)?.into_float_value();

        let compare = |predicate| -> Result<BasicValueEnum<'a>, Error> {
            Ok(builder
                .build_float_compare(predicate, left_value, right_value, "")?
                .into())
        };

        return match operator {
            TokenKind::Plus => Ok(builder.build_float_add(left_value, right_value, "")?.into()),
            TokenKind::Dash => Ok(builder.build_float_sub(left_value, right_value, "")?.into()),
            TokenKind::Star => Ok(builder.build_float_mul(left_value, right_value, "")?.into()),
            TokenKind::Slash => Ok(builder.build_float_div(left_value, right_value, "")?.into()),
            TokenKind::Equals => compare(FloatPredicate::OEQ),
            TokenKind::NotEquals => compare(FloatPredicate::UNE),
            TokenKind::Less => compare(FloatPredicate::OLT),
            TokenKind::LessEquals => compare(FloatPredicate::OLE),
            TokenKind::Greater => compare(FloatPredicate::OGT),
            TokenKind::GreaterEquals => compare(FloatPredicate::OGE),
            _ => Err(unexpected(left, "a real operation")),
        };
    }

    // Integers, chars and booleans.
    let left_value = left_value.into_int_value();
    let right_value = right_value.into_int_value();
    let compare = |predicate| -> Result<BasicValueEnum<'a>, Error> {
        Ok(builder
            .build_int_compare(predicate, left_value, right_value, "")?
            .into())
    };

    match operator {
        TokenKind::Plus => Ok(builder.build_int_add(left_value, right_value, "")?.into()),
        TokenKind::Dash => Ok(builder.build_int_sub(left_value, right_value, "")?.into()),
        TokenKind::Star => Ok(builder.build_int_mul(left_value, right_value, "")?.into()),
        TokenKind::Div => Ok(builder
            .build_int_signed_div(left_value, right_value, "")?
            .into()),
        TokenKind::Mod => Ok(builder
            .build_int_signed_rem(left_value, right_value, "")?
            .into()),
        TokenKind::Equals => compare(IntPredicate::EQ),
        TokenKind::NotEquals => compare(IntPredicate::NE),
        TokenKind::Less => compare(IntPredicate::SLT),
        TokenKind::LessEquals => compare(IntPredicate::SLE),
        TokenKind::Greater => compare(IntPredicate::SGT),
        TokenKind::GreaterEquals => compare(IntPredicate::SGE),
        _ => Err(unexpected(left, "an integer operation")),
    }
}

/// Generates a call and returns its value, `None` for procedures.
///
/// Reference formals and string literals forward their handle, cast to the
/// declared parameter type when the static shapes differ. Value formals
/// forward the coerced value.
pub fn gen_call<'a>(
    compiler: &Compiler<'a>,
    call: &TypedCall,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let function = if call.is_external {
        get_runtime_function(compiler, call)?
    } else {
        compiler.module.get_function(&call.storage).ok_or_else(|| {
            Error::codegen(
                format!("routine `{}` has no prototype", call.name),
                Position::null(),
            )
        })?
    };

    let mut arguments: Vec<BasicMetadataValueEnum> = vec![];
    for (argument, formal) in call.arguments.iter().zip(call.formals.iter()) {
        let expected = compiler.formal_type(formal, call.is_external)?;

        let value: BasicValueEnum = if formal.by_reference
            || matches!(argument.kind, TypedExprKind::String(_))
        {
            let handle = gen_address(compiler, argument)?;
            let expected = expected.into_pointer_type();
            if handle.get_type() != expected {
                compiler
                    .builder
                    .build_pointer_cast(handle, expected, "")?
                    .into()
            } else {
                handle.into()
            }
        } else {
            let value = gen_expression(compiler, argument)?;
            coerce(compiler, value, &argument.ty, &formal.ty)?
        };

        if value.get_type() != expected.as_basic_type_enum() {
            return Err(unexpected(argument, "an argument"));
        }
        arguments.push(value.into());
    }

    let call_site = compiler.builder.build_call(function, &arguments, "")?;

    Ok(call_site.try_as_basic_value().left())
}
