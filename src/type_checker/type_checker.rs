use std::collections::HashSet;

use tracing::debug;

use crate::{
    ast::{
        ast::{Body, Header, Local, Program, RoutineDecl},
        expressions::{CallExpr, Expr, ExprKind},
        statements::{BlockStmt, Stmt, StmtKind},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl, Warning, WarningImpl},
    lexer::tokens::{Token, TokenKind},
    Position,
};

use super::{
    dataflow::check_body,
    stdlib::declare_builtins,
    symbol_table::{forward_name, NameKind, SymbolEntry, SymbolTable},
    typed_ast::{
        TypedBody, TypedCall, TypedDecl, TypedExpr, TypedExprKind, TypedFormal, TypedHeader,
        TypedProgram, TypedRoutine, TypedStmt, TypedStmtKind,
    },
};

/// Labels placed and targeted in one body.
#[derive(Debug, Default)]
struct LabelFrame {
    placed: HashSet<String>,
    targeted: Vec<(String, Position)>,
}

#[derive(Debug)]
pub struct TypeChecker {
    pub symbol_table: SymbolTable,
    pub warnings: Vec<Warning>,
    pub errors: Vec<Error>,
    /// Program name followed by the names of the enclosing routines.
    pub path: Vec<String>,
    pub fail_fast: bool,
    label_frames: Vec<LabelFrame>,
}

impl TypeChecker {
    pub fn new(fail_fast: bool) -> Self {
        let mut symbol_table = SymbolTable::new();
        symbol_table.open_scope(None);
        let errors = match declare_builtins(&mut symbol_table) {
            Ok(()) => vec![],
            Err(error) => vec![error],
        };

        TypeChecker {
            symbol_table,
            warnings: vec![],
            errors,
            path: vec![],
            fail_fast,
            label_frames: vec![],
        }
    }

    /// Unique symbol for `name` declared at the current nesting.
    pub fn storage_name(&self, name: &str) -> String {
        format!("{}.{}", self.path.join("."), name)
    }

    /// Records `error`, or hands it back when failing fast.
    pub fn report(&mut self, error: Error) -> Result<(), Error> {
        if self.fail_fast {
            return Err(error);
        }

        self.errors.push(error);
        Ok(())
    }

    pub fn warn(&mut self, warning: WarningImpl, position: Position) {
        self.warnings.push(Warning::new(warning, position));
    }

    pub fn open_scope(&mut self, tag: Option<String>) {
        self.symbol_table.open_scope(tag);
        self.label_frames.push(LabelFrame::default());
    }

    /// Closes the innermost scope and reports what can only be seen once
    /// the whole body is known.
    pub fn close_scope(&mut self) -> Result<(), Error> {
        let scope = self.symbol_table.close_scope()?;
        let frame = self.label_frames.pop().unwrap_or_default();

        for entry in scope.entries() {
            match entry.kind {
                NameKind::Label if entry.queries == 0 => self.warn(
                    WarningImpl::UnreferencedLabel {
                        label: entry.name.clone(),
                    },
                    entry.position.clone(),
                ),
                NameKind::ForwardDecl => {
                    let routine = entry.name.strip_prefix("forward_").unwrap_or(&entry.name);
                    if !scope.contains(routine) {
                        self.report(Error::new(
                            ErrorImpl::UndefinedForward {
                                routine: routine.to_string(),
                            },
                            entry.position.clone(),
                        ))?;
                    }
                }
                _ => {}
            }
        }

        let mut reported = HashSet::new();
        for (label, position) in frame.targeted {
            if !frame.placed.contains(&label) && reported.insert(label.clone()) {
                self.report(Error::new(ErrorImpl::LabelNotPlaced { label }, position))?;
            }
        }

        Ok(())
    }

    fn label_frame(&mut self) -> Result<&mut LabelFrame, Error> {
        self.label_frames
            .last_mut()
            .ok_or_else(|| Error::new(ErrorImpl::ScopeUnderflow, Position::null()))
    }
}

fn type_mismatch(expected: impl ToString, received: &Type, position: &Position) -> Error {
    Error::new(
        ErrorImpl::TypeMismatch {
            expected: expected.to_string(),
            received: received.to_string(),
        },
        position.clone(),
    )
}

fn expect_type(expr: &TypedExpr, expected: &Type) -> Result<(), Error> {
    if expr.ty == *expected {
        Ok(())
    } else {
        Err(type_mismatch(expected, &expr.ty, &expr.span.start))
    }
}

fn expect_arithmetic(expr: &TypedExpr) -> Result<(), Error> {
    if expr.ty.is_arithmetic() {
        Ok(())
    } else {
        Err(type_mismatch("integer or real", &expr.ty, &expr.span.start))
    }
}

fn illegal_type(ty: &Type, reason: &str, position: &Position) -> Error {
    Error::new(
        ErrorImpl::IllegalType {
            type_: ty.to_string(),
            reason: reason.to_string(),
        },
        position.clone(),
    )
}

fn require_complete(ty: &Type, reason: &str, position: &Position) -> Result<(), Error> {
    if ty.is_complete() {
        Ok(())
    } else {
        Err(illegal_type(ty, reason, position))
    }
}

/// Array elements must have a known size and array lengths must be positive.
fn check_type(ty: &Type, position: &Position) -> Result<(), Error> {
    match ty {
        Type::ConstArray(0, _) => Err(illegal_type(ty, "with length zero", position)),
        Type::ConstArray(_, element) | Type::VarArray(element) => {
            require_complete(element, "as an array element", position)?;
            check_type(element, position)
        }
        Type::Pointer(pointee) => check_type(pointee, position),
        _ => Ok(()),
    }
}

pub fn type_check_expr(type_checker: &mut TypeChecker, expr: &Expr) -> Result<TypedExpr, Error> {
    let position = &expr.span.start;

    let (kind, ty) = match &expr.kind {
        ExprKind::Integer(value) => (TypedExprKind::Integer(*value), Type::INTEGER),
        ExprKind::Real(value) => (TypedExprKind::Real(*value), Type::REAL),
        ExprKind::Char(value) => (TypedExprKind::Char(*value), Type::CHAR),
        ExprKind::Boolean(value) => (TypedExprKind::Boolean(*value), Type::BOOLEAN),
        ExprKind::Nil => (TypedExprKind::Nil, Type::Nil),
        ExprKind::String(value) => (TypedExprKind::String(value.clone()), Type::string(value.len())),
        ExprKind::Symbol(name) => {
            let entry = type_checker.symbol_table.lookup(name, false, position)?;

            if !matches!(entry.kind, NameKind::Variable | NameKind::Formal) {
                return Err(type_mismatch("a variable", &entry.ty, position));
            }

            (
                TypedExprKind::Variable {
                    name: name.clone(),
                    storage: entry.storage,
                    by_reference: entry.by_reference,
                },
                entry.ty,
            )
        }
        ExprKind::Result => {
            let entry = type_checker.symbol_table.lookup("result", true, position)?;

            (
                TypedExprKind::Variable {
                    name: String::from("result"),
                    storage: entry.storage,
                    by_reference: false,
                },
                entry.ty,
            )
        }
        ExprKind::Index { array, index } => {
            let array = type_check_expr(type_checker, array)?;
            let index = type_check_expr(type_checker, index)?;

            let Some(element) = array.ty.element().cloned() else {
                return Err(type_mismatch("an array", &array.ty, &array.span.start));
            };
            expect_type(&index, &Type::INTEGER)?;

            (
                TypedExprKind::Index {
                    array: Box::new(array),
                    index: Box::new(index),
                },
                element,
            )
        }
        ExprKind::Deref(operand) => {
            let operand = type_check_expr(type_checker, operand)?;

            let Some(pointee) = operand.ty.pointee().cloned() else {
                return Err(Error::new(
                    ErrorImpl::InvalidDereference {
                        received: operand.ty.to_string(),
                    },
                    operand.span.start.clone(),
                ));
            };

            (TypedExprKind::Deref(Box::new(operand)), pointee)
        }
        ExprKind::AddressOf(operand) => {
            let operand = type_check_expr(type_checker, operand)?;
            let ty = Type::pointer(operand.ty.clone());

            (TypedExprKind::AddressOf(Box::new(operand)), ty)
        }
        ExprKind::Prefix { operator, operand } => {
            let operand = type_check_expr(type_checker, operand)?;

            let ty = if operator.kind == TokenKind::Not {
                expect_type(&operand, &Type::BOOLEAN)?;
                Type::BOOLEAN
            } else {
                expect_arithmetic(&operand)?;
                operand.ty.clone()
            };

            (
                TypedExprKind::Prefix {
                    operator: operator.kind,
                    operand: Box::new(operand),
                },
                ty,
            )
        }
        ExprKind::Binary {
            left,
            operator,
            right,
        } => type_check_binary(type_checker, left, operator, right)?,
        ExprKind::Call(call) => {
            let call = type_check_call(type_checker, call)?;

            let Some(ty) = call.return_type.clone() else {
                return Err(type_mismatch("a function", &Type::Procedure, position));
            };

            (TypedExprKind::Call(call), ty)
        }
    };

    Ok(TypedExpr::new(kind, ty, expr.span.clone()))
}

fn type_check_binary(
    type_checker: &mut TypeChecker,
    left: &Expr,
    operator: &Token,
    right: &Expr,
) -> Result<(TypedExprKind, Type), Error> {
    let left = type_check_expr(type_checker, left)?;
    let right = type_check_expr(type_checker, right)?;

    let ty = match operator.kind {
        TokenKind::Plus | TokenKind::Dash | TokenKind::Star => {
            expect_arithmetic(&left)?;
            expect_arithmetic(&right)?;
            left.ty.arithmetic_result(&right.ty).unwrap_or(Type::INTEGER)
        }
        TokenKind::Slash => {
            expect_arithmetic(&left)?;
            expect_arithmetic(&right)?;
            Type::REAL
        }
        TokenKind::Div | TokenKind::Mod => {
            expect_type(&left, &Type::INTEGER)?;
            expect_type(&right, &Type::INTEGER)?;
            Type::INTEGER
        }
        TokenKind::And | TokenKind::Or => {
            expect_type(&left, &Type::BOOLEAN)?;
            expect_type(&right, &Type::BOOLEAN)?;
            Type::BOOLEAN
        }
        TokenKind::Less | TokenKind::LessEquals | TokenKind::Greater | TokenKind::GreaterEquals => {
            expect_arithmetic(&left)?;
            expect_arithmetic(&right)?;
            Type::BOOLEAN
        }
        TokenKind::Equals | TokenKind::NotEquals => {
            if !left.ty.is_equality_comparable_with(&right.ty) {
                return Err(type_mismatch(&left.ty, &right.ty, &right.span.start));
            }
            Type::BOOLEAN
        }
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator.value.clone(),
                },
                operator.span.start.clone(),
            ))
        }
    };

    Ok((
        TypedExprKind::Binary {
            left: Box::new(left),
            operator: operator.kind,
            right: Box::new(right),
        },
        ty,
    ))
}

pub fn type_check_call(type_checker: &mut TypeChecker, call: &CallExpr) -> Result<TypedCall, Error> {
    let position = &call.span.start;

    type_checker
        .symbol_table
        .requires_forward(&call.callee, position)?;

    let entry = match type_checker.symbol_table.lookup(&call.callee, false, position) {
        Ok(entry) if entry.is_routine() => entry,
        Ok(entry) => return Err(type_mismatch("a procedure or function", &entry.ty, position)),
        Err(error) => type_checker
            .symbol_table
            .lookup(&forward_name(&call.callee), false, position)
            .map_err(|_| error)?,
    };

    if type_checker.symbol_table.is_open_routine(&call.callee) {
        type_checker.warn(
            WarningImpl::RecursiveStaticStorage {
                routine: call.callee.clone(),
            },
            position.clone(),
        );
    }

    let formals = type_checker.symbol_table.formals_of(&entry.storage).to_vec();

    if formals.len() != call.arguments.len() {
        return Err(Error::new(
            ErrorImpl::ArityMismatch {
                routine: call.callee.clone(),
                expected: formals.len(),
                received: call.arguments.len(),
            },
            position.clone(),
        ));
    }

    let mut arguments = vec![];
    let mut typed_formals = vec![];

    for ((name, formal), argument) in formals.into_iter().zip(call.arguments.iter()) {
        let argument = type_check_expr(type_checker, argument)?;

        if formal.by_reference {
            if !argument.is_lvalue() {
                return Err(Error::new(
                    ErrorImpl::NonLValueByReference { formal: name },
                    argument.span.start.clone(),
                ));
            }

            if !argument.ty.is_reference_compatible_with(&formal.ty) {
                return Err(type_mismatch(&formal.ty, &argument.ty, &argument.span.start));
            }
        } else if !argument.ty.is_compatible_with(&formal.ty) {
            return Err(type_mismatch(&formal.ty, &argument.ty, &argument.span.start));
        }

        arguments.push(argument);
        typed_formals.push(TypedFormal {
            name,
            storage: formal.storage,
            ty: formal.ty,
            by_reference: formal.by_reference,
        });
    }

    Ok(TypedCall {
        name: call.callee.clone(),
        storage: entry.storage.clone(),
        formals: typed_formals,
        arguments,
        return_type: entry.return_type(),
        is_external: entry.external,
    })
}

fn type_check_condition(type_checker: &mut TypeChecker, condition: &Expr) -> Result<TypedExpr, Error> {
    let condition = type_check_expr(type_checker, condition)?;
    expect_type(&condition, &Type::BOOLEAN)?;
    Ok(condition)
}

fn lookup_label(type_checker: &mut TypeChecker, label: &str, position: &Position) -> Result<(), Error> {
    let entry = type_checker.symbol_table.lookup(label, true, position)?;

    if entry.kind != NameKind::Label {
        return Err(type_mismatch("a label", &entry.ty, position));
    }

    Ok(())
}

pub fn type_check_stmt(type_checker: &mut TypeChecker, stmt: &Stmt) -> Result<TypedStmt, Error> {
    let position = &stmt.span.start;

    let kind = match &stmt.kind {
        StmtKind::Empty => TypedStmtKind::Empty,
        StmtKind::Block(block) => TypedStmtKind::Block(type_check_block(type_checker, block)?),
        StmtKind::Assign { target, value } => {
            let target = type_check_expr(type_checker, target)?;
            let value = type_check_expr(type_checker, value)?;

            if matches!(target.kind, TypedExprKind::String(_)) || matches!(target.ty, Type::VarArray(_)) {
                return Err(illegal_type(&target.ty, "as the target of an assignment", position));
            }

            // A string literal fills a char array that has room for it.
            let string_fits = match (&value.kind, &value.ty, &target.ty) {
                (TypedExprKind::String(_), Type::ConstArray(length, _), Type::ConstArray(capacity, element)) => {
                    length <= capacity && **element == Type::CHAR
                }
                _ => false,
            };

            if !string_fits && !value.ty.is_compatible_with(&target.ty) {
                return Err(type_mismatch(&target.ty, &value.ty, &value.span.start));
            }

            TypedStmtKind::Assign { target, value }
        }
        StmtKind::Call(call) => TypedStmtKind::Call(type_check_call(type_checker, call)?),
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            let condition = type_check_condition(type_checker, condition)?;
            let then_body = Box::new(type_check_stmt(type_checker, then_body)?);
            let else_body = match else_body {
                Some(else_body) => Some(Box::new(type_check_stmt(type_checker, else_body)?)),
                None => None,
            };

            TypedStmtKind::If {
                condition,
                then_body,
                else_body,
            }
        }
        StmtKind::While { condition, body } => TypedStmtKind::While {
            condition: type_check_condition(type_checker, condition)?,
            body: Box::new(type_check_stmt(type_checker, body)?),
        },
        StmtKind::Labeled { label, body } => {
            lookup_label(type_checker, label, position)?;

            if !type_checker.label_frame()?.placed.insert(label.clone()) {
                return Err(Error::new(
                    ErrorImpl::DuplicateDeclaration {
                        name: label.clone(),
                    },
                    position.clone(),
                ));
            }

            TypedStmtKind::Labeled {
                label: label.clone(),
                body: Box::new(type_check_stmt(type_checker, body)?),
            }
        }
        StmtKind::Goto { label } => {
            lookup_label(type_checker, label, position)?;
            type_checker
                .label_frame()?
                .targeted
                .push((label.clone(), position.clone()));

            TypedStmtKind::Goto {
                label: label.clone(),
            }
        }
        StmtKind::Return => TypedStmtKind::Return,
        StmtKind::New { size, target } => {
            let target = type_check_expr(type_checker, target)?;
            let invalid = |message: String| Error::new(ErrorImpl::InvalidNew { message }, position.clone());

            let Some(pointee) = target.ty.pointee() else {
                return Err(invalid(format!("`{}` is not a pointer", target.ty)));
            };

            let size = match size {
                Some(size) => {
                    if !matches!(pointee, Type::VarArray(_)) {
                        return Err(invalid(format!(
                            "`new [n]` needs a pointer to `array of ...`, found `{}`",
                            target.ty
                        )));
                    }

                    let size = type_check_expr(type_checker, size)?;
                    if size.ty != Type::INTEGER {
                        return Err(invalid(format!("array size must be integer, found `{}`", size.ty)));
                    }
                    Some(size)
                }
                None => {
                    if !pointee.is_complete() {
                        return Err(invalid(format!("`{}` has no known size, use `new [n]`", pointee)));
                    }
                    None
                }
            };

            TypedStmtKind::New { size, target }
        }
        StmtKind::Dispose { is_array, target } => {
            let target = type_check_expr(type_checker, target)?;
            let invalid = |message: String| Error::new(ErrorImpl::InvalidDispose { message }, position.clone());

            let Some(pointee) = target.ty.pointee() else {
                return Err(invalid(format!("`{}` is not a pointer", target.ty)));
            };

            if *is_array && !matches!(pointee, Type::VarArray(_)) {
                return Err(invalid(format!(
                    "`dispose []` needs a pointer to `array of ...`, found `{}`",
                    target.ty
                )));
            }

            if !*is_array && !pointee.is_complete() {
                return Err(invalid(format!("`{}` was allocated as an array, use `dispose []`", target.ty)));
            }

            TypedStmtKind::Dispose {
                is_array: *is_array,
                target,
            }
        }
    };

    Ok(TypedStmt::new(kind, stmt.span.clone()))
}

pub fn type_check_block(type_checker: &mut TypeChecker, block: &BlockStmt) -> Result<Vec<TypedStmt>, Error> {
    let mut typed = vec![];

    for stmt in block.body.iter() {
        match type_check_stmt(type_checker, stmt) {
            Ok(stmt) => typed.push(stmt),
            Err(error) => type_checker.report(error)?,
        }
    }

    Ok(typed)
}

fn routine_entry(name: &str, header: &TypedHeader, kind: Option<NameKind>, position: &Position) -> SymbolEntry {
    let (default_kind, ty) = match &header.return_type {
        Some(result) => (NameKind::Function, Type::Function(Box::new(result.clone()))),
        None => (NameKind::Procedure, Type::Procedure),
    };

    SymbolEntry::new(
        name,
        ty,
        kind.unwrap_or(default_kind),
        header.storage.clone(),
        position.clone(),
    )
}

fn register_formals(type_checker: &mut TypeChecker, header: &TypedHeader) {
    type_checker.symbol_table.reset_formals(&header.storage);

    for formal in header.formals.iter() {
        let mut entry = SymbolEntry::new(
            &formal.name,
            formal.ty.clone(),
            NameKind::Formal,
            formal.storage.clone(),
            header.span.start.clone(),
        );
        entry.by_reference = formal.by_reference;

        type_checker
            .symbol_table
            .insert_formal(&header.storage, &formal.name, entry);
    }
}

pub fn type_check_header(type_checker: &mut TypeChecker, header: &Header) -> Result<TypedHeader, Error> {
    let storage = type_checker.storage_name(&header.name);
    let mut formals = vec![];

    for formal in header.formals.iter() {
        check_type(&formal.ty, &formal.span.start)?;

        for name in formal.names.iter() {
            if !formal.by_reference && formal.ty.is_array() {
                return Err(Error::new(
                    ErrorImpl::IllegalArrayByValue {
                        formal: name.clone(),
                    },
                    formal.span.start.clone(),
                ));
            }

            formals.push(TypedFormal {
                name: name.clone(),
                storage: format!("{}.{}", storage, name),
                ty: formal.ty.clone(),
                by_reference: formal.by_reference,
            });
        }
    }

    let return_type = match &header.return_type {
        Some(ty) => {
            if !matches!(ty, Type::Scalar(_) | Type::Pointer(_)) {
                return Err(illegal_type(ty, "as a function result", &header.span.start));
            }
            check_type(ty, &header.span.start)?;
            Some(ty.clone())
        }
        None => None,
    };

    let result_storage = return_type
        .as_ref()
        .map(|_| format!("{}.result", storage));

    Ok(TypedHeader {
        name: header.name.clone(),
        storage,
        formals,
        return_type,
        result_storage,
        span: header.span.clone(),
    })
}

/// Whether `header` repeats the signature recorded by `forward`.
fn matches_forward(type_checker: &TypeChecker, forward: &SymbolEntry, header: &TypedHeader) -> bool {
    let expected = type_checker.symbol_table.formals_of(&forward.storage);
    let expected_result = forward.return_type();

    expected_result == header.return_type
        && expected.len() == header.formals.len()
        && expected
            .iter()
            .zip(header.formals.iter())
            .all(|((_, expected), formal)| {
                expected.ty == formal.ty && expected.by_reference == formal.by_reference
            })
}

pub fn type_check_routine(type_checker: &mut TypeChecker, routine: &RoutineDecl) -> Result<TypedRoutine, Error> {
    let header = type_check_header(type_checker, &routine.header)?;
    let position = &routine.header.span.start;

    if let Some(forward) = type_checker
        .symbol_table
        .find_innermost(&forward_name(&header.name))
        .cloned()
    {
        if !matches_forward(type_checker, &forward, &header) {
            return Err(Error::new(
                ErrorImpl::ForwardSignatureMismatch {
                    routine: header.name.clone(),
                },
                position.clone(),
            ));
        }
    }

    type_checker
        .symbol_table
        .insert(routine_entry(&header.name, &header, None, position))?;
    register_formals(type_checker, &header);

    debug!(routine = %header.storage, "type checking routine");

    type_checker.path.push(header.name.clone());
    type_checker.open_scope(Some(header.name.clone()));

    let body = type_check_routine_body(type_checker, &header, &routine.body);

    let closed = type_checker.close_scope();
    type_checker.path.pop();

    let body = body?;
    closed?;

    let warnings = check_body(&body, &header.storage, Some(&header));
    type_checker.warnings.extend(warnings);

    Ok(TypedRoutine {
        header,
        body,
        span: routine.span.clone(),
    })
}

fn type_check_routine_body(
    type_checker: &mut TypeChecker,
    header: &TypedHeader,
    body: &Body,
) -> Result<TypedBody, Error> {
    for formal in header.formals.iter() {
        let mut entry = SymbolEntry::new(
            &formal.name,
            formal.ty.clone(),
            NameKind::Formal,
            formal.storage.clone(),
            header.span.start.clone(),
        );
        entry.by_reference = formal.by_reference;
        type_checker.symbol_table.insert(entry)?;
    }

    if let (Some(ty), Some(storage)) = (&header.return_type, &header.result_storage) {
        type_checker.symbol_table.insert(SymbolEntry::new(
            "result",
            ty.clone(),
            NameKind::Variable,
            storage.clone(),
            header.span.start.clone(),
        ))?;
    }

    type_check_body(type_checker, body)
}

pub fn type_check_local(type_checker: &mut TypeChecker, local: &Local) -> Result<Vec<TypedDecl>, Error> {
    match local {
        Local::Var(decl) => {
            let position = &decl.span.start;
            check_type(&decl.ty, position)?;
            require_complete(&decl.ty, "as a variable type", position)?;

            let mut typed = vec![];
            for name in decl.names.iter() {
                let storage = type_checker.storage_name(name);
                type_checker.symbol_table.insert(SymbolEntry::new(
                    name,
                    decl.ty.clone(),
                    NameKind::Variable,
                    storage.clone(),
                    position.clone(),
                ))?;

                typed.push(TypedDecl::Variable {
                    name: name.clone(),
                    storage,
                    ty: decl.ty.clone(),
                });
            }

            Ok(typed)
        }
        Local::Label(decl) => {
            for name in decl.names.iter() {
                type_checker.symbol_table.insert(SymbolEntry::new(
                    name,
                    Type::Label,
                    NameKind::Label,
                    name.clone(),
                    decl.span.start.clone(),
                ))?;
            }

            Ok(vec![])
        }
        Local::Routine(routine) => Ok(vec![TypedDecl::Routine(type_check_routine(type_checker, routine)?)]),
        Local::Forward(header) => {
            let typed = type_check_header(type_checker, header)?;
            type_checker.symbol_table.insert(routine_entry(
                &forward_name(&header.name),
                &typed,
                Some(NameKind::ForwardDecl),
                &header.span.start,
            ))?;
            register_formals(type_checker, &typed);

            Ok(vec![TypedDecl::Forward(typed)])
        }
    }
}

pub fn type_check_body(type_checker: &mut TypeChecker, body: &Body) -> Result<TypedBody, Error> {
    let mut decls = vec![];

    for local in body.locals.iter() {
        match type_check_local(type_checker, local) {
            Ok(typed) => decls.extend(typed),
            Err(error) => type_checker.report(error)?,
        }
    }

    let block = type_check_block(type_checker, &body.block)?;

    Ok(TypedBody {
        decls,
        block,
        span: body.span.clone(),
    })
}

fn type_check_program(type_checker: &mut TypeChecker, program: &Program) -> Result<TypedProgram, Error> {
    debug!(program = %program.name, "type checking program");

    type_checker.path.push(program.name.clone());
    type_checker.open_scope(None);

    let body = type_check_body(type_checker, &program.body);

    let closed = type_checker.close_scope();
    type_checker.path.pop();

    let body = body?;
    closed?;

    let warnings = check_body(&body, &program.name, None);
    type_checker.warnings.extend(warnings);

    Ok(TypedProgram {
        name: program.name.clone(),
        body,
        span: program.span.clone(),
    })
}

/// Checks `program`, reporting every independent error.
pub fn type_check(program: &Program) -> (TypeChecker, Result<TypedProgram, Vec<Error>>) {
    type_check_with(program, false)
}

pub fn type_check_with(program: &Program, fail_fast: bool) -> (TypeChecker, Result<TypedProgram, Vec<Error>>) {
    let mut type_checker = TypeChecker::new(fail_fast);

    match type_check_program(&mut type_checker, program) {
        Ok(typed) if type_checker.errors.is_empty() => return (type_checker, Ok(typed)),
        Ok(_) => {}
        Err(error) => type_checker.errors.push(error),
    }

    let errors = type_checker.errors.clone();
    (type_checker, Err(errors))
}
