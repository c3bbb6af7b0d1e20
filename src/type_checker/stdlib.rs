//! Signatures of the runtime library routines.
//!
//! These are visible in every program from the outermost scope. They have no
//! body in the program and are linked against the runtime under
//! `link_name`.

use lazy_static::lazy_static;

use crate::{ast::types::Type, errors::errors::Error, Position};

use super::symbol_table::{NameKind, SymbolEntry, SymbolTable};

pub struct Builtin {
    pub name: &'static str,
    pub link_name: &'static str,
    /// `(name, type, by_reference)` in call order.
    pub formals: Vec<(&'static str, Type, bool)>,
    pub return_type: Option<Type>,
}

impl Builtin {
    fn procedure(name: &'static str, formals: Vec<(&'static str, Type, bool)>) -> Self {
        Builtin {
            name,
            link_name: name,
            formals,
            return_type: None,
        }
    }

    fn function(
        name: &'static str,
        formals: Vec<(&'static str, Type, bool)>,
        return_type: Type,
    ) -> Self {
        Builtin {
            name,
            link_name: name,
            formals,
            return_type: Some(return_type),
        }
    }

    fn linked_as(mut self, link_name: &'static str) -> Self {
        self.link_name = link_name;
        self
    }
}

lazy_static! {
    pub static ref BUILTINS: Vec<Builtin> = vec![
        // OUTPUT
        Builtin::procedure("writeInteger", vec![("n", Type::INTEGER, false)]),
        Builtin::procedure("writeBoolean", vec![("b", Type::BOOLEAN, false)]),
        Builtin::procedure("writeChar", vec![("c", Type::CHAR, false)]),
        Builtin::procedure("writeReal", vec![("r", Type::REAL, false)]),
        Builtin::procedure("writeString", vec![("s", Type::var_array(Type::CHAR), true)]),
        // INPUT
        Builtin::function("readInteger", vec![], Type::INTEGER),
        Builtin::function("readBoolean", vec![], Type::BOOLEAN),
        Builtin::function("readChar", vec![], Type::CHAR),
        Builtin::function("readReal", vec![], Type::REAL),
        Builtin::procedure(
            "readString",
            vec![
                ("size", Type::INTEGER, false),
                ("s", Type::var_array(Type::CHAR), true),
            ]
        ),
        // MATH
        Builtin::function("abs", vec![("n", Type::INTEGER, false)], Type::INTEGER),
        Builtin::function("fabs", vec![("r", Type::REAL, false)], Type::REAL),
        Builtin::function("sqrt", vec![("r", Type::REAL, false)], Type::REAL),
        Builtin::function("sin", vec![("r", Type::REAL, false)], Type::REAL),
        Builtin::function("cos", vec![("r", Type::REAL, false)], Type::REAL),
        Builtin::function("tan", vec![("r", Type::REAL, false)], Type::REAL),
        Builtin::function("arctan", vec![("r", Type::REAL, false)], Type::REAL),
        Builtin::function("exp", vec![("r", Type::REAL, false)], Type::REAL),
        Builtin::function("ln", vec![("r", Type::REAL, false)], Type::REAL),
        Builtin::function("pi", vec![], Type::REAL),
        // CONVERSIONS
        Builtin::function("trunc", vec![("r", Type::REAL, false)], Type::INTEGER)
            .linked_as("trunc2"),
        Builtin::function("round", vec![("r", Type::REAL, false)], Type::INTEGER)
            .linked_as("round2"),
        Builtin::function("ord", vec![("c", Type::CHAR, false)], Type::INTEGER),
        Builtin::function("chr", vec![("n", Type::INTEGER, false)], Type::CHAR),
    ];
}

/// Registers every builtin in the current scope of `symbol_table`.
pub fn declare_builtins(symbol_table: &mut SymbolTable) -> Result<(), Error> {
    for builtin in BUILTINS.iter() {
        let (kind, ty) = match &builtin.return_type {
            Some(result) => (NameKind::Function, Type::Function(Box::new(result.clone()))),
            None => (NameKind::Procedure, Type::Procedure),
        };

        let mut entry = SymbolEntry::new(
            builtin.name,
            ty,
            kind,
            builtin.link_name.to_string(),
            Position::null(),
        );
        entry.external = true;

        symbol_table.insert(entry)?;

        for (name, ty, by_reference) in builtin.formals.iter() {
            let mut formal = SymbolEntry::new(
                name,
                ty.clone(),
                NameKind::Formal,
                format!("{}.{}", builtin.link_name, name),
                Position::null(),
            );
            formal.by_reference = *by_reference;
            symbol_table.insert_formal(builtin.link_name, name, formal);
        }
    }

    Ok(())
}
