//! Lexical scopes and the formal parameter registry.
//!
//! The table is a stack of scopes. Lookups walk from the innermost scope
//! outwards and count every hit, which is how unreferenced labels are found
//! when their scope closes. Formal parameter lists live in a separate
//! registry keyed by the routine's storage name, so they stay reachable after
//! the routine's own scope has been closed.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    ast::types::Type,
    errors::errors::{Error, ErrorImpl},
    Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Variable,
    Label,
    Procedure,
    Function,
    Formal,
    ForwardDecl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    pub name: String,
    pub ty: Type,
    pub kind: NameKind,
    pub by_reference: bool,
    /// Unique symbol of the storage slot or function this name denotes.
    pub storage: String,
    /// Runtime routine without a body in the program.
    pub external: bool,
    pub position: Position,
    pub queries: u32,
}

impl SymbolEntry {
    pub fn new(name: &str, ty: Type, kind: NameKind, storage: String, position: Position) -> Self {
        SymbolEntry {
            name: name.to_string(),
            ty,
            kind,
            by_reference: false,
            storage,
            external: false,
            position,
            queries: 0,
        }
    }

    pub fn is_routine(&self) -> bool {
        matches!(
            self.kind,
            NameKind::Procedure | NameKind::Function | NameKind::ForwardDecl
        )
    }

    /// The result type of a routine entry, `None` for procedures.
    pub fn return_type(&self) -> Option<Type> {
        match &self.ty {
            Type::Function(result) => Some((**result).clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scope {
    /// Name of the routine whose body this scope belongs to.
    pub tag: Option<String>,
    symbols: HashMap<String, SymbolEntry>,
    order: Vec<String>,
}

impl Scope {
    pub fn new(tag: Option<String>) -> Self {
        Scope {
            tag,
            ..Default::default()
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.symbols.get(name)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.order.iter().filter_map(|name| self.symbols.get(name))
    }
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    formals: HashMap<String, Vec<(String, SymbolEntry)>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn open_scope(&mut self, tag: Option<String>) {
        debug!(depth = self.scopes.len() + 1, tag = ?tag, "open scope");
        self.scopes.push(Scope::new(tag));
    }

    pub fn close_scope(&mut self) -> Result<Scope, Error> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| Error::new(ErrorImpl::ScopeUnderflow, Position::null()))?;

        debug!(depth = self.scopes.len(), tag = ?scope.tag, "close scope");
        Ok(scope)
    }

    pub fn insert(&mut self, entry: SymbolEntry) -> Result<(), Error> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(Error::new(ErrorImpl::ScopeUnderflow, entry.position));
        };

        if scope.symbols.contains_key(&entry.name) {
            return Err(Error::new(
                ErrorImpl::DuplicateDeclaration { name: entry.name },
                entry.position,
            ));
        }

        scope.order.push(entry.name.clone());
        scope.symbols.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Resolves `name` and counts the query.
    pub fn lookup(
        &mut self,
        name: &str,
        innermost_only: bool,
        position: &Position,
    ) -> Result<SymbolEntry, Error> {
        let searched = if innermost_only { 1 } else { self.scopes.len() };

        for scope in self.scopes.iter_mut().rev().take(searched) {
            if let Some(entry) = scope.symbols.get_mut(name) {
                entry.queries += 1;
                return Ok(entry.clone());
            }
        }

        Err(Error::new(
            ErrorImpl::UnknownIdentifier {
                name: name.to_string(),
            },
            position.clone(),
        ))
    }

    /// Resolves `name` without counting the query.
    pub fn find(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn find_innermost(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    /// Whether we are currently inside the body of a routine called `name`.
    pub fn is_open_routine(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.tag.as_deref() == Some(name))
    }

    /// A call lexically inside `name`'s own body needs `forward_<name>`.
    pub fn requires_forward(&self, name: &str, position: &Position) -> Result<(), Error> {
        if self.is_open_routine(name) && self.find(&forward_name(name)).is_none() {
            return Err(Error::new(
                ErrorImpl::MissingForwardDeclaration {
                    routine: name.to_string(),
                },
                position.clone(),
            ));
        }

        Ok(())
    }

    pub fn insert_formal(&mut self, routine: &str, name: &str, entry: SymbolEntry) {
        self.formals
            .entry(routine.to_string())
            .or_default()
            .push((name.to_string(), entry));
    }

    /// Drops any previous formal list, used when a definition follows its
    /// forward declaration.
    pub fn reset_formals(&mut self, routine: &str) {
        self.formals.insert(routine.to_string(), vec![]);
    }

    pub fn formals_of(&self, routine: &str) -> &[(String, SymbolEntry)] {
        self.formals
            .get(routine)
            .map(|formals| formals.as_slice())
            .unwrap_or(&[])
    }
}

pub fn forward_name(name: &str) -> String {
    format!("forward_{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(name: &str, ty: Type) -> SymbolEntry {
        SymbolEntry::new(name, ty, NameKind::Variable, format!("p.{}", name), Position::null())
    }

    #[test]
    fn test_insert_then_lookup() {
        let mut table = SymbolTable::new();
        table.open_scope(None);
        table.insert(variable("x", Type::INTEGER)).unwrap();

        let entry = table.lookup("x", false, &Position::null()).unwrap();
        assert_eq!(entry.ty, Type::INTEGER);
        assert_eq!(entry.queries, 1);

        table.close_scope().unwrap();
        assert_eq!(table.depth(), 0);
        assert!(table.find("x").is_none());
    }

    #[test]
    fn test_duplicate_in_one_scope() {
        let mut table = SymbolTable::new();
        table.open_scope(None);
        table.insert(variable("x", Type::INTEGER)).unwrap();

        let error = table.insert(variable("x", Type::REAL)).unwrap_err();
        assert_eq!(error.get_error_name(), "DuplicateDeclaration");
    }

    #[test]
    fn test_shadowing() {
        let mut table = SymbolTable::new();
        table.open_scope(None);
        table.insert(variable("x", Type::INTEGER)).unwrap();

        table.open_scope(Some(String::from("f")));
        table.insert(variable("x", Type::REAL)).unwrap();
        assert_eq!(table.lookup("x", false, &Position::null()).unwrap().ty, Type::REAL);

        table.close_scope().unwrap();
        assert_eq!(table.lookup("x", false, &Position::null()).unwrap().ty, Type::INTEGER);
    }

    #[test]
    fn test_innermost_only_lookup() {
        let mut table = SymbolTable::new();
        table.open_scope(None);
        table.insert(variable("l", Type::Label)).unwrap();
        table.open_scope(None);

        let error = table.lookup("l", true, &Position::null()).unwrap_err();
        assert_eq!(error.get_error_name(), "UnknownIdentifier");
        assert!(table.lookup("l", false, &Position::null()).is_ok());
    }

    #[test]
    fn test_close_without_open() {
        let mut table = SymbolTable::new();
        let error = table.close_scope().unwrap_err();
        assert_eq!(error.get_error_name(), "ScopeUnderflow");
    }

    #[test]
    fn test_query_counter_is_per_entry() {
        let mut table = SymbolTable::new();
        table.open_scope(None);
        table.insert(variable("x", Type::INTEGER)).unwrap();
        table.insert(variable("y", Type::INTEGER)).unwrap();

        table.lookup("x", false, &Position::null()).unwrap();
        table.lookup("x", false, &Position::null()).unwrap();

        let scope = table.close_scope().unwrap();
        let queries: Vec<u32> = scope.entries().map(|entry| entry.queries).collect();
        assert_eq!(queries, vec![2, 0]);
    }

    #[test]
    fn test_requires_forward() {
        let mut table = SymbolTable::new();
        table.open_scope(None);
        table.open_scope(Some(String::from("f")));

        let error = table.requires_forward("f", &Position::null()).unwrap_err();
        assert_eq!(error.get_error_name(), "MissingForwardDeclaration");
        assert!(table.requires_forward("g", &Position::null()).is_ok());

        table.close_scope().unwrap();
        let forward = SymbolEntry::new(
            &forward_name("f"),
            Type::Procedure,
            NameKind::ForwardDecl,
            String::from("p.f"),
            Position::null(),
        );
        table.insert(forward).unwrap();
        table.open_scope(Some(String::from("f")));
        assert!(table.requires_forward("f", &Position::null()).is_ok());
    }

    #[test]
    fn test_formal_registry_outlives_scopes() {
        let mut table = SymbolTable::new();
        table.open_scope(Some(String::from("f")));
        table.insert_formal("p.f", "n", variable("n", Type::INTEGER));
        table.close_scope().unwrap();

        let formals = table.formals_of("p.f");
        assert_eq!(formals.len(), 1);
        assert_eq!(formals[0].0, "n");
        assert!(table.formals_of("p.g").is_empty());

        table.reset_formals("p.f");
        assert!(table.formals_of("p.f").is_empty());
    }
}
