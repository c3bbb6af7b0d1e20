//! Definite assignment analysis.
//!
//! Runs over one typed routine body and tracks which of the routine's own
//! scalar and pointer variables (and `result`) are assigned on every path
//! reaching each statement. The state is `None` in unreachable code. Both
//! diagnostics produced here are warnings.
//!
//! A call to a routine declared in the analyzed body, or to the analyzed
//! routine itself, assigns the variables that routine and its callees may
//! assign.

use std::collections::{HashMap, HashSet};

use crate::{
    ast::types::Type,
    errors::errors::{Warning, WarningImpl},
    Position,
};

use super::typed_ast::{
    TypedBody, TypedCall, TypedDecl, TypedExpr, TypedExprKind, TypedHeader, TypedStmt,
    TypedStmtKind,
};

type State = Option<HashSet<String>>;

fn meet(left: State, right: State) -> State {
    match (left, right) {
        (None, state) | (state, None) => state,
        (Some(left), Some(right)) => Some(left.intersection(&right).cloned().collect()),
    }
}

struct Analysis {
    /// storage -> source name
    tracked: HashMap<String, String>,
    /// routine storage -> storage of the variables it may assign
    effects: HashMap<String, HashSet<String>>,
    /// `(storage, function name)` of the result slot.
    result: Option<(String, String)>,
    labels: HashMap<String, State>,
    warned: HashSet<String>,
    result_warned: bool,
    warnings: Vec<Warning>,
}

/// Checks the body of the routine with storage symbol `routine`, or of the
/// main program when `header` is `None`.
pub fn check_body(body: &TypedBody, routine: &str, header: Option<&TypedHeader>) -> Vec<Warning> {
    let mut tracked = HashMap::new();
    for decl in body.decls.iter() {
        if let TypedDecl::Variable { name, storage, ty } = decl {
            if matches!(ty, Type::Scalar(_) | Type::Pointer(_)) {
                tracked.insert(storage.clone(), name.clone());
            }
        }
    }

    let result = header.and_then(|header| {
        header
            .result_storage
            .as_ref()
            .map(|storage| (storage.clone(), header.name.clone()))
    });
    if let Some((storage, _)) = &result {
        tracked.insert(storage.clone(), String::from("result"));
    }

    let mut routines = vec![];
    if header.is_some() {
        routines.push((routine.to_string(), body));
    }
    collect_routines(body, &mut routines);

    let mut analysis = Analysis {
        tracked,
        effects: routine_effects(&routines),
        result,
        labels: HashMap::new(),
        warned: HashSet::new(),
        result_warned: false,
        warnings: vec![],
    };

    let state = body
        .block
        .iter()
        .fold(Some(HashSet::new()), |state, stmt| analysis.stmt(stmt, state));
    analysis.check_result(&state, &body.span.end);

    analysis.warnings
}

/// Collects every routine defined in `body`, at any depth.
fn collect_routines<'b>(body: &'b TypedBody, routines: &mut Vec<(String, &'b TypedBody)>) {
    for decl in body.decls.iter() {
        if let TypedDecl::Routine(routine) = decl {
            routines.push((routine.header.storage.clone(), &routine.body));
            collect_routines(&routine.body, routines);
        }
    }
}

/// What a routine body does directly: the variables it assigns and the user
/// routines it calls.
#[derive(Default)]
struct Effects {
    written: HashSet<String>,
    callees: HashSet<String>,
}

impl Effects {
    fn stmt(&mut self, stmt: &TypedStmt) {
        match &stmt.kind {
            TypedStmtKind::Empty | TypedStmtKind::Goto { .. } | TypedStmtKind::Return => {}
            TypedStmtKind::Block(body) => body.iter().for_each(|stmt| self.stmt(stmt)),
            TypedStmtKind::Assign { target, value } => {
                self.assigned(target);
                self.expr(target);
                self.expr(value);
            }
            TypedStmtKind::Call(call) => self.call(call),
            TypedStmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                self.expr(condition);
                self.stmt(then_body);
                if let Some(else_body) = else_body {
                    self.stmt(else_body);
                }
            }
            TypedStmtKind::While { condition, body } => {
                self.expr(condition);
                self.stmt(body);
            }
            TypedStmtKind::Labeled { body, .. } => self.stmt(body),
            TypedStmtKind::New { size, target } => {
                if let Some(size) = size {
                    self.expr(size);
                }
                self.assigned(target);
                self.expr(target);
            }
            TypedStmtKind::Dispose { target, .. } => {
                self.assigned(target);
                self.expr(target);
            }
        }
    }

    fn expr(&mut self, expr: &TypedExpr) {
        match &expr.kind {
            TypedExprKind::Index { array, index } => {
                self.expr(array);
                self.expr(index);
            }
            TypedExprKind::Deref(operand) | TypedExprKind::Prefix { operand, .. } => {
                self.expr(operand)
            }
            TypedExprKind::AddressOf(operand) => {
                self.assigned(operand);
                self.expr(operand);
            }
            TypedExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            TypedExprKind::Call(call) => self.call(call),
            _ => {}
        }
    }

    fn call(&mut self, call: &TypedCall) {
        for (argument, formal) in call.arguments.iter().zip(call.formals.iter()) {
            if formal.by_reference {
                self.assigned(argument);
            }
            self.expr(argument);
        }

        if !call.is_external {
            self.callees.insert(call.storage.clone());
        }
    }

    /// Records the variable an lvalue stores into. Stores through a pointer
    /// are not attributed to any variable.
    fn assigned(&mut self, target: &TypedExpr) {
        match &target.kind {
            TypedExprKind::Variable { storage, .. } => {
                self.written.insert(storage.clone());
            }
            TypedExprKind::Index { array, .. } => self.assigned(array),
            _ => {}
        }
    }
}

/// The variables each routine may assign, through the routines it calls too.
fn routine_effects(routines: &[(String, &TypedBody)]) -> HashMap<String, HashSet<String>> {
    let direct = routines
        .iter()
        .map(|(storage, body)| {
            let mut effects = Effects::default();
            body.block.iter().for_each(|stmt| effects.stmt(stmt));
            (storage.clone(), effects)
        })
        .collect::<HashMap<_, _>>();

    let mut written = direct
        .iter()
        .map(|(storage, effects)| (storage.clone(), effects.written.clone()))
        .collect::<HashMap<_, _>>();

    // Propagate along calls until nothing changes.
    let mut changed = true;
    while changed {
        changed = false;
        for (storage, effects) in direct.iter() {
            let reached = effects
                .callees
                .iter()
                .filter_map(|callee| written.get(callee))
                .flatten()
                .cloned()
                .collect::<Vec<_>>();

            if let Some(own) = written.get_mut(storage) {
                for variable in reached {
                    changed |= own.insert(variable);
                }
            }
        }
    }

    written
}

impl Analysis {
    fn stmt(&mut self, stmt: &TypedStmt, mut state: State) -> State {
        match &stmt.kind {
            TypedStmtKind::Empty => state,
            TypedStmtKind::Block(body) => body.iter().fold(state, |state, stmt| self.stmt(stmt, state)),
            TypedStmtKind::Assign { target, value } => {
                self.read(value, &mut state);
                self.write(target, &mut state);
                state
            }
            TypedStmtKind::Call(call) => {
                self.call(call, &mut state);
                state
            }
            TypedStmtKind::If {
                condition,
                then_body,
                else_body,
            } => {
                self.read(condition, &mut state);
                let then_state = self.stmt(then_body, state.clone());
                let else_state = match else_body {
                    Some(else_body) => self.stmt(else_body, state),
                    None => state,
                };
                meet(then_state, else_state)
            }
            TypedStmtKind::While { condition, body } => {
                self.read(condition, &mut state);
                self.stmt(body, state.clone());
                state
            }
            TypedStmtKind::Labeled { label, body } => {
                let incoming = self.labels.get(label).cloned().flatten();
                self.stmt(body, meet(state, incoming))
            }
            TypedStmtKind::Goto { label } => {
                let incoming = self.labels.remove(label).flatten();
                self.labels.insert(label.clone(), meet(incoming, state));
                None
            }
            TypedStmtKind::Return => {
                self.check_result(&state, &stmt.span.start);
                None
            }
            TypedStmtKind::New { size, target } => {
                if let Some(size) = size {
                    self.read(size, &mut state);
                }
                self.write(target, &mut state);
                state
            }
            TypedStmtKind::Dispose { target, .. } => {
                self.read(target, &mut state);
                self.write(target, &mut state);
                state
            }
        }
    }

    /// Visits an expression in value position.
    fn read(&mut self, expr: &TypedExpr, state: &mut State) {
        match &expr.kind {
            TypedExprKind::Variable { storage, .. } => self.use_variable(storage, state, expr),
            TypedExprKind::Index { array, index } => {
                self.read(array, state);
                self.read(index, state);
            }
            TypedExprKind::Deref(operand) | TypedExprKind::Prefix { operand, .. } => {
                self.read(operand, state)
            }
            TypedExprKind::AddressOf(operand) => self.write(operand, state),
            TypedExprKind::Binary { left, right, .. } => {
                self.read(left, state);
                self.read(right, state);
            }
            TypedExprKind::Call(call) => self.call(call, state),
            TypedExprKind::Integer(_)
            | TypedExprKind::Real(_)
            | TypedExprKind::Char(_)
            | TypedExprKind::Boolean(_)
            | TypedExprKind::Nil
            | TypedExprKind::String(_) => {}
        }
    }

    /// Visits the address computation of an lvalue, then marks it assigned.
    fn write(&mut self, target: &TypedExpr, state: &mut State) {
        match &target.kind {
            TypedExprKind::Variable { storage, .. } => {
                if let Some(assigned) = state {
                    if self.tracked.contains_key(storage) {
                        assigned.insert(storage.clone());
                    }
                }
            }
            TypedExprKind::Index { array, index } => {
                self.write(array, state);
                self.read(index, state);
            }
            TypedExprKind::Deref(pointer) => self.read(pointer, state),
            _ => self.read(target, state),
        }
    }

    fn call(&mut self, call: &TypedCall, state: &mut State) {
        for (argument, formal) in call.arguments.iter().zip(call.formals.iter()) {
            if formal.by_reference {
                self.write(argument, state);
            } else {
                self.read(argument, state);
            }
        }

        if call.is_external {
            return;
        }

        if let (Some(written), Some(assigned)) = (self.effects.get(&call.storage), state) {
            assigned.extend(
                written
                    .iter()
                    .filter(|storage| self.tracked.contains_key(*storage))
                    .cloned(),
            );
        }
    }

    fn use_variable(&mut self, storage: &str, state: &State, expr: &TypedExpr) {
        let Some(assigned) = state else {
            return;
        };

        let Some(name) = self.tracked.get(storage) else {
            return;
        };

        if !assigned.contains(storage) && self.warned.insert(storage.to_string()) {
            self.warnings.push(Warning::new(
                WarningImpl::UsedBeforeSet {
                    variable: name.clone(),
                },
                expr.span.start.clone(),
            ));
        }
    }

    fn check_result(&mut self, state: &State, position: &Position) {
        let (Some((storage, function)), Some(assigned)) = (&self.result, state) else {
            return;
        };

        if !self.result_warned && !assigned.contains(storage) {
            self.result_warned = true;
            self.warnings.push(Warning::new(
                WarningImpl::UnsetResult {
                    function: function.clone(),
                },
                position.clone(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::type_checker::tests::check_source;

    fn warning_names(source: &str) -> Vec<String> {
        let (type_checker, result) = check_source(source);
        assert!(result.is_ok(), "unexpected errors: {:?}", result.err());
        type_checker
            .warnings
            .iter()
            .map(|warning| warning.get_warning_name().to_string())
            .collect()
    }

    #[test]
    fn test_assigned_before_use() {
        let names = warning_names("program p; var x : integer; begin x := 2; x := x + 3 end.");
        assert!(names.is_empty());
    }

    #[test]
    fn test_used_before_set_warns_once() {
        let names = warning_names(
            "program p; var x, y : integer; begin y := x; y := x + 1; x := 0 end.",
        );
        assert_eq!(names, vec!["UsedBeforeSet"]);
    }

    #[test]
    fn test_if_needs_both_branches() {
        let names = warning_names(
            "program p; var x : integer; b : boolean;
             begin b := true; if b then x := 1; writeInteger(x) end.",
        );
        assert_eq!(names, vec!["UsedBeforeSet"]);

        let names = warning_names(
            "program p; var x : integer; b : boolean;
             begin b := true; if b then x := 1 else x := 2; writeInteger(x) end.",
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_while_body_does_not_assign() {
        let names = warning_names(
            "program p; var x : integer; b : boolean;
             begin b := false; while b do x := 1; writeInteger(x) end.",
        );
        assert_eq!(names, vec!["UsedBeforeSet"]);
    }

    #[test]
    fn test_by_reference_argument_assigns() {
        let names = warning_names(
            "program p; var x : integer;
             procedure set(var n : integer); begin n := 1 end;
             begin set(x); writeInteger(x) end.",
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_address_of_assigns() {
        let names = warning_names(
            "program p; var x : integer; q : ^integer;
             begin q := @x; q^ := 3; writeInteger(x) end.",
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_unset_result() {
        let names = warning_names(
            "program p; function f(n : integer) : integer; begin end; begin end.",
        );
        assert_eq!(names, vec!["UnsetResult"]);
    }

    #[test]
    fn test_result_set_on_every_path() {
        let names = warning_names(
            "program p;
             function f(n : integer) : integer;
             begin
               if n < 0 then begin result := 0; return end;
               result := n
             end;
             begin writeInteger(f(3)) end.",
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_return_before_result() {
        let names = warning_names(
            "program p;
             function f(n : integer) : integer;
             begin
               if n < 0 then return;
               result := n
             end;
             begin writeInteger(f(3)) end.",
        );
        assert_eq!(names, vec!["UnsetResult"]);
    }

    #[test]
    fn test_goto_state_reaches_label() {
        let names = warning_names(
            "program p; var x : integer; label l;
             begin x := 1; goto l; l: writeInteger(x) end.",
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_unreachable_code_is_silent() {
        let names = warning_names(
            "program p; var x : integer;
             begin return; writeInteger(x) end.",
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_call_assigns_only_what_the_routine_writes() {
        let names = warning_names(
            "program p; var x, y : integer;
             procedure init(); begin x := 4 end;
             begin init(); writeInteger(x); writeInteger(y) end.",
        );
        assert_eq!(names, vec!["UsedBeforeSet"]);
    }

    #[test]
    fn test_assignments_reach_through_callees() {
        let names = warning_names(
            "program p; var x : integer;
             procedure inner(); begin x := 1 end;
             procedure outer(); begin inner() end;
             begin outer(); writeInteger(x) end.",
        );
        assert!(names.is_empty());
    }

    #[test]
    fn test_forward_call_uses_definition_effects() {
        let names = warning_names(
            "program p; var x, y : integer;
             forward procedure init();
             procedure start(); begin init() end;
             procedure init(); begin y := 2 end;
             begin start(); writeInteger(y); writeInteger(x) end.",
        );
        assert_eq!(names, vec!["UsedBeforeSet"]);
    }

    #[test]
    fn test_nested_routine_may_assign() {
        let names = warning_names(
            "program p; var x : integer;
             procedure init(); begin x := 4 end;
             begin init(); writeInteger(x) end.",
        );
        assert!(names.is_empty());
    }
}
