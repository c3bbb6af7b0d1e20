//! Unit tests for the type checker module.
//!
//! Each test runs the whole front end on a small program and inspects the
//! reported errors, warnings or the produced typed tree.

use std::rc::Rc;

use crate::{
    ast::types::Type,
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
};

use super::{
    stdlib::declare_builtins,
    symbol_table::SymbolTable,
    type_checker::{type_check, type_check_with, TypeChecker},
    typed_ast::{TypedDecl, TypedExprKind, TypedProgram, TypedStmtKind},
};

pub fn check_source(source: &str) -> (TypeChecker, Result<TypedProgram, Vec<Error>>) {
    let tokens = tokenize(source.to_string(), Some("test.pcl".to_string())).unwrap();
    let (_, program) = parse(tokens, Rc::new("test.pcl".to_string()));
    type_check(&program.unwrap())
}

fn error_names(source: &str) -> Vec<String> {
    match check_source(source).1 {
        Ok(_) => vec![],
        Err(errors) => errors
            .iter()
            .map(|error| error.get_error_name().to_string())
            .collect(),
    }
}

fn warning_names(source: &str) -> Vec<String> {
    check_source(source)
        .0
        .warnings
        .iter()
        .map(|warning| warning.get_warning_name().to_string())
        .collect()
}

fn assert_accepted(source: &str) -> TypedProgram {
    match check_source(source).1 {
        Ok(program) => program,
        Err(errors) => panic!("Expected no errors, found {:?}", errors),
    }
}

#[test]
fn test_scenario_a_arithmetic_on_variable() {
    let (type_checker, result) =
        check_source("program p; var x : integer; begin x := 2; x := x + 3; end.");

    assert!(result.is_ok());
    assert!(type_checker.warnings.is_empty());
}

#[test]
fn test_scenario_b_pointer_lifecycle() {
    let (type_checker, result) =
        check_source("program p; var x : ^integer; begin new x; x^ := 7; dispose x; end.");

    assert!(result.is_ok());
    assert!(type_checker.warnings.is_empty());

    assert_eq!(
        error_names("program p; var x : integer; begin x^ := 7 end."),
        vec!["InvalidDereference"]
    );
    assert_eq!(
        error_names("program p; var x : integer; begin x := nil^ end."),
        vec!["InvalidDereference"]
    );
}

#[test]
fn test_scenario_c_unset_result_is_a_warning() {
    let source = "program p; function f(n : integer) : integer; begin end; begin end.";

    assert!(error_names(source).is_empty());
    assert_eq!(warning_names(source), vec!["UnsetResult"]);
}

#[test]
fn test_scenario_d_array_arguments() {
    let accepted = "program p;
        var s : array [10] of char;
        procedure f(var a : array of char); begin end;
        begin f(s); writeString(s); writeString(\"literal\") end.";
    assert!(error_names(accepted).is_empty());

    let rejected = "program p;
        var s : array [10] of char;
        procedure g(c : char); begin end;
        begin g(s) end.";
    assert_eq!(error_names(rejected), vec!["TypeMismatch"]);
}

#[test]
fn test_scenario_e_label_resolution() {
    assert_eq!(
        error_names("program p; begin goto nowhere end."),
        vec!["UnknownIdentifier"]
    );

    let enclosing = "program p; label l;
        procedure q(); begin goto l end;
        begin l: q() end.";
    assert_eq!(error_names(enclosing), vec!["UnknownIdentifier"]);
}

#[test]
fn test_storage_names_follow_nesting() {
    let program = assert_accepted(
        "program p; var x : integer;
         procedure f(var a : integer; b : integer);
           var n : integer;
           function g() : integer; begin result := n end;
         begin n := b; a := g() end;
         begin f(x, 1) end.",
    );

    let TypedDecl::Variable { storage, .. } = &program.body.decls[0] else {
        panic!("Expected variable");
    };
    assert_eq!(storage, "p.x");

    let TypedDecl::Routine(f) = &program.body.decls[1] else {
        panic!("Expected routine");
    };
    assert_eq!(f.header.storage, "p.f");
    assert_eq!(f.header.formals[0].storage, "p.f.a");
    assert!(f.header.formals[0].by_reference);
    assert_eq!(f.header.formals[1].storage, "p.f.b");

    let TypedDecl::Routine(g) = &f.body.decls[1] else {
        panic!("Expected nested routine");
    };
    assert_eq!(g.header.storage, "p.f.g");
    assert_eq!(g.header.result_storage.as_deref(), Some("p.f.g.result"));
}

#[test]
fn test_expression_types() {
    let program = assert_accepted(
        "program p; var r : real; b : boolean; i : integer;
         begin r := 1 + 2.5; r := 7 / 2; b := 1 < 2.0; i := 7 div 2 end.",
    );

    let types: Vec<Type> = program
        .body
        .block
        .iter()
        .map(|stmt| match &stmt.kind {
            TypedStmtKind::Assign { value, .. } => value.ty.clone(),
            other => panic!("Expected assignment, found {:?}", other),
        })
        .collect();

    assert_eq!(types, vec![Type::REAL, Type::REAL, Type::BOOLEAN, Type::INTEGER]);
}

#[test]
fn test_string_literal_type() {
    let program = assert_accepted("program p; begin writeString(\"hello\") end.");

    let TypedStmtKind::Call(call) = &program.body.block[0].kind else {
        panic!("Expected call");
    };
    assert!(call.is_external);
    assert!(matches!(call.arguments[0].kind, TypedExprKind::String(_)));
    assert_eq!(call.arguments[0].ty, Type::const_array(6, Type::CHAR));
}

#[test]
fn test_builtin_link_names() {
    let program = assert_accepted("program p; var i : integer; begin i := trunc(2.5) end.");

    let TypedStmtKind::Assign { value, .. } = &program.body.block[0].kind else {
        panic!("Expected assignment");
    };
    let TypedExprKind::Call(call) = &value.kind else {
        panic!("Expected call");
    };
    assert_eq!(call.storage, "trunc2");
}

#[test]
fn test_assignment_compatibility() {
    assert!(error_names("program p; var r : real; begin r := 3 end.").is_empty());
    assert_eq!(
        error_names("program p; var i : integer; begin i := 3.0 end."),
        vec!["TypeMismatch"]
    );
    assert_eq!(
        error_names("program p; var c : char; begin c := 65 end."),
        vec!["TypeMismatch"]
    );
    assert!(error_names("program p; var q : ^real; begin q := nil end.").is_empty());
}

#[test]
fn test_string_assignment_must_fit() {
    assert!(error_names("program p; var s : array [6] of char; begin s := \"hello\" end.").is_empty());
    assert_eq!(
        error_names("program p; var s : array [5] of char; begin s := \"hello\" end."),
        vec!["TypeMismatch"]
    );
}

#[test]
fn test_operator_operands() {
    assert_eq!(
        error_names("program p; var b : boolean; begin b := 'a' < 'b' end."),
        vec!["TypeMismatch"]
    );
    assert_eq!(
        error_names("program p; var i : integer; begin i := 5 mod 2.0 end."),
        vec!["TypeMismatch"]
    );
    assert_eq!(
        error_names("program p; var b : boolean; begin b := not 1 end."),
        vec!["TypeMismatch"]
    );
    assert!(error_names(
        "program p; var q : ^integer; b : boolean; begin q := nil; b := q = nil end."
    )
    .is_empty());
    assert_eq!(
        error_names(
            "program p; var a, c : array [2] of integer; b : boolean; begin b := a = c end."
        ),
        vec!["TypeMismatch"]
    );
}

#[test]
fn test_conditions_must_be_boolean() {
    assert_eq!(
        error_names("program p; begin if 1 then return end."),
        vec!["TypeMismatch"]
    );
    assert_eq!(
        error_names("program p; begin while 'c' do return end."),
        vec!["TypeMismatch"]
    );
}

#[test]
fn test_duplicate_declaration() {
    assert_eq!(
        error_names("program p; var x : integer; x : real; begin end."),
        vec!["DuplicateDeclaration"]
    );
    assert!(error_names(
        "program p; var x : integer; procedure f(); var x : real; begin x := 1.5 end; begin end."
    )
    .is_empty());
}

#[test]
fn test_errors_accumulate() {
    let source = "program p; var x : integer; begin x := true; y := 1; x := 'c' end.";

    assert_eq!(
        error_names(source),
        vec!["TypeMismatch", "UnknownIdentifier", "TypeMismatch"]
    );

    let tokens = tokenize(source.to_string(), None).unwrap();
    let (_, program) = parse(tokens, Rc::new("<stdin>".to_string()));
    let (_, result) = type_check_with(&program.unwrap(), true);
    assert_eq!(result.unwrap_err().len(), 1);
}

#[test]
fn test_arity_mismatch() {
    assert_eq!(
        error_names("program p; begin writeInteger(1, 2) end."),
        vec!["ArityMismatch"]
    );
    assert_eq!(
        error_names("program p; procedure f(a, b : integer); begin end; begin f(1) end."),
        vec!["ArityMismatch"]
    );
}

#[test]
fn test_recursion_requires_forward() {
    let without_forward = "program p;
        function fact(n : integer) : integer;
        begin if n <= 1 then result := 1 else result := n * fact(n - 1) end;
        begin writeInteger(fact(5)) end.";
    assert_eq!(error_names(without_forward), vec!["MissingForwardDeclaration"]);

    let with_forward = "program p;
        forward function fact(n : integer) : integer;
        function fact(n : integer) : integer;
        begin if n <= 1 then result := 1 else result := n * fact(n - 1) end;
        begin writeInteger(fact(5)) end.";
    assert!(error_names(with_forward).is_empty());
    assert!(warning_names(with_forward).contains(&"RecursiveStaticStorage".to_string()));
}

#[test]
fn test_forward_allows_mutual_recursion() {
    let source = "program p;
        forward function odd(n : integer) : boolean;
        function even(n : integer) : boolean;
        begin if n = 0 then result := true else result := odd(n - 1) end;
        function odd(n : integer) : boolean;
        begin if n = 0 then result := false else result := even(n - 1) end;
        begin writeBoolean(even(4)) end.";

    assert!(error_names(source).is_empty());
}

#[test]
fn test_forward_signature_mismatch() {
    let source = "program p;
        forward function f(n : integer) : integer;
        function f(n : real) : integer; begin result := 1 end;
        begin end.";

    assert!(error_names(source).contains(&"ForwardSignatureMismatch".to_string()));
}

#[test]
fn test_undefined_forward() {
    assert_eq!(
        error_names("program p; forward procedure f(); begin f() end."),
        vec!["UndefinedForward"]
    );
}

#[test]
fn test_array_formals_by_value() {
    assert_eq!(
        error_names("program p; procedure f(a : array [3] of integer); begin end; begin end."),
        vec!["IllegalArrayByValue"]
    );
}

#[test]
fn test_reference_arguments() {
    let header = "program p; var r : real; i : integer; procedure f(var x : real); begin x := 1.0 end;";

    assert!(error_names(&format!("{} begin f(r) end.", header)).is_empty());
    assert_eq!(
        error_names(&format!("{} begin f(1.5) end.", header)),
        vec!["NonLValueByReference"]
    );
    assert_eq!(
        error_names(&format!("{} begin f(i) end.", header)),
        vec!["TypeMismatch"]
    );
}

#[test]
fn test_procedure_is_not_an_expression() {
    assert_eq!(
        error_names("program p; var x : integer; procedure f(); begin end; begin x := f() end."),
        vec!["TypeMismatch"]
    );
    assert!(error_names("program p; var c : char; begin readChar() end.").is_empty());
}

#[test]
fn test_calling_a_variable() {
    assert_eq!(
        error_names("program p; var x : integer; begin x() end."),
        vec!["TypeMismatch"]
    );
}

#[test]
fn test_result_outside_function() {
    assert_eq!(
        error_names("program p; procedure f(); begin result := 1 end; begin end."),
        vec!["UnknownIdentifier"]
    );
    assert_eq!(
        error_names(
            "program p;
             function f() : integer;
               procedure g(); begin result := 1 end;
             begin result := 2 end;
             begin end."
        ),
        vec!["UnknownIdentifier"]
    );
}

#[test]
fn test_label_placement() {
    assert_eq!(
        error_names("program p; label l; begin goto l end."),
        vec!["LabelNotPlaced"]
    );
    assert_eq!(
        error_names("program p; label l; begin l: return; l: return end."),
        vec!["DuplicateDeclaration"]
    );
    assert_eq!(
        error_names("program p; var x : integer; begin x := 1; goto x end."),
        vec!["TypeMismatch"]
    );
}

#[test]
fn test_unreferenced_label() {
    let source = "program p; label l; begin end.";

    assert!(error_names(source).is_empty());
    assert_eq!(warning_names(source), vec!["UnreferencedLabel"]);
}

#[test]
fn test_new_and_dispose_shapes() {
    assert!(error_names(
        "program p; var q : ^array of integer; begin new [10] q; q^[0] := 1; dispose [] q end."
    )
    .is_empty());
    assert_eq!(
        error_names("program p; var q : ^integer; begin new [10] q end."),
        vec!["InvalidNew"]
    );
    assert_eq!(
        error_names("program p; var q : ^array of integer; begin new q end."),
        vec!["InvalidNew"]
    );
    assert_eq!(
        error_names("program p; var q : ^array of integer; begin new [1.5] q end."),
        vec!["InvalidNew"]
    );
    assert_eq!(
        error_names("program p; var q : ^integer; begin new q; dispose [] q end."),
        vec!["InvalidDispose"]
    );
    assert_eq!(
        error_names("program p; var x : integer; begin new x end."),
        vec!["InvalidNew"]
    );
}

#[test]
fn test_incomplete_types() {
    assert_eq!(
        error_names("program p; var a : array of integer; begin end."),
        vec!["IllegalType"]
    );
    assert_eq!(
        error_names("program p; var a : array [0] of integer; begin end."),
        vec!["IllegalType"]
    );
    assert_eq!(
        error_names(
            "program p; function f() : array [2] of integer; begin end; begin end."
        ),
        vec!["IllegalType"]
    );
    assert!(error_names("program p; var q : ^array of array [3] of char; begin end.").is_empty());
}

#[test]
fn test_index_checks() {
    assert!(error_names(
        "program p; var a : array [3] of integer; begin a[1] := 2; a[2] := a[1] end."
    )
    .is_empty());
    assert_eq!(
        error_names("program p; var a : array [3] of integer; begin a[1.0] := 2 end."),
        vec!["TypeMismatch"]
    );
    assert_eq!(
        error_names("program p; var x : integer; begin x[1] := 2 end."),
        vec!["TypeMismatch"]
    );
}

#[test]
fn test_address_of_yields_pointer() {
    assert!(error_names(
        "program p; var a : array [4] of integer; q : ^array of integer;
         begin q := @a; q^[0] := 1 end."
    )
    .is_empty());
}

#[test]
fn test_builtins_reject_a_second_registration() {
    let mut symbol_table = SymbolTable::new();
    symbol_table.open_scope(None);
    assert!(declare_builtins(&mut symbol_table).is_ok());

    let error = declare_builtins(&mut symbol_table).unwrap_err();
    assert_eq!(error.get_error_name(), "DuplicateDeclaration");
}
