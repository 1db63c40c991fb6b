//! End-to-end tests over the public `parse` / `analyze` / `check` API

use pico_lang::frontend::ast::{Expr, Stmt, Type};
use pico_lang::frontend::symbol_table::SymbolTable;
use pico_lang::utils::{Error, Phase, Span};
use pico_lang::{analyze, check, parse};
use pretty_assertions::assert_eq;

fn first_assigned_value(source: &str) -> String {
    let output = parse(source);
    assert!(output.is_ok(), "{:?}", output.errors);
    match &output.program.stmts[0] {
        Stmt::Assign { value, .. } => value.to_string(),
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn precedence() {
    assert_eq!(first_assigned_value("x = 1 + 2 * 3;"), "+(1, *(2, 3))");
    assert_eq!(first_assigned_value("x = 1 * 2 + 3;"), "+(*(1, 2), 3)");
    assert_eq!(first_assigned_value("x = (1 + 2) * 3;"), "*(+(1, 2), 3)");
}

#[test]
fn associativity() {
    assert_eq!(first_assigned_value("x = 1 - 2 - 3;"), "-(-(1, 2), 3)");
}

#[test]
fn scope_purge() {
    let mut table = SymbolTable::new();
    table.declare("y", Type::Int, Span::dummy()).unwrap();
    table.enter_scope();
    table.declare("z", Type::Int, Span::dummy()).unwrap();
    table.exit_scope();

    assert!(table.lookup("z").is_none());
    assert!(table.lookup("y").is_some());
}

#[test]
fn shadowing() {
    let mut table = SymbolTable::new();
    table.declare("x", Type::Int, Span::dummy()).unwrap();
    table.enter_scope();
    assert!(table.declare("x", Type::Int, Span::dummy()).is_ok());
    assert_eq!(table.lookup("x").map(|s| s.scope_level), Some(1));
}

#[test]
fn redeclaration() {
    let result = check("int x;\nint x;\n");
    assert!(result.parse_errors.is_empty());
    assert_eq!(result.semantic_errors.len(), 1);
    assert!(matches!(
        &result.semantic_errors[0],
        Error::RedeclaredVariable { name, previous_line: 1, .. } if name == "x"
    ));
    assert_eq!(result.globals.len(), 1);
    assert_eq!(result.globals[0].line_declared, 1);
}

#[test]
fn initialization_gating() {
    let result = check("int x; int y; y = x;");
    assert_eq!(result.semantic_errors.len(), 1);
    assert!(matches!(result.semantic_errors[0], Error::UninitializedVariable { .. }));

    let result = check("int x; int y; x = 3; y = x;");
    assert!(result.is_ok());
}

#[test]
fn repeated_analysis_is_identical() {
    let output = parse("int a; b = a; if a { int a; } int a;");
    let first = analyze(&output.program);
    let second = analyze(&output.program);
    assert_eq!(first.errors, second.errors);
    assert!(!first.errors.is_empty());
}

#[test]
fn end_to_end_clean_program() {
    let result = check("int x; x = 42; if (x > 0) { int y; y = x + 10; }");
    assert!(result.is_ok(), "{:?}", result.errors().collect::<Vec<_>>());

    let stmts = &result.program.stmts;
    assert_eq!(stmts.len(), 3);
    assert!(matches!(stmts[0], Stmt::VarDecl { .. }));
    assert!(matches!(stmts[1], Stmt::Assign { .. }));
    assert!(matches!(stmts[2], Stmt::If { .. }));
}

#[test]
fn end_to_end_undeclared() {
    let result = check("x = 5;");
    assert!(result.parse_errors.is_empty());
    assert_eq!(result.semantic_errors.len(), 1);
    assert!(matches!(
        &result.semantic_errors[0],
        Error::UndeclaredVariable { name, .. } if name == "x"
    ));
}

#[test]
fn syntax_and_semantic_errors_together() {
    let source = "\
int x;
x = 1
int y;
if x > 0 { z = 2; }
repeat { print x; } until x;
";
    let result = check(source);
    let phases: Vec<_> = result.errors().map(|e| e.phase()).collect();
    assert_eq!(phases, vec![Phase::Syntax, Phase::Semantic]);

    let missing = result.parse_errors[0].span().unwrap();
    assert_eq!((missing.line, missing.column), (3, 1));
    assert_eq!(result.semantic_errors[0].lexeme(), Some("z"));
}

#[test]
fn statements_after_missing_brace_are_checked() {
    let result = check("int x; x = 1; while x x = 0; print q;");
    assert_eq!(result.parse_errors.len(), 1);
    assert!(matches!(result.parse_errors[0], Error::MissingBlock { brace: '{', .. }));
    assert_eq!(result.semantic_errors.len(), 1);
    assert_eq!(result.semantic_errors[0].lexeme(), Some("q"));
}

#[test]
fn factorial_program() {
    let source = "\
int n;
int r;
n = 5;
r = factorial(n) / 2;
repeat {
    n = n - 1;
} until (n == 0);
print r;
";
    let result = check(source);
    assert!(result.is_ok(), "{:?}", result.errors().collect::<Vec<_>>());
    match &result.program.stmts[3] {
        Stmt::Assign { value: Expr::Binary { left, .. }, .. } => {
            assert!(matches!(**left, Expr::Factorial { .. }));
        }
        other => panic!("unexpected statement {:?}", other),
    }
    let names: Vec<_> = result.globals.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["n", "r"]);
}

#[test]
fn lexical_errors_surface_through_check() {
    let result = check("int x; x = 5y;");
    assert_eq!(result.parse_errors[0].phase(), Phase::Lexical);
    assert_eq!(result.parse_errors[0].lexeme(), Some("5y"));
    assert_eq!(result.parse_errors.len(), 1);
}
