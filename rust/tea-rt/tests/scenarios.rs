//! End-to-end scenarios from spec.md §8 table 2, run through the public
//! `tokenize -> parse -> eval` pipeline with the standard library loaded.
//! Mirrors the teacher's top-level `tests/` integration placement.

use tea_core::parse_source;
use tea_rt::{stdlib, Context};

fn eval_source(source: &str) -> Result<tea_rt::Value, tea_rt::RuntimeError> {
    let ast = parse_source(source).expect("scenario source must parse");
    let mut ctx = Context::new();
    ctx.load(stdlib::standard_library());
    tea_rt::eval(&ast, &mut ctx)
}

#[test]
fn scenario_1_operator_precedence() {
    let result = eval_source("1 + 2 * 3").unwrap();
    assert_eq!(result.as_int(), Some(7));
}

#[test]
fn scenario_2_parens_override_precedence() {
    let result = eval_source("(1 + 2) * 3").unwrap();
    assert_eq!(result.as_int(), Some(9));
}

#[test]
fn scenario_3_string_plus_any_concatenates() {
    let result = eval_source("\"a\" + 1").unwrap();
    assert_eq!(result.as_str(), Some("a1"));
}

#[test]
fn scenario_4_typed_declaration_then_reassignment() {
    let result = eval_source("var x: int = 5; x = x + 1; x").unwrap();
    assert_eq!(result.as_int(), Some(6));
}

#[test]
fn scenario_5_function_definition_and_call() {
    let result = eval_source("func add(a: int, b: int) { return a + b } add(2, 3)").unwrap();
    assert_eq!(result.as_int(), Some(5));
}

#[test]
fn scenario_6_while_loop() {
    let result = eval_source("var i: int = 0; while (i < 3) { i = i + 1 } i").unwrap();
    assert_eq!(result.as_int(), Some(3));
}

#[test]
fn scenario_7_if_else() {
    let result = eval_source("if (true) { 1 } else { 2 }").unwrap();
    assert_eq!(result.as_int(), Some(1));
}

#[test]
fn scenario_8_division_by_zero_raises() {
    let err = eval_source("1 / 0").unwrap_err();
    assert!(matches!(err, tea_rt::RuntimeError::RuntimeError { .. }));
}

#[test]
fn for_loop_desugars_and_runs() {
    let result = eval_source("var total: int = 0; for (var i: int = 0; i < 5; i = i + 1) { total = total + i } total").unwrap();
    assert_eq!(result.as_int(), Some(10));
}

#[test]
fn break_exits_a_loop_early() {
    let result =
        eval_source("var i: int = 0; while (true) { if (i == 3) { break } i = i + 1 } i").unwrap();
    assert_eq!(result.as_int(), Some(3));
}

#[test]
fn continue_skips_the_rest_of_the_current_iteration() {
    let result = eval_source(
        "var i: int = 0; var count: int = 0; \
         while (i < 5) { i = i + 1; if (i == 2) { continue } count = count + 1 } \
         count",
    )
    .unwrap();
    assert_eq!(result.as_int(), Some(4));
}
