mod common;
use common::*;

fn assert_err_contains(src: &str, part: &str) {
    let msg = compile_err(src);
    assert!(msg.contains(part), "expected '{}' in '{}'", part, msg);
}

#[test]
fn message_carries_row_and_column() {
    assert_eq!(
        compile_err("a := 1\nprint(b)\n"),
        "undeclared variable 'b' at row 2, column 7"
    );
}

#[test]
fn unterminated_string_is_lexical_error() {
    assert_err_contains("print(\"abc\n", "unterminated string at row 1, column 7");
}

#[test]
fn syntax_error_names_what_was_expected() {
    assert_err_contains("print(1", "expected ')'");
}

#[test]
fn redeclaration_is_rejected() {
    assert_err_contains("x := 1\nx := 2\n", "variable 'x' is already declared");
}

#[test]
fn type_mismatch_is_rejected() {
    assert_err_contains("print(1 + \"a\")\n", "mismatched types int and string for operator '+'");
    assert_err_contains("print(\"a\" - \"b\")\n", "operator '-' is not defined for string");
    assert_err_contains("print(\"a\" < \"b\")\n", "operator '<' is not defined for string");
}

#[test]
fn constants_cannot_be_assigned() {
    assert_err_contains("const c = 1\nc = 2\n", "cannot assign to constant 'c'");
}

#[test]
fn control_keywords_need_an_enclosing_scope() {
    assert_err_contains("break\n", "break is only allowed inside a loop");
    assert_err_contains("continue\n", "continue is only allowed inside a loop");
    assert_err_contains("return\n", "return is only allowed inside a function");
}

#[test]
fn function_with_results_must_end_in_return() {
    assert_err_contains(
        "func f() int {\n  print(1)\n}\n",
        "function 'f' must end with a return statement",
    );
}

#[test]
fn unknown_function_is_reported() {
    assert_err_contains("foo()\n", "undeclared function 'foo'");
}

#[test]
fn builtin_names_are_reserved() {
    assert_err_contains("read := 1\n", "'read' is a builtin and cannot be redeclared");
}

#[test]
fn range_needs_list_or_string() {
    assert_err_contains("n := 3\nfor i := range n {\n}\n", "cannot range over int");
}
