mod common;
mod expr;
pub mod scope;
mod stmt;

use self::common::{ParsResult, Parser};
use crate::ast::Program;
use crate::lexer::{self, Token, TokenKind};
use crate::span::{Position, SourceMap};

/// Builds the typed tree in one pass. The first error aborts the parse.
pub fn parse(tokens: &[Token], sm: &SourceMap, file: &str) -> ParsResult<Program> {
    let mut tokens: Vec<Token> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .cloned()
        .collect();
    if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
        let pos = tokens.last().map(|t| t.pos).unwrap_or(Position::new(1, 1));
        tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            pos,
        });
    }

    let mut parser = Parser::new(&tokens, sm, file);
    let statements = parser.parse_block_until(&TokenKind::Eof, None)?;
    Ok(Program { statements })
}

/// Tokenize and parse `src` in one step.
pub fn parse_source(src: &str, file: &str) -> ParsResult<Program> {
    let sm = SourceMap::new(src.to_string());
    let tokens = lexer::lex(&sm, file)?;
    parse(&tokens, &sm, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn ok(src: &str) -> Program {
        parse_source(src, "test.shb").unwrap_or_else(|d| panic!("{}", d.format(None)))
    }

    fn err(src: &str) -> String {
        match parse_source(src, "test.shb") {
            Ok(p) => panic!("expected an error, got {:?}", p),
            Err(d) => d.to_string(),
        }
    }

    #[test]
    fn short_and_long_declarations_share_a_handler() {
        let prog = ok("var a int = 1\nb := 2\n");
        assert_eq!(prog.statements.len(), 2);
        for stmt in &prog.statements {
            match stmt {
                Stmt::VarDefinition { targets, .. } => assert_eq!(targets[0].ty, ValueType::INT),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn redeclaration_is_rejected_for_both_forms() {
        assert_eq!(err("a := 1\nvar a = 2\n"), "variable 'a' is already declared at row 2, column 5");
        assert_eq!(err("a := 1\na := 2\n"), "variable 'a' is already declared at row 2, column 1");
    }

    #[test]
    fn undeclared_names_are_reported() {
        assert_eq!(err("print(x)"), "undeclared variable 'x' at row 1, column 7");
        assert_eq!(err("f()"), "undeclared function 'f' at row 1, column 1");
    }

    #[test]
    fn undeclared_variable_suggests_close_name() {
        let d = parse_source("count := 1\nprint(conut)\n", "t.shb").unwrap_err();
        assert_eq!(d.help.as_deref(), Some("did you mean 'count'?"));
    }

    #[test]
    fn precedence_multiplication_binds_tighter() {
        let prog = ok("print(1 + 2 * 3)");
        let Stmt::Print(expr) = &prog.statements[0] else {
            panic!("expected print");
        };
        match &expr.kind {
            ExprKind::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn logical_or_is_lowest() {
        let prog = ok("print(1 < 2 && true || false)");
        let Stmt::Print(expr) = &prog.statements[0] else {
            panic!("expected print");
        };
        assert!(matches!(expr.kind, ExprKind::Logical { op: LogicalOp::Or, .. }));
    }

    #[test]
    fn operator_legality_depends_on_type() {
        assert!(err("print(\"a\" - \"b\")").starts_with("operator '-' is not defined for string"));
        assert!(err("print(\"a\" % \"b\")").starts_with("operator '%' is not defined for string"));
        assert!(err("print(true < false)").starts_with("operator '<' is not defined for bool"));
        assert!(err("print(1 + \"a\")").starts_with("mismatched types int and string"));
        ok("print(\"a\" + \"b\")");
        ok("print(true == false)");
    }

    #[test]
    fn missing_paren_reports_expectation() {
        assert_eq!(
            err("print(1"),
            "expected ')', got end of file at row 1, column 8"
        );
    }

    #[test]
    fn function_must_end_with_return() {
        let e = err("func f() int {\n  print(1)\n}\n");
        assert!(e.starts_with("function 'f' must end with a return statement"), "{}", e);
    }

    #[test]
    fn return_types_must_match() {
        let e = err("func f() int {\n  return \"x\"\n}\n");
        assert!(e.starts_with("return value 1 must be int, got string"), "{}", e);
        let e = err("func f() (int, int) {\n  return 1\n}\n");
        assert!(e.starts_with("function returns 2 values, got 1"), "{}", e);
    }

    #[test]
    fn call_arguments_are_checked() {
        let e = err("func f(a int) {\n}\nf(\"x\")\n");
        assert!(e.starts_with("argument 1 of 'f' must be int, got string"), "{}", e);
        let e = err("func f(a int) {\n}\nf()\n");
        assert!(e.starts_with("function 'f' expects 1 arguments, got 0"), "{}", e);
    }

    #[test]
    fn recursion_is_allowed() {
        ok("func fact(n int) int {\n  if n <= 1 {\n    return 1\n  }\n  return n * fact(n - 1)\n}\nprint(fact(5))\n");
    }

    #[test]
    fn multi_value_definition() {
        let prog = ok("func two() (int, string) {\n  return 1, \"a\"\n}\na, b := two()\n");
        match &prog.statements[1] {
            Stmt::VarDefinition { targets, .. } => {
                assert_eq!(targets[0].ty, ValueType::INT);
                assert_eq!(targets[1].ty, ValueType::STRING);
            }
            other => panic!("unexpected {:?}", other),
        }
        let e = err("func two() (int, string) {\n  return 1, \"a\"\n}\na := two()\n");
        assert!(e.starts_with("cannot assign 2 values to 1 variables"), "{}", e);
    }

    #[test]
    fn process_call_yields_prefix() {
        let prog = ok("out, errs, code := @ls{\"-l\"} | @wc{}\n");
        match &prog.statements[0] {
            Stmt::VarDefinition { targets, .. } => {
                let tys: Vec<_> = targets.iter().map(|t| t.ty).collect();
                assert_eq!(tys, vec![ValueType::STRING, ValueType::STRING, ValueType::INT]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn range_is_desugared_to_counted_loop() {
        let prog = ok("s := []int{1, 2}\nfor i, v := range s {\n  print(v)\n}\n");
        match &prog.statements[1] {
            Stmt::For { init, condition, post, body } => {
                assert!(matches!(init.as_deref(), Some(Stmt::VarDefinition { .. })));
                assert!(matches!(
                    condition.as_ref().map(|c| &c.kind),
                    Some(ExprKind::Compare { op: CompareOp::Lt, .. })
                ));
                assert!(matches!(post.as_deref(), Some(Stmt::VarAssignment { .. })));
                assert!(matches!(&body[0], Stmt::VarDefinition { targets, .. } if targets[0].name == "v"));
                assert!(matches!(&body[1], Stmt::Print(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn range_variables_are_removed_after_the_loop() {
        ok("s := \"ab\"\nfor i, c := range s {\n  print(c)\n}\nfor i, c := range s {\n  print(i)\n}\n");
        let e = err("s := \"ab\"\nfor i := range s {\n}\nprint(i)\n");
        assert!(e.starts_with("undeclared variable 'i'"), "{}", e);
    }

    #[test]
    fn range_over_int_is_rejected() {
        assert!(err("n := 3\nfor i := range n {\n}\n").starts_with("cannot range over int"));
    }

    #[test]
    fn loop_control_outside_loop() {
        assert!(err("break").starts_with("break is only allowed inside a loop"));
        assert!(err("continue").starts_with("continue is only allowed inside a loop"));
        assert!(err("return").starts_with("return is only allowed inside a function"));
    }

    #[test]
    fn break_in_switch_is_rejected() {
        let e = err("x := 1\nswitch x {\ncase 1:\n  break\n}\n");
        assert!(e.starts_with("break is only allowed inside a loop"), "{}", e);
    }

    #[test]
    fn switch_lowers_to_if_chain() {
        let prog = ok("x := 2\nswitch x {\ncase 1, 2:\n  print(\"low\")\ndefault:\n  print(\"high\")\n}\n");
        match &prog.statements[1] {
            Stmt::If { branches, else_body } => {
                assert_eq!(branches.len(), 1);
                assert!(matches!(branches[0].condition.kind, ExprKind::Logical { op: LogicalOp::Or, .. }));
                assert!(else_body.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn constants_cannot_be_assigned() {
        let e = err("const limit = 3\nlimit = 4\n");
        assert!(e.starts_with("cannot assign to constant 'limit'"), "{}", e);
        let e = err("const limit = 3\nlimit++\n");
        assert!(e.starts_with("cannot assign to constant 'limit'"), "{}", e);
    }

    #[test]
    fn reserved_and_builtin_names() {
        assert!(err("__x := 1").starts_with("names starting with '__' are reserved"));
        assert!(err("copy := 1").starts_with("'copy' is a builtin"));
        assert!(err("func read() {\n}\n").starts_with("'read' is a builtin"));
    }

    #[test]
    fn functions_only_at_top_level() {
        let e = err("func f() {\n  func g() {\n  }\n}\n");
        assert!(e.starts_with("functions can only be declared at top level"), "{}", e);
    }

    #[test]
    fn function_locals_do_not_leak() {
        let e = err("func f() {\n  x := 1\n}\nprint(x)\n");
        assert!(e.starts_with("undeclared variable 'x'"), "{}", e);
    }

    #[test]
    fn list_assignment_checks_element_type() {
        ok("l := []int{}\nl[3] = 4\n");
        let e = err("l := []int{}\nl[0] = \"x\"\n");
        assert!(e.starts_with("list element must be int, got string"), "{}", e);
    }

    #[test]
    fn string_subscript_forms() {
        ok("s := \"hello\"\nprint(s[1])\nprint(s[1:3])\nprint(s[:2])\nprint(s[2:])\n");
    }

    #[test]
    fn compound_assignment_on_strings() {
        ok("s := \"a\"\ns += \"b\"\n");
        assert!(err("s := \"a\"\ns -= \"b\"\n").starts_with("operator '-' is not defined for string"));
    }

    #[test]
    fn unused_expression_is_rejected() {
        assert!(err("x := 1\nx + 1\n").starts_with("expected assignment after variable, got '+'"));
        assert!(err("1 + 2").starts_with("expected statement"));
    }

    #[test]
    fn comments_are_ignored() {
        let prog = ok("// heading\nx := 1 // trailing\nprint(x)\n");
        assert_eq!(prog.statements.len(), 2);
    }
}
