//! Walks the typed tree and drives a [`Backend`] through its operation set.
//!
//! The walk is a single top-down pass in source order. Every expression is
//! evaluated with a `used` flag so backends can skip storage for values
//! nobody reads.

use crate::ast::*;
use crate::codegen::{Backend, Invocation};
use crate::error::{CodegenError, CodegenResult};

pub struct Transpiler<B: Backend> {
    backend: B,
}

/// Runs one full generation with `backend` and returns the script text.
pub fn transpile<B: Backend>(program: &Program, backend: B) -> CodegenResult<String> {
    Transpiler::new(backend).run(program)
}

impl<B: Backend> Transpiler<B> {
    pub fn new(backend: B) -> Self {
        Transpiler { backend }
    }

    pub fn run(mut self, program: &Program) -> CodegenResult<String> {
        self.backend.program_start()?;
        self.block(&program.statements)?;
        self.backend.program_end()
    }

    /// An empty block still yields one instruction.
    fn block(&mut self, stmts: &[Stmt]) -> CodegenResult<()> {
        if stmts.is_empty() {
            return self.backend.no_op();
        }
        for stmt in stmts {
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn statement(&mut self, stmt: &Stmt) -> CodegenResult<()> {
        match stmt {
            Stmt::VarDefinition { targets, value, .. } => match value {
                None => {
                    for t in targets {
                        self.backend.var_definition(&t.name, t.ty, None)?;
                    }
                    Ok(())
                }
                Some(value) => {
                    let frags = self.evaluate_many(value, targets.len())?;
                    for (t, frag) in targets.iter().zip(&frags) {
                        if t.name != "_" {
                            self.backend.var_definition(&t.name, t.ty, Some(frag))?;
                        }
                    }
                    Ok(())
                }
            },
            Stmt::VarAssignment { targets, value } => {
                let frags = self.evaluate_many(value, targets.len())?;
                for (t, frag) in targets.iter().zip(&frags) {
                    if t.name != "_" {
                        self.backend.var_assignment(&t.name, t.ty, frag)?;
                    }
                }
                Ok(())
            }
            Stmt::ListAssignment {
                target,
                index,
                value,
            } => {
                let index = self.evaluate(index, true)?;
                let value = self.evaluate(value, true)?;
                self.backend
                    .list_assignment(&target.name, target.ty.element(), &index, &value)
            }
            Stmt::FunctionDefinition {
                name,
                params,
                returns,
                body,
            } => {
                self.backend.function_start(name, params, returns)?;
                self.block(body)?;
                self.backend.function_end()
            }
            Stmt::Return(values) => {
                let mut out = Vec::new();
                if let [single] = values.as_slice() {
                    if single.types.len() > 1 && !matches!(single.kind, ExprKind::Process(_)) {
                        let frags = self.evaluate_many(single, single.types.len())?;
                        out.extend(frags.into_iter().zip(single.types.iter().copied()));
                    }
                }
                if out.is_empty() {
                    for value in values {
                        let frag = self.evaluate(value, true)?;
                        out.push((frag, value.ty()));
                    }
                }
                self.backend.return_values(&out)
            }
            Stmt::If {
                branches,
                else_body,
            } => {
                // Every condition is evaluated before the first branch is
                // entered.
                let mut conditions = Vec::with_capacity(branches.len());
                for branch in branches {
                    conditions.push(self.evaluate(&branch.condition, true)?);
                }
                for (i, (branch, cond)) in branches.iter().zip(&conditions).enumerate() {
                    if i == 0 {
                        self.backend.if_start(cond)?;
                    } else {
                        self.backend.else_if_start(cond)?;
                    }
                    self.block(&branch.body)?;
                }
                if let Some(body) = else_body {
                    self.backend.else_start()?;
                    self.block(body)?;
                }
                self.backend.if_end()
            }
            Stmt::For {
                init,
                condition,
                post,
                body,
            } => {
                if let Some(init) = init {
                    self.statement(init)?;
                }
                self.backend.for_start()?;
                self.backend.for_increment_start()?;
                match post {
                    Some(post) => self.statement(post)?,
                    None => self.backend.no_op()?,
                }
                self.backend.for_increment_end()?;
                if let Some(condition) = condition {
                    let cond = self.evaluate(condition, true)?;
                    self.backend.for_condition(&cond)?;
                }
                self.block(body)?;
                self.backend.for_end()
            }
            Stmt::Break => self.backend.break_loop(),
            Stmt::Continue => self.backend.continue_loop(),
            Stmt::Print(value) => {
                let frag = self.evaluate(value, true)?;
                self.backend.print(&frag, value.ty())
            }
            Stmt::Panic(message) => {
                let frag = self.evaluate(message, true)?;
                self.backend.panic(&frag)
            }
            Stmt::WriteFile {
                path,
                content,
                append,
            } => {
                let path = self.evaluate(path, true)?;
                let content = self.evaluate(content, true)?;
                self.backend.write_file(&path, &content, *append)
            }
            Stmt::Expression(expr) => match &expr.kind {
                ExprKind::Process(chain) => {
                    let chain = self.invocations(chain)?;
                    self.backend.process_call(&chain, 0).map(drop)
                }
                _ => self.evaluate(expr, false).map(drop),
            },
            Stmt::NoOp => self.backend.no_op(),
        }
    }

    fn invocations(&mut self, chain: &[ProcessCall]) -> CodegenResult<Vec<Invocation>> {
        let mut out = Vec::with_capacity(chain.len());
        for call in chain {
            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(self.evaluate(arg, true)?);
            }
            out.push(Invocation {
                name: call.name.clone(),
                args,
            });
        }
        Ok(out)
    }

    fn arguments(&mut self, args: &[Expr]) -> CodegenResult<Vec<(String, ValueType)>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            out.push((self.evaluate(arg, true)?, arg.ty()));
        }
        Ok(out)
    }

    /// Fragments for a destructuring target list of length `count`.
    fn evaluate_many(&mut self, expr: &Expr, count: usize) -> CodegenResult<Vec<String>> {
        let frags = match &expr.kind {
            ExprKind::Call { name, args } => {
                let args = self.arguments(args)?;
                self.backend.function_call(name, &args, &expr.types, true)?
            }
            ExprKind::Process(chain) => {
                let chain = self.invocations(chain)?;
                self.backend.process_call(&chain, count)?
            }
            _ => vec![self.evaluate(expr, true)?],
        };
        if frags.len() < count {
            return Err(CodegenError::ValueCount {
                name: describe(expr),
                expected: count,
                got: frags.len(),
            });
        }
        Ok(frags)
    }

    fn evaluate(&mut self, expr: &Expr, used: bool) -> CodegenResult<String> {
        let ty = expr.ty();
        match &expr.kind {
            ExprKind::Bool(b) => self.backend.bool_literal(*b),
            ExprKind::Int(n) => self.backend.int_literal(*n),
            ExprKind::String(s) => self.backend.string_literal(s),
            ExprKind::Unary { op, operand } => {
                let v = self.evaluate(operand, true)?;
                self.backend.unary(*op, &v, operand.ty(), used)
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.evaluate(left, true)?;
                let r = self.evaluate(right, true)?;
                self.backend.binary(*op, &l, &r, left.ty(), used)
            }
            ExprKind::Compare { op, left, right } => {
                let l = self.evaluate(left, true)?;
                let r = self.evaluate(right, true)?;
                self.backend.compare(*op, &l, &r, left.ty(), used)
            }
            ExprKind::Logical { op, left, right } => {
                let l = self.evaluate(left, true)?;
                let r = self.evaluate(right, true)?;
                self.backend.logical(*op, &l, &r, used)
            }
            ExprKind::Var(name) => self.backend.var_evaluation(name, ty),
            ExprKind::ListLiteral(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item, true)?);
                }
                self.backend.list_literal(ty.element(), &values, used)
            }
            ExprKind::ListElement { list, index } => {
                let l = self.evaluate(list, true)?;
                let i = self.evaluate(index, true)?;
                self.backend.list_element(&l, ty, &i)
            }
            ExprKind::ListLength(list) => {
                let l = self.evaluate(list, true)?;
                self.backend.list_length(&l, used)
            }
            ExprKind::StringSubscript { value, start, end } => {
                let v = self.evaluate(value, true)?;
                let s = self.evaluate(start, true)?;
                let e = match end {
                    Some(end) => Some(self.evaluate(end, true)?),
                    None => None,
                };
                self.backend.string_subscript(&v, &s, e.as_deref(), used)
            }
            ExprKind::StringLength(value) => {
                let v = self.evaluate(value, true)?;
                self.backend.string_length(&v, used)
            }
            ExprKind::Group(inner) => {
                let v = self.evaluate(inner, used)?;
                self.backend.group(&v, ty)
            }
            ExprKind::Call { name, args } => {
                let args = self.arguments(args)?;
                let frags = self.backend.function_call(name, &args, &expr.types, used)?;
                if !used {
                    return Ok(String::new());
                }
                frags.into_iter().next().ok_or_else(|| CodegenError::ValueCount {
                    name: name.clone(),
                    expected: 1,
                    got: 0,
                })
            }
            ExprKind::Process(chain) => {
                let chain = self.invocations(chain)?;
                let results = usize::from(used);
                let frags = self.backend.process_call(&chain, results)?;
                Ok(frags.into_iter().next().unwrap_or_default())
            }
            ExprKind::Input(prompt) => {
                let p = match prompt {
                    Some(p) => Some(self.evaluate(p, true)?),
                    None => None,
                };
                self.backend.input(p.as_deref(), used)
            }
            ExprKind::Copy(list) => {
                let l = self.evaluate(list, true)?;
                self.backend.copy_list(&l, ty.element(), used)
            }
            ExprKind::FileExists(path) => {
                let p = self.evaluate(path, true)?;
                self.backend.file_exists(&p, used)
            }
            ExprKind::ReadFile(path) => {
                let p = self.evaluate(path, true)?;
                self.backend.read_file(&p, used)
            }
            ExprKind::Itoa(value) => {
                let v = self.evaluate(value, true)?;
                self.backend.itoa(&v, used)
            }
            ExprKind::Atoi(value) => {
                let v = self.evaluate(value, true)?;
                self.backend.atoi(&v, used)
            }
        }
    }
}

fn describe(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Call { name, .. } => name.clone(),
        ExprKind::Process(chain) => chain
            .iter()
            .map(|c| format!("@{}", c.name))
            .collect::<Vec<_>>()
            .join(" | "),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Target;

    /// Records every contract call as one line of text.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        next: usize,
    }

    impl Recorder {
        fn log(&mut self, s: String) -> CodegenResult<()> {
            self.calls.push(s);
            Ok(())
        }

        fn value(&mut self, s: String) -> CodegenResult<String> {
            self.calls.push(s);
            self.next += 1;
            Ok(format!("v{}", self.next))
        }
    }

    impl Backend for Recorder {
        fn program_start(&mut self) -> CodegenResult<()> {
            self.log("start".into())
        }
        fn program_end(&mut self) -> CodegenResult<String> {
            self.calls.push("end".into());
            Ok(self.calls.join("\n"))
        }
        fn bool_literal(&mut self, value: bool) -> CodegenResult<String> {
            Ok(value.to_string())
        }
        fn int_literal(&mut self, value: i64) -> CodegenResult<String> {
            Ok(value.to_string())
        }
        fn string_literal(&mut self, value: &str) -> CodegenResult<String> {
            Ok(format!("'{}'", value))
        }
        fn var_definition(&mut self, name: &str, _ty: ValueType, value: Option<&str>) -> CodegenResult<()> {
            self.log(format!("def {} {:?}", name, value))
        }
        fn var_assignment(&mut self, name: &str, _ty: ValueType, value: &str) -> CodegenResult<()> {
            self.log(format!("set {} {}", name, value))
        }
        fn list_assignment(&mut self, name: &str, _elem: ValueType, index: &str, value: &str) -> CodegenResult<()> {
            self.log(format!("store {}[{}] {}", name, index, value))
        }
        fn var_evaluation(&mut self, name: &str, _ty: ValueType) -> CodegenResult<String> {
            Ok(name.to_string())
        }
        fn list_element(&mut self, list: &str, _elem: ValueType, index: &str) -> CodegenResult<String> {
            Ok(format!("{}[{}]", list, index))
        }
        fn if_start(&mut self, condition: &str) -> CodegenResult<()> {
            self.log(format!("if {}", condition))
        }
        fn else_if_start(&mut self, condition: &str) -> CodegenResult<()> {
            self.log(format!("elif {}", condition))
        }
        fn else_start(&mut self) -> CodegenResult<()> {
            self.log("else".into())
        }
        fn if_end(&mut self) -> CodegenResult<()> {
            self.log("endif".into())
        }
        fn for_start(&mut self) -> CodegenResult<()> {
            self.log("loop".into())
        }
        fn for_increment_start(&mut self) -> CodegenResult<()> {
            self.log("post{".into())
        }
        fn for_increment_end(&mut self) -> CodegenResult<()> {
            self.log("}post".into())
        }
        fn for_condition(&mut self, condition: &str) -> CodegenResult<()> {
            self.log(format!("while {}", condition))
        }
        fn for_end(&mut self) -> CodegenResult<()> {
            self.log("endloop".into())
        }
        fn break_loop(&mut self) -> CodegenResult<()> {
            self.log("break".into())
        }
        fn continue_loop(&mut self) -> CodegenResult<()> {
            self.log("continue".into())
        }
        fn function_start(&mut self, name: &str, params: &[Target], _returns: &[ValueType]) -> CodegenResult<()> {
            let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
            self.log(format!("func {}({})", name, names.join(",")))
        }
        fn function_end(&mut self) -> CodegenResult<()> {
            self.log("endfunc".into())
        }
        fn return_values(&mut self, values: &[(String, ValueType)]) -> CodegenResult<()> {
            let v: Vec<_> = values.iter().map(|(f, _)| f.as_str()).collect();
            self.log(format!("return {}", v.join(",")))
        }
        fn unary(&mut self, op: UnaryOp, operand: &str, _ty: ValueType, _used: bool) -> CodegenResult<String> {
            self.value(format!("{}{}", op.symbol(), operand))
        }
        fn binary(&mut self, op: BinaryOp, left: &str, right: &str, _ty: ValueType, _used: bool) -> CodegenResult<String> {
            self.value(format!("{} {} {}", left, op.symbol(), right))
        }
        fn compare(&mut self, op: CompareOp, left: &str, right: &str, _ty: ValueType, _used: bool) -> CodegenResult<String> {
            self.value(format!("{} {} {}", left, op.symbol(), right))
        }
        fn logical(&mut self, op: LogicalOp, left: &str, right: &str, _used: bool) -> CodegenResult<String> {
            self.value(format!("{} {} {}", left, op.symbol(), right))
        }
        fn print(&mut self, value: &str, _ty: ValueType) -> CodegenResult<()> {
            self.log(format!("print {}", value))
        }
        fn panic(&mut self, message: &str) -> CodegenResult<()> {
            self.log(format!("panic {}", message))
        }
        fn list_literal(&mut self, _elem: ValueType, values: &[String], _used: bool) -> CodegenResult<String> {
            self.value(format!("list {}", values.join(",")))
        }
        fn list_length(&mut self, list: &str, _used: bool) -> CodegenResult<String> {
            self.value(format!("len {}", list))
        }
        fn string_subscript(&mut self, value: &str, start: &str, end: Option<&str>, _used: bool) -> CodegenResult<String> {
            self.value(format!("sub {} {} {:?}", value, start, end))
        }
        fn string_length(&mut self, value: &str, _used: bool) -> CodegenResult<String> {
            self.value(format!("strlen {}", value))
        }
        fn group(&mut self, inner: &str, _ty: ValueType) -> CodegenResult<String> {
            Ok(format!("({})", inner))
        }
        fn function_call(
            &mut self,
            name: &str,
            args: &[(String, ValueType)],
            returns: &[ValueType],
            used: bool,
        ) -> CodegenResult<Vec<String>> {
            let a: Vec<_> = args.iter().map(|(f, _)| f.as_str()).collect();
            self.calls.push(format!("call {}({}) used={}", name, a.join(","), used));
            if !used {
                return Ok(vec![]);
            }
            Ok((0..returns.len()).map(|i| format!("{}.{}", name, i)).collect())
        }
        fn process_call(&mut self, chain: &[Invocation], results: usize) -> CodegenResult<Vec<String>> {
            let names: Vec<_> = chain.iter().map(|c| c.name.as_str()).collect();
            self.calls.push(format!("run {} results={}", names.join("|"), results));
            Ok((0..results).map(|i| format!("proc.{}", i)).collect())
        }
        fn input(&mut self, _prompt: Option<&str>, _used: bool) -> CodegenResult<String> {
            self.value("input".into())
        }
        fn copy_list(&mut self, list: &str, _elem: ValueType, _used: bool) -> CodegenResult<String> {
            self.value(format!("copy {}", list))
        }
        fn file_exists(&mut self, path: &str, _used: bool) -> CodegenResult<String> {
            self.value(format!("exists {}", path))
        }
        fn read_file(&mut self, path: &str, _used: bool) -> CodegenResult<String> {
            self.value(format!("read {}", path))
        }
        fn write_file(&mut self, path: &str, content: &str, append: bool) -> CodegenResult<()> {
            self.log(format!("write {} {} {}", path, content, append))
        }
        fn itoa(&mut self, value: &str, _used: bool) -> CodegenResult<String> {
            Ok(value.to_string())
        }
        fn atoi(&mut self, value: &str, _used: bool) -> CodegenResult<String> {
            Ok(value.to_string())
        }
        fn no_op(&mut self) -> CodegenResult<()> {
            self.log("noop".into())
        }
    }

    fn run(src: &str) -> Vec<String> {
        let program = crate::parser::parse_source(src, "t.shb").unwrap_or_else(|d| panic!("{}", d));
        let text = transpile(&program, Recorder::default()).unwrap();
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn empty_blocks_emit_a_no_op() {
        let calls = run("if true {\n}\n");
        assert_eq!(calls, vec!["start", "if true", "noop", "endif", "end"]);
    }

    #[test]
    fn if_conditions_are_evaluated_before_any_branch() {
        let calls = run("x := 1\nif x == 1 {\n  print(1)\n} else if x == 2 {\n  print(2)\n} else {\n  print(3)\n}\n");
        let first_branch = calls.iter().position(|c| c == "if v1").unwrap();
        let second_cond = calls.iter().position(|c| c == "x == 2").unwrap();
        assert!(second_cond < first_branch, "{:?}", calls);
        assert!(calls.contains(&"elif v2".to_string()));
    }

    #[test]
    fn loop_protocol_order() {
        let calls = run("for i := 0; i < 2; i++ {\n  print(i)\n}\n");
        assert_eq!(
            calls,
            vec![
                "start",
                "def i Some(\"0\")",
                "loop",
                "post{",
                "i + 1",
                "set i v1",
                "}post",
                "i < 2",
                "while v2",
                "print i",
                "endloop",
                "end",
            ]
        );
    }

    #[test]
    fn multi_value_call_feeds_each_target() {
        let calls = run("func two() (int, string) {\n  return 1, \"a\"\n}\na, b := two()\n");
        assert!(calls.contains(&"call two() used=true".to_string()));
        assert!(calls.contains(&"def a Some(\"two.0\")".to_string()));
        assert!(calls.contains(&"def b Some(\"two.1\")".to_string()));
    }

    #[test]
    fn discarded_call_is_not_used() {
        let calls = run("func f() int {\n  return 1\n}\nf()\n");
        assert!(calls.contains(&"call f() used=false".to_string()));
    }

    #[test]
    fn process_statement_captures_nothing() {
        let calls = run("@ls{}\nout, code_err := @ls{}\n");
        assert!(calls.contains(&"run ls results=0".to_string()));
        assert!(calls.contains(&"run ls results=2".to_string()));
    }

    #[test]
    fn underscore_target_is_skipped() {
        let calls = run("_, err := @ls{}\n");
        assert!(!calls.iter().any(|c| c.starts_with("def _")));
        assert!(calls.contains(&"def err Some(\"proc.1\")".to_string()));
    }
}
