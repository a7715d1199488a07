//! Bash backend.
//!
//! Scalars travel as text inside double quotes: bools are `1`/`0`, ints are
//! arithmetic-safe words. Lists are indexed arrays named by their fragment.
//! User variables are emitted as `v_<name>` so they never meet bash's own
//! variables, and every variable or helper created inside a function is
//! declared `local`.

use crate::ast::{BaseType, BinaryOp, CompareOp, LogicalOp, Target, UnaryOp, ValueType};
use crate::codegen::{Backend, Invocation};
use crate::error::{CodegenError, CodegenResult};

const INDENT: &str = "  ";

/// Prelude pieces a run actually needs.
#[derive(Debug, Default, Clone)]
struct PreludeUsage {
    list_set: bool,
    capture: bool,
}

#[derive(Debug, Default)]
pub struct BashBackend {
    lines: Vec<String>,
    depth: usize,
    helpers: usize,
    loop_flags: Vec<String>,
    loops: usize,
    in_function: bool,
    usage: PreludeUsage,
}

impl BashBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        self.lines.push(format!("{}{}", INDENT.repeat(self.depth), line));
    }

    fn helper(&mut self) -> String {
        self.helpers += 1;
        format!("__sb_h{}", self.helpers)
    }

    fn local(&self) -> &'static str {
        if self.in_function { "local " } else { "" }
    }

    fn local_array(&self) -> &'static str {
        if self.in_function { "local -a " } else { "" }
    }

    /// Stores a scalar fragment in a fresh helper and returns its name.
    fn store(&mut self, value: &str) -> String {
        let h = self.helper();
        let local = self.local();
        self.emit(format!("{}{}=\"{}\"", local, h, value));
        h
    }

    /// Name of a plain variable read, so it can be sliced in place.
    fn plain_name(fragment: &str) -> Option<&str> {
        let inner = fragment.strip_prefix("${")?.strip_suffix('}')?;
        let mut chars = inner.chars();
        let first = chars.next()?;
        if (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            Some(inner)
        } else {
            None
        }
    }

    fn materialize(&mut self, fragment: &str) -> String {
        match Self::plain_name(fragment) {
            Some(name) => name.to_string(),
            None => self.store(fragment),
        }
    }

    fn command_line(chain: &[Invocation]) -> String {
        chain
            .iter()
            .map(|call| {
                let mut seg = format!("command \"{}\"", escape(&call.name));
                for arg in &call.args {
                    seg.push_str(&format!(" \"{}\"", arg));
                }
                seg
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn prelude(&self) -> String {
        let mut s = String::new();
        if self.usage.list_set {
            s.push_str(
                r#"__sb_list_set() {
  local __n="$1" __i="$2" __v="$3" __d="$4" __len
  eval "__len=\${#${__n}[@]}"
  while [ "${__len}" -lt "${__i}" ]; do
    eval "${__n}[${__len}]=\"\${__d}\""
    __len=$(( __len + 1 ))
  done
  eval "${__n}[${__i}]=\"\${__v}\""
}
"#,
            );
        }
        if self.usage.capture {
            s.push_str("__sb_cap_err=\"$(mktemp)\"\n");
            s.push_str("trap 'rm -f \"${__sb_cap_err}\"' EXIT\n");
        }
        s
    }
}

/// Escapes text for a double-quoted bash word.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' | '"' | '$' | '`' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

fn variable(name: &str) -> String {
    format!("v_{}", name)
}

fn unsupported(op: &'static str, ty: ValueType) -> CodegenError {
    CodegenError::UnsupportedOperator { op, ty }
}

impl Backend for BashBackend {
    fn program_start(&mut self) -> CodegenResult<()> {
        Ok(())
    }

    fn program_end(&mut self) -> CodegenResult<String> {
        if self.depth != 0 || !self.loop_flags.is_empty() {
            return Err(CodegenError::Unbalanced { construct: "block" });
        }
        let mut out = String::from("#!/usr/bin/env bash\n");
        out.push_str(&self.prelude());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        Ok(out)
    }

    fn bool_literal(&mut self, value: bool) -> CodegenResult<String> {
        Ok(if value { "1" } else { "0" }.to_string())
    }

    fn int_literal(&mut self, value: i64) -> CodegenResult<String> {
        Ok(value.to_string())
    }

    fn string_literal(&mut self, value: &str) -> CodegenResult<String> {
        Ok(escape(value))
    }

    fn var_definition(&mut self, name: &str, ty: ValueType, value: Option<&str>) -> CodegenResult<()> {
        let var = variable(name);
        if ty.is_list {
            let local = self.local_array();
            match value {
                Some(src) => self.emit(format!("{}{}=( \"${{{}[@]}}\" )", local, var, src)),
                None => self.emit(format!("{}{}=()", local, var)),
            }
        } else {
            let local = self.local();
            let value = value.unwrap_or(ty.default_text());
            self.emit(format!("{}{}=\"{}\"", local, var, value));
        }
        Ok(())
    }

    fn var_assignment(&mut self, name: &str, ty: ValueType, value: &str) -> CodegenResult<()> {
        let var = variable(name);
        if ty.is_list {
            self.emit(format!("{}=( \"${{{}[@]}}\" )", var, value));
        } else {
            self.emit(format!("{}=\"{}\"", var, value));
        }
        Ok(())
    }

    fn list_assignment(&mut self, name: &str, elem: ValueType, index: &str, value: &str) -> CodegenResult<()> {
        self.usage.list_set = true;
        self.emit(format!(
            "__sb_list_set {} \"{}\" \"{}\" \"{}\"",
            variable(name),
            index,
            value,
            elem.default_text()
        ));
        Ok(())
    }

    fn var_evaluation(&mut self, name: &str, ty: ValueType) -> CodegenResult<String> {
        if ty.is_list {
            Ok(variable(name))
        } else {
            Ok(format!("${{{}}}", variable(name)))
        }
    }

    fn list_element(&mut self, list: &str, _elem: ValueType, index: &str) -> CodegenResult<String> {
        Ok(format!("${{{}[{}]}}", list, index))
    }

    fn if_start(&mut self, condition: &str) -> CodegenResult<()> {
        self.emit(format!("if [ \"{}\" = 1 ]; then", condition));
        self.depth += 1;
        Ok(())
    }

    fn else_if_start(&mut self, condition: &str) -> CodegenResult<()> {
        self.depth = self.depth.checked_sub(1).ok_or(CodegenError::Unbalanced { construct: "if" })?;
        self.emit(format!("elif [ \"{}\" = 1 ]; then", condition));
        self.depth += 1;
        Ok(())
    }

    fn else_start(&mut self) -> CodegenResult<()> {
        self.depth = self.depth.checked_sub(1).ok_or(CodegenError::Unbalanced { construct: "if" })?;
        self.emit("else");
        self.depth += 1;
        Ok(())
    }

    fn if_end(&mut self) -> CodegenResult<()> {
        self.depth = self.depth.checked_sub(1).ok_or(CodegenError::Unbalanced { construct: "if" })?;
        self.emit("fi");
        Ok(())
    }

    fn for_start(&mut self) -> CodegenResult<()> {
        self.loops += 1;
        let flag = format!("__sb_loop{}", self.loops);
        let local = self.local();
        self.emit(format!("{}{}=1", local, flag));
        self.emit("while true; do");
        self.depth += 1;
        self.loop_flags.push(flag);
        Ok(())
    }

    fn for_increment_start(&mut self) -> CodegenResult<()> {
        let flag = self
            .loop_flags
            .last()
            .cloned()
            .ok_or(CodegenError::Unbalanced { construct: "for" })?;
        self.emit(format!("if [ \"${{{}}}\" = 1 ]; then", flag));
        self.depth += 1;
        self.emit(format!("{}=0", flag));
        self.depth -= 1;
        self.emit("else");
        self.depth += 1;
        Ok(())
    }

    fn for_increment_end(&mut self) -> CodegenResult<()> {
        self.depth = self.depth.checked_sub(1).ok_or(CodegenError::Unbalanced { construct: "for" })?;
        self.emit("fi");
        Ok(())
    }

    fn for_condition(&mut self, condition: &str) -> CodegenResult<()> {
        self.emit(format!("if [ \"{}\" != 1 ]; then break; fi", condition));
        Ok(())
    }

    fn for_end(&mut self) -> CodegenResult<()> {
        self.loop_flags
            .pop()
            .ok_or(CodegenError::Unbalanced { construct: "for" })?;
        self.depth = self.depth.checked_sub(1).ok_or(CodegenError::Unbalanced { construct: "for" })?;
        self.emit("done");
        Ok(())
    }

    fn break_loop(&mut self) -> CodegenResult<()> {
        if self.loop_flags.is_empty() {
            return Err(CodegenError::OutsideLoop { keyword: "break" });
        }
        self.emit("break");
        Ok(())
    }

    fn continue_loop(&mut self) -> CodegenResult<()> {
        if self.loop_flags.is_empty() {
            return Err(CodegenError::OutsideLoop { keyword: "continue" });
        }
        self.emit("continue");
        Ok(())
    }

    fn function_start(&mut self, name: &str, params: &[Target], _returns: &[ValueType]) -> CodegenResult<()> {
        if self.in_function {
            return Err(CodegenError::Unbalanced { construct: "func" });
        }
        self.emit(format!("__sb_fn_{}() {{", name));
        self.depth += 1;
        self.in_function = true;
        let mut positional = 0;
        for (i, param) in params.iter().enumerate() {
            if param.ty.is_list {
                self.emit(format!("local -a {}=( \"${{__sb_arg_{}[@]}}\" )", variable(&param.name), i));
            } else {
                positional += 1;
                self.emit(format!("local {}=\"${}\"", variable(&param.name), positional));
            }
        }
        Ok(())
    }

    fn function_end(&mut self) -> CodegenResult<()> {
        self.depth = self.depth.checked_sub(1).ok_or(CodegenError::Unbalanced { construct: "func" })?;
        self.emit("}");
        self.in_function = false;
        Ok(())
    }

    fn return_values(&mut self, values: &[(String, ValueType)]) -> CodegenResult<()> {
        for (i, (value, ty)) in values.iter().enumerate() {
            if ty.is_list {
                self.emit(format!("__sb_retl_{}=( \"${{{}[@]}}\" )", i, value));
            } else {
                self.emit(format!("__sb_ret_{}=\"{}\"", i, value));
            }
        }
        self.emit("return 0");
        Ok(())
    }

    fn unary(&mut self, op: UnaryOp, operand: &str, ty: ValueType, _used: bool) -> CodegenResult<String> {
        match (op, ty.base, ty.is_list) {
            (UnaryOp::Neg, BaseType::Int, false) => Ok(format!("$(( -({}) ))", operand)),
            (UnaryOp::Not, BaseType::Bool, false) => Ok(format!("$(( !({}) ))", operand)),
            _ => Err(unsupported(op.symbol(), ty)),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &str, right: &str, ty: ValueType, _used: bool) -> CodegenResult<String> {
        match (ty.base, ty.is_list, op) {
            (BaseType::Int, false, _) => Ok(format!("$(( ({}) {} ({}) ))", left, op.symbol(), right)),
            (BaseType::String, false, BinaryOp::Add) => Ok(format!("{}{}", left, right)),
            _ => Err(unsupported(op.symbol(), ty)),
        }
    }

    fn compare(&mut self, op: CompareOp, left: &str, right: &str, ty: ValueType, _used: bool) -> CodegenResult<String> {
        if ty.is_list {
            return Err(unsupported(op.symbol(), ty));
        }
        match (ty.base, op) {
            (BaseType::Int, _) | (BaseType::Bool, CompareOp::Eq | CompareOp::NotEq) => {
                Ok(format!("$(( ({}) {} ({}) ))", left, op.symbol(), right))
            }
            (BaseType::String, CompareOp::Eq) => {
                Ok(format!("$( [ \"{}\" = \"{}\" ] && echo 1 || echo 0 )", left, right))
            }
            (BaseType::String, CompareOp::NotEq) => {
                Ok(format!("$( [ \"{}\" != \"{}\" ] && echo 1 || echo 0 )", left, right))
            }
            _ => Err(unsupported(op.symbol(), ty)),
        }
    }

    fn logical(&mut self, op: LogicalOp, left: &str, right: &str, _used: bool) -> CodegenResult<String> {
        Ok(format!("$(( ({}) {} ({}) ))", left, op.symbol(), right))
    }

    fn print(&mut self, value: &str, ty: ValueType) -> CodegenResult<()> {
        if ty.is_list {
            return Err(CodegenError::UnsupportedType {
                operation: "print",
                ty,
            });
        }
        self.emit(format!("printf '%s\\n' \"{}\"", value));
        Ok(())
    }

    fn panic(&mut self, message: &str) -> CodegenResult<()> {
        self.emit(format!("printf 'panic: %s\\n' \"{}\"", message));
        self.emit("exit 1");
        Ok(())
    }

    fn list_literal(&mut self, _elem: ValueType, values: &[String], used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        let h = self.helper();
        let local = self.local_array();
        let items: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
        if items.is_empty() {
            self.emit(format!("{}{}=()", local, h));
        } else {
            self.emit(format!("{}{}=( {} )", local, h, items.join(" ")));
        }
        Ok(h)
    }

    fn list_length(&mut self, list: &str, _used: bool) -> CodegenResult<String> {
        Ok(format!("${{#{}[@]}}", list))
    }

    fn string_subscript(&mut self, value: &str, start: &str, end: Option<&str>, used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        let name = self.materialize(value);
        Ok(match end {
            Some(end) => format!("${{{}:({}):({})-({})}}", name, start, end, start),
            None => format!("${{{}:({}):1}}", name, start),
        })
    }

    fn string_length(&mut self, value: &str, used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        let name = self.materialize(value);
        Ok(format!("${{#{}}}", name))
    }

    fn group(&mut self, inner: &str, _ty: ValueType) -> CodegenResult<String> {
        Ok(inner.to_string())
    }

    fn function_call(
        &mut self,
        name: &str,
        args: &[(String, ValueType)],
        returns: &[ValueType],
        used: bool,
    ) -> CodegenResult<Vec<String>> {
        let mut line = format!("__sb_fn_{}", name);
        for (i, (arg, ty)) in args.iter().enumerate() {
            if ty.is_list {
                self.emit(format!("__sb_arg_{}=( \"${{{}[@]}}\" )", i, arg));
            } else {
                line.push_str(&format!(" \"{}\"", arg));
            }
        }
        self.emit(line);
        if !used {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(returns.len());
        for (i, ty) in returns.iter().enumerate() {
            let h = self.helper();
            if ty.is_list {
                let local = self.local_array();
                self.emit(format!("{}{}=( \"${{__sb_retl_{}[@]}}\" )", local, h, i));
                out.push(h);
            } else {
                let local = self.local();
                self.emit(format!("{}{}=\"${{__sb_ret_{}}}\"", local, h, i));
                out.push(format!("${{{}}}", h));
            }
        }
        Ok(out)
    }

    fn process_call(&mut self, chain: &[Invocation], results: usize) -> CodegenResult<Vec<String>> {
        let cmd = Self::command_line(chain);
        match results {
            0 => {
                self.emit(cmd);
                Ok(Vec::new())
            }
            1 => {
                let h = self.helper();
                let local = self.local();
                self.emit(format!("{}{}=\"$( {} )\"", local, h, cmd));
                Ok(vec![format!("${{{}}}", h)])
            }
            _ => {
                self.usage.capture = true;
                let out = self.helper();
                let err = self.helper();
                let code = (results > 2).then(|| self.helper());
                if self.in_function {
                    let mut names = vec![out.clone(), err.clone()];
                    names.extend(code.clone());
                    self.emit(format!("local {}", names.join(" ")));
                }
                self.emit(format!("{}=\"$( ( {} ) 2>\"${{__sb_cap_err}}\" )\"", out, cmd));
                if let Some(code) = &code {
                    self.emit(format!("{}=$?", code));
                }
                self.emit(format!("{}=\"$(cat \"${{__sb_cap_err}}\")\"", err));
                let mut frags = vec![format!("${{{}}}", out), format!("${{{}}}", err)];
                frags.extend(code.map(|c| format!("${{{}}}", c)));
                Ok(frags)
            }
        }
    }

    fn input(&mut self, prompt: Option<&str>, used: bool) -> CodegenResult<String> {
        if let Some(prompt) = prompt {
            self.emit(format!("printf '%s' \"{}\"", prompt));
        }
        if !used {
            self.emit("IFS= read -r _");
            return Ok(String::new());
        }
        let h = self.helper();
        if self.in_function {
            self.emit(format!("local {}", h));
        }
        self.emit(format!("IFS= read -r {}", h));
        Ok(format!("${{{}}}", h))
    }

    fn copy_list(&mut self, list: &str, _elem: ValueType, used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        let h = self.helper();
        let local = self.local_array();
        self.emit(format!("{}{}=( \"${{{}[@]}}\" )", local, h, list));
        Ok(h)
    }

    fn file_exists(&mut self, path: &str, _used: bool) -> CodegenResult<String> {
        Ok(format!("$( [ -e \"{}\" ] && echo 1 || echo 0 )", path))
    }

    fn read_file(&mut self, path: &str, used: bool) -> CodegenResult<String> {
        if !used {
            self.emit(format!("cat \"{}\" > /dev/null", path));
            return Ok(String::new());
        }
        let h = self.helper();
        let local = self.local();
        self.emit(format!("{}{}=\"$(cat \"{}\")\"", local, h, path));
        Ok(format!("${{{}}}", h))
    }

    fn write_file(&mut self, path: &str, content: &str, append: bool) -> CodegenResult<()> {
        let redirect = if append { ">>" } else { ">" };
        self.emit(format!("printf '%s\\n' \"{}\" {} \"{}\"", content, redirect, path));
        Ok(())
    }

    fn itoa(&mut self, value: &str, _used: bool) -> CodegenResult<String> {
        Ok(value.to_string())
    }

    fn atoi(&mut self, value: &str, used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        let h = self.store(value);
        Ok(format!("$(( {} ))", h))
    }

    fn no_op(&mut self) -> CodegenResult<()> {
        self.emit(":");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::transpiler::transpile;

    fn generate(src: &str) -> String {
        let program = parse_source(src, "t.shb").unwrap_or_else(|d| panic!("{}", d));
        transpile(&program, BashBackend::new()).unwrap()
    }

    #[test]
    fn escape_double_quote_specials() {
        assert_eq!(escape("a\"b$c`d\\e"), "a\\\"b\\$c\\`d\\\\e");
        assert_eq!(escape("it's"), "it's");
    }

    #[test]
    fn starts_with_shebang_and_has_no_unused_prelude() {
        let out = generate("print(1)");
        assert_eq!(out, "#!/usr/bin/env bash\nprintf '%s\\n' \"1\"\n");
    }

    #[test]
    fn arithmetic_is_parenthesized() {
        let out = generate("a := 2\nb := 3\nprint(a + b * 2)");
        assert!(out.contains("v_a=\"2\""), "{}", out);
        assert!(
            out.contains("printf '%s\\n' \"$(( (${v_a}) + ($(( (${v_b}) * (2) ))) ))\""),
            "{}",
            out
        );
    }

    #[test]
    fn function_locals_and_returns() {
        let out = generate("func f(n int, l []int) (int, []int) {\n  x := n\n  return x, l\n}\na, b := f(1, []int{2})\n");
        assert!(out.contains("__sb_fn_f() {"), "{}", out);
        assert!(out.contains("  local v_n=\"$1\""), "{}", out);
        assert!(out.contains("  local -a v_l=( \"${__sb_arg_1[@]}\" )"), "{}", out);
        assert!(out.contains("  local v_x=\"${v_n}\""), "{}", out);
        assert!(out.contains("  __sb_ret_0=\"${v_x}\""), "{}", out);
        assert!(out.contains("  __sb_retl_1=( \"${v_l[@]}\" )"), "{}", out);
        assert!(out.contains("__sb_fn_f \"1\""), "{}", out);
        assert!(out.contains("v_b=( \"${__sb_h3[@]}\" )"), "{}", out);
    }

    #[test]
    fn list_assignment_pulls_in_helper() {
        let out = generate("l := []string{}\nl[2] = \"x\"\n");
        assert!(out.contains("__sb_list_set() {"), "{}", out);
        assert!(out.contains("__sb_list_set v_l \"2\" \"x\" \"\""), "{}", out);
    }

    #[test]
    fn capture_with_status_uses_temp_file() {
        let out = generate("o, e, c := @ls{\"-l\"} | @wc{}\n");
        assert!(out.contains("__sb_cap_err=\"$(mktemp)\""), "{}", out);
        assert!(
            out.contains("__sb_h1=\"$( ( command \"ls\" \"-l\" | command \"wc\" ) 2>\"${__sb_cap_err}\" )\""),
            "{}",
            out
        );
        assert!(out.contains("__sb_h3=$?"), "{}", out);
        assert!(out.contains("__sb_h2=\"$(cat \"${__sb_cap_err}\")\""), "{}", out);
    }

    #[test]
    fn loop_skips_post_on_first_pass() {
        let out = generate("for i := 0; i < 2; i++ {\n  print(i)\n}\n");
        let expected = "\
v_i=\"0\"
__sb_loop1=1
while true; do
  if [ \"${__sb_loop1}\" = 1 ]; then
    __sb_loop1=0
  else
    v_i=\"$(( (${v_i}) + (1) ))\"
  fi
  if [ \"$(( (${v_i}) < (2) ))\" != 1 ]; then break; fi
  printf '%s\\n' \"${v_i}\"
done
";
        assert!(out.ends_with(expected), "{}", out);
    }

    #[test]
    fn substring_slices_variable_in_place() {
        let out = generate("a := \"test\"\nprint(a[1:3])\n");
        assert!(out.contains("printf '%s\\n' \"${v_a:(1):(3)-(1)}\""), "{}", out);
    }

    #[test]
    fn unsupported_operator_is_rejected() {
        let mut b = BashBackend::new();
        let err = b.binary(BinaryOp::Sub, "a", "b", ValueType::STRING, true).unwrap_err();
        assert_eq!(
            err,
            CodegenError::UnsupportedOperator {
                op: "-",
                ty: ValueType::STRING
            }
        );
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let mut b = BashBackend::new();
        assert_eq!(
            b.break_loop(),
            Err(CodegenError::OutsideLoop { keyword: "break" })
        );
    }
}
