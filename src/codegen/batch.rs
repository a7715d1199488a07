//! Windows batch backend.
//!
//! Batch has no arrays, no string length and no structured control flow,
//! so this backend leans on three things:
//!
//! - every value is read with delayed expansion (`!name!`), and values
//!   that need a computation are stored in `__sb_h<N>` helper variables;
//! - lists are a `<base>_len` counter plus one `<base>_<i>` variable per
//!   element, maintained by helper subroutines appended after the main
//!   program;
//! - `if` chains and loops go through a [`BlockGraph`] and come out as
//!   labels and `goto`.
//!
//! User variables are namespaced per function (`__sb_f<N>_<name>`, with
//! `N = 0` for the top level) since batch variables are global.

use std::collections::HashSet;

use crate::ast::{BaseType, BinaryOp, CompareOp, LogicalOp, Target, UnaryOp, ValueType};
use crate::codegen::blocks::{BlockGraph, Instr};
use crate::codegen::indent::indent_blocks;
use crate::codegen::{Backend, Invocation, TargetShell};
use crate::error::{CodegenError, CodegenResult};

const TARGET: &str = "batch";
const CAPTURE_CLEANUP: &str = "del \"!__sb_cap!.out\" \"!__sb_cap!.err\" 2>nul";

/// Helper subroutines and program-wide setup a run actually needs.
#[derive(Debug, Default, Clone)]
struct HelperUsage {
    list_len: bool,
    list_set: bool,
    list_copy: bool,
    strlen: bool,
    substr: bool,
    read_file: bool,
    newline: bool,
    capture: bool,
}

#[derive(Debug)]
struct FunctionFrame {
    id: usize,
    name: String,
    locals: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct BatchBackend {
    lines: Vec<String>,
    helpers: usize,
    functions: usize,
    current: Option<FunctionFrame>,
    graph: BlockGraph,
    usage: HelperUsage,
    /// Line indices of `panic` exits; capture cleanup goes in front of them
    /// once the whole program is known.
    panic_exits: Vec<usize>,
}

impl BatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn emit_instrs(&mut self, instrs: Vec<Instr>) {
        for instr in instrs {
            let line = render(&instr);
            self.emit(line);
        }
    }

    fn helper(&mut self) -> String {
        self.helpers += 1;
        format!("__sb_h{}", self.helpers)
    }

    /// Scalars live under `__sb_f<N>_`, list storage under `__sb_l<N>_`, so
    /// a scalar never lands on another list's `_len` or element variable.
    fn variable(&self, name: &str, ty: ValueType) -> String {
        let id = match &self.current {
            Some(f) if f.locals.contains(name) => f.id,
            _ => 0,
        };
        let kind = if ty.is_list { 'l' } else { 'f' };
        format!("__sb_{}{}_{}", kind, id, mangle(name))
    }

    fn declare(&mut self, name: &str, ty: ValueType) -> String {
        if let Some(f) = &mut self.current {
            f.locals.insert(name.to_string());
        }
        self.variable(name, ty)
    }

    /// Stores `value` in a fresh helper and returns the helper's name.
    fn store(&mut self, value: &str) -> String {
        let h = self.helper();
        self.emit(format!("set \"{}={}\"", h, value));
        h
    }

    /// Name of a variable holding `fragment`, materializing it when the
    /// fragment is not a plain read.
    fn variable_for(&mut self, fragment: &str) -> String {
        match plain_read(fragment) {
            Some(name) => name.to_string(),
            None => self.store(fragment),
        }
    }

    /// A command-line word that is expanded when the line is parsed. Pipe
    /// stages run in child interpreters without delayed expansion, so
    /// `!name!` reads cannot be used there.
    fn command_word(&mut self, fragment: &str) -> String {
        if !fragment.is_empty() && fragment.chars().all(is_word_char) {
            return fragment.to_string();
        }
        let name = self.variable_for(fragment);
        format!("\"%{}%\"", name)
    }

    fn exit_command(&self) -> &'static str {
        if self.current.is_some() { "exit 1" } else { "exit /b 1" }
    }

    fn helper_text(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.usage.list_len {
            out.push(
                ":__sb_list_len
set \"%~2=!%~1_len!\"
goto :eof",
            );
        }
        if self.usage.list_set {
            out.push(
                ":__sb_list_set
if %~2 GEQ !%~1_len! (
for /l %%i in (!%~1_len!,1,%~2) do set \"%~1_%%i=!__sb_set_default!\"
set /a \"%~1_len=%~2+1\"
)
set \"%~1_%~2=!__sb_set_value!\"
goto :eof",
            );
        }
        if self.usage.list_copy {
            out.push(
                ":__sb_list_copy
set \"%~2_len=!%~1_len!\"
set /a \"__sb_lc_last=!%~1_len!-1\"
for /l %%i in (0,1,!__sb_lc_last!) do set \"%~2_%%i=!%~1_%%i!\"
goto :eof",
            );
        }
        if self.usage.strlen {
            out.push(
                ":__sb_strlen
set \"__sb_sl_s=!%~1!\"
set \"%~2=0\"
:__sb_strlen_loop
if defined __sb_sl_s (
set \"__sb_sl_s=!__sb_sl_s:~1!\"
set /a \"%~2+=1\"
goto __sb_strlen_loop
)
goto :eof",
            );
        }
        if self.usage.substr {
            out.push(
                ":__sb_substr
set /a \"__sb_ss_len=%~3-(%~2)\"
for /f \"tokens=1,2\" %%a in (\"%~2 !__sb_ss_len!\") do set \"%~4=!%~1:~%%a,%%b!\"
goto :eof",
            );
        }
        if self.usage.read_file {
            out.push(
                ":__sb_read_file
set \"%~2=\"
set \"__sb_rf_first=1\"
for /f \"delims=\" %%l in ('findstr /n \"^\" \"%~1\"') do (
set \"__sb_rf_line=%%l\"
set \"__sb_rf_line=!__sb_rf_line:*:=!\"
if defined __sb_rf_first (
set \"%~2=!__sb_rf_line!\"
set \"__sb_rf_first=\"
) else (
set \"%~2=!%~2!!__sb_lf!!__sb_rf_line!\"
)
)
goto :eof",
            );
        }
        out
    }

    fn int_compare(op: CompareOp) -> &'static str {
        match op {
            CompareOp::Eq => "EQU",
            CompareOp::NotEq => "NEQ",
            CompareOp::Lt => "LSS",
            CompareOp::Le => "LEQ",
            CompareOp::Gt => "GTR",
            CompareOp::Ge => "GEQ",
        }
    }
}

fn render(instr: &Instr) -> String {
    match instr {
        Instr::Label(l) => format!(":{}", l),
        Instr::Jump(l) => format!("goto {}", l),
        Instr::JumpUnless { cond, target } => format!("if not \"{}\"==\"1\" goto {}", cond, target),
    }
}

fn read(name: &str) -> String {
    format!("!{}!", name)
}

/// `Some(name)` when the fragment is exactly `!name!`.
fn plain_read(fragment: &str) -> Option<&str> {
    let inner = fragment.strip_prefix('!')?.strip_suffix('!')?;
    if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(inner)
    } else {
        None
    }
}

/// Spells a source name with lowercase letters only: `_` becomes `__` and
/// an uppercase letter becomes `_` plus its lowercase form. Batch variable
/// and label names ignore case, so `A` and `a` must map apart.
fn mangle(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '_' => out.push_str("__"),
            c if c.is_ascii_uppercase() => {
                out.push('_');
                out.push(c.to_ascii_lowercase());
            }
            c => out.push(c),
        }
    }
    out
}

/// Characters that need no escaping anywhere a fragment is pasted.
fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || " _.,:/+-".contains(c)
}

/// Characters that keep a command argument a single word.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_.:/+-".contains(c)
}

/// Escapes a literal for `set "name=..."` under delayed expansion.
pub fn escape(value: &str) -> String {
    let delayed = value.contains('!') || value.contains('\n');
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => out.push_str("%%"),
            '^' if delayed => out.push_str("^^"),
            '!' => out.push_str("^!"),
            '\n' => out.push_str("!__sb_lf!"),
            _ => out.push(ch),
        }
    }
    out
}

fn unsupported(op: &'static str, ty: ValueType) -> CodegenError {
    CodegenError::UnsupportedOperator { op, ty }
}

impl Backend for BatchBackend {
    fn program_start(&mut self) -> CodegenResult<()> {
        Ok(())
    }

    fn program_end(&mut self) -> CodegenResult<String> {
        if self.graph.depth() != 0 {
            return Err(CodegenError::Unbalanced { construct: "block" });
        }
        if self.current.is_some() {
            return Err(CodegenError::Unbalanced { construct: "func" });
        }
        let mut out: Vec<String> = vec!["@echo off".into(), "setlocal EnableDelayedExpansion".into()];
        if self.usage.newline {
            out.push("(set __sb_lf=^".into());
            out.push(String::new());
            out.push(")".into());
        }
        if self.usage.capture {
            out.push("set \"__sb_cap=%TEMP%\\__sb_cap_%RANDOM%%RANDOM%\"".into());
        }
        if self.usage.capture {
            for &at in self.panic_exits.iter().rev() {
                self.lines.insert(at, CAPTURE_CLEANUP.into());
            }
        }
        out.append(&mut self.lines);
        if self.usage.capture {
            out.push(CAPTURE_CLEANUP.into());
        }
        out.push("exit /b 0".into());
        for helper in self.helper_text() {
            out.push(String::new());
            out.extend(helper.lines().map(str::to_string));
        }

        let eol = TargetShell::Batch.line_ending();
        let mut text = indent_blocks(&out, 2).join(eol);
        text.push_str(eol);
        Ok(text)
    }

    fn bool_literal(&mut self, value: bool) -> CodegenResult<String> {
        Ok(if value { "1" } else { "0" }.to_string())
    }

    fn int_literal(&mut self, value: i64) -> CodegenResult<String> {
        Ok(value.to_string())
    }

    fn string_literal(&mut self, value: &str) -> CodegenResult<String> {
        if value.chars().all(is_safe_char) {
            return Ok(value.to_string());
        }
        if value.contains('\n') {
            self.usage.newline = true;
        }
        let h = self.store(&escape(value));
        Ok(read(&h))
    }

    fn var_definition(&mut self, name: &str, ty: ValueType, value: Option<&str>) -> CodegenResult<()> {
        let var = self.declare(name, ty);
        if ty.is_list {
            match value {
                Some(src) => {
                    self.usage.list_copy = true;
                    self.emit(format!("call :__sb_list_copy {} {}", src, var));
                }
                None => self.emit(format!("set \"{}_len=0\"", var)),
            }
        } else {
            let value = value.unwrap_or(ty.default_text());
            self.emit(format!("set \"{}={}\"", var, value));
        }
        Ok(())
    }

    fn var_assignment(&mut self, name: &str, ty: ValueType, value: &str) -> CodegenResult<()> {
        let var = self.variable(name, ty);
        if ty.is_list {
            self.usage.list_copy = true;
            self.emit(format!("call :__sb_list_copy {} {}", value, var));
        } else {
            self.emit(format!("set \"{}={}\"", var, value));
        }
        Ok(())
    }

    fn list_assignment(&mut self, name: &str, elem: ValueType, index: &str, value: &str) -> CodegenResult<()> {
        self.usage.list_set = true;
        let var = self.variable(name, ValueType::list(elem.base));
        self.emit(format!("set \"__sb_set_value={}\"", value));
        self.emit(format!("set \"__sb_set_default={}\"", elem.default_text()));
        self.emit(format!("call :__sb_list_set {} {}", var, index));
        Ok(())
    }

    fn var_evaluation(&mut self, name: &str, ty: ValueType) -> CodegenResult<String> {
        let var = self.variable(name, ty);
        Ok(if ty.is_list { var } else { read(&var) })
    }

    fn list_element(&mut self, list: &str, _elem: ValueType, index: &str) -> CodegenResult<String> {
        let h = self.helper();
        self.emit(format!("for %%k in ({}) do set \"{}=!{}_%%k!\"", index, h, list));
        Ok(read(&h))
    }

    fn if_start(&mut self, condition: &str) -> CodegenResult<()> {
        let instrs = self.graph.open_branch(condition);
        self.emit_instrs(instrs);
        Ok(())
    }

    fn else_if_start(&mut self, condition: &str) -> CodegenResult<()> {
        let instrs = self.graph.else_if(condition)?;
        self.emit_instrs(instrs);
        Ok(())
    }

    fn else_start(&mut self) -> CodegenResult<()> {
        let instrs = self.graph.else_branch()?;
        self.emit_instrs(instrs);
        Ok(())
    }

    fn if_end(&mut self) -> CodegenResult<()> {
        let instrs = self.graph.close_branch()?;
        self.emit_instrs(instrs);
        Ok(())
    }

    fn for_start(&mut self) -> CodegenResult<()> {
        let instrs = self.graph.open_loop();
        self.emit_instrs(instrs);
        Ok(())
    }

    fn for_increment_start(&mut self) -> CodegenResult<()> {
        Ok(())
    }

    fn for_increment_end(&mut self) -> CodegenResult<()> {
        let instrs = self.graph.loop_condition_label()?;
        self.emit_instrs(instrs);
        Ok(())
    }

    fn for_condition(&mut self, condition: &str) -> CodegenResult<()> {
        let instrs = self.graph.loop_exit_unless(condition)?;
        self.emit_instrs(instrs);
        Ok(())
    }

    fn for_end(&mut self) -> CodegenResult<()> {
        let instrs = self.graph.close_loop()?;
        self.emit_instrs(instrs);
        Ok(())
    }

    fn break_loop(&mut self) -> CodegenResult<()> {
        let instr = self.graph.break_target()?;
        self.emit_instrs(vec![instr]);
        Ok(())
    }

    fn continue_loop(&mut self) -> CodegenResult<()> {
        let instr = self.graph.continue_target()?;
        self.emit_instrs(vec![instr]);
        Ok(())
    }

    fn function_start(&mut self, name: &str, params: &[Target], _returns: &[ValueType]) -> CodegenResult<()> {
        if self.current.is_some() || self.graph.depth() != 0 {
            return Err(CodegenError::Unbalanced { construct: "func" });
        }
        self.functions += 1;
        let id = self.functions;
        self.emit(format!("goto __sb_f{}_end", id));
        self.emit(format!(":__sb_fn_{}", mangle(name)));
        self.current = Some(FunctionFrame {
            id,
            name: name.to_string(),
            locals: params.iter().map(|p| p.name.clone()).collect(),
        });
        for (i, param) in params.iter().enumerate() {
            let var = self.variable(&param.name, param.ty);
            if param.ty.is_list {
                self.usage.list_copy = true;
                self.emit(format!("call :__sb_list_copy __sb_arg_{} {}", i, var));
            } else {
                self.emit(format!("set \"{}=!__sb_arg_{}!\"", var, i));
            }
        }
        Ok(())
    }

    fn function_end(&mut self) -> CodegenResult<()> {
        let frame = self
            .current
            .take()
            .ok_or(CodegenError::Unbalanced { construct: "func" })?;
        if self.graph.depth() != 0 {
            return Err(CodegenError::Unbalanced { construct: "block" });
        }
        self.emit("goto :eof");
        self.emit(format!(":__sb_f{}_end", frame.id));
        Ok(())
    }

    fn return_values(&mut self, values: &[(String, ValueType)]) -> CodegenResult<()> {
        for (i, (value, ty)) in values.iter().enumerate() {
            if ty.is_list {
                self.usage.list_copy = true;
                self.emit(format!("call :__sb_list_copy {} __sb_ret_{}", value, i));
            } else {
                self.emit(format!("set \"__sb_ret_{}={}\"", i, value));
            }
        }
        self.emit("goto :eof");
        Ok(())
    }

    fn unary(&mut self, op: UnaryOp, operand: &str, ty: ValueType, _used: bool) -> CodegenResult<String> {
        let h = self.helper();
        match (op, ty.base, ty.is_list) {
            (UnaryOp::Neg, BaseType::Int, false) => {
                self.emit(format!("set /a \"{}=-({})\"", h, operand));
            }
            (UnaryOp::Not, BaseType::Bool, false) => {
                self.emit(format!("set \"{}=1\"", h));
                self.emit(format!("if \"{}\"==\"1\" set \"{}=0\"", operand, h));
            }
            _ => return Err(unsupported(op.symbol(), ty)),
        }
        Ok(read(&h))
    }

    fn binary(&mut self, op: BinaryOp, left: &str, right: &str, ty: ValueType, _used: bool) -> CodegenResult<String> {
        match (ty.base, ty.is_list, op) {
            (BaseType::Int, false, _) => {
                let symbol = match op {
                    BinaryOp::Mod => "%%",
                    other => other.symbol(),
                };
                let h = self.helper();
                self.emit(format!("set /a \"{}=({}){}({})\"", h, left, symbol, right));
                Ok(read(&h))
            }
            (BaseType::String, false, BinaryOp::Add) => Ok(format!("{}{}", left, right)),
            _ => Err(unsupported(op.symbol(), ty)),
        }
    }

    fn compare(&mut self, op: CompareOp, left: &str, right: &str, ty: ValueType, _used: bool) -> CodegenResult<String> {
        if ty.is_list {
            return Err(unsupported(op.symbol(), ty));
        }
        let test = match (ty.base, op) {
            (BaseType::Int, _) => format!("{} {} {}", left, Self::int_compare(op), right),
            (BaseType::Bool | BaseType::String, CompareOp::Eq) => format!("\"{}\"==\"{}\"", left, right),
            (BaseType::Bool | BaseType::String, CompareOp::NotEq) => {
                format!("not \"{}\"==\"{}\"", left, right)
            }
            _ => return Err(unsupported(op.symbol(), ty)),
        };
        let h = self.helper();
        self.emit(format!("set \"{}=0\"", h));
        self.emit(format!("if {} set \"{}=1\"", test, h));
        Ok(read(&h))
    }

    fn logical(&mut self, op: LogicalOp, left: &str, right: &str, _used: bool) -> CodegenResult<String> {
        let h = self.helper();
        self.emit(format!("set \"{}=0\"", h));
        match op {
            LogicalOp::And => {
                self.emit(format!("if \"{}\"==\"1\" if \"{}\"==\"1\" set \"{}=1\"", left, right, h));
            }
            LogicalOp::Or => {
                self.emit(format!("if \"{}\"==\"1\" set \"{}=1\"", left, h));
                self.emit(format!("if \"{}\"==\"1\" set \"{}=1\"", right, h));
            }
        }
        Ok(read(&h))
    }

    fn print(&mut self, value: &str, ty: ValueType) -> CodegenResult<()> {
        if ty.is_list {
            return Err(CodegenError::UnsupportedType {
                operation: "print",
                ty,
            });
        }
        self.emit(format!("echo({}", value));
        Ok(())
    }

    fn panic(&mut self, message: &str) -> CodegenResult<()> {
        self.emit(format!("echo(panic: {}", message));
        self.panic_exits.push(self.lines.len());
        let exit = self.exit_command();
        self.emit(exit);
        Ok(())
    }

    fn list_literal(&mut self, _elem: ValueType, values: &[String], used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        let h = self.helper();
        self.emit(format!("set \"{}_len={}\"", h, values.len()));
        for (i, v) in values.iter().enumerate() {
            self.emit(format!("set \"{}_{}={}\"", h, i, v));
        }
        Ok(h)
    }

    fn list_length(&mut self, list: &str, _used: bool) -> CodegenResult<String> {
        self.usage.list_len = true;
        let h = self.helper();
        self.emit(format!("call :__sb_list_len {} {}", list, h));
        Ok(read(&h))
    }

    fn string_subscript(&mut self, value: &str, start: &str, end: Option<&str>, used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        self.usage.substr = true;
        let src = self.variable_for(value);
        let end = match end {
            Some(end) => end.to_string(),
            None => {
                let h = self.helper();
                self.emit(format!("set /a \"{}=({})+1\"", h, start));
                read(&h)
            }
        };
        let h = self.helper();
        self.emit(format!("call :__sb_substr {} {} {} {}", src, start, end, h));
        Ok(read(&h))
    }

    fn string_length(&mut self, value: &str, used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        self.usage.strlen = true;
        let src = self.variable_for(value);
        let h = self.helper();
        self.emit(format!("call :__sb_strlen {} {}", src, h));
        Ok(read(&h))
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
        if self.current.as_ref().is_some_and(|f| f.name == name) {
            return Err(CodegenError::Recursion {
                name: name.to_string(),
                target: TARGET,
            });
        }
        for (i, (arg, ty)) in args.iter().enumerate() {
            if ty.is_list {
                self.usage.list_copy = true;
                self.emit(format!("call :__sb_list_copy {} __sb_arg_{}", arg, i));
            } else {
                self.emit(format!("set \"__sb_arg_{}={}\"", i, arg));
            }
        }
        self.emit(format!("call :__sb_fn_{}", mangle(name)));
        if !used {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(returns.len());
        for (i, ty) in returns.iter().enumerate() {
            let h = self.helper();
            if ty.is_list {
                self.usage.list_copy = true;
                self.emit(format!("call :__sb_list_copy __sb_ret_{} {}", i, h));
                out.push(h);
            } else {
                self.emit(format!("set \"{}=!__sb_ret_{}!\"", h, i));
                out.push(read(&h));
            }
        }
        Ok(out)
    }

    fn process_call(&mut self, chain: &[Invocation], results: usize) -> CodegenResult<Vec<String>> {
        let mut segments = Vec::with_capacity(chain.len());
        for call in chain {
            let mut seg = if call.name.chars().all(is_word_char) && !call.name.is_empty() {
                call.name.clone()
            } else {
                format!("\"{}\"", call.name.replace('%', "%%"))
            };
            for arg in &call.args {
                let word = self.command_word(arg);
                seg.push(' ');
                seg.push_str(&word);
            }
            segments.push(seg);
        }
        let cmd = segments.join(" | ");
        if results == 0 {
            self.emit(cmd);
            return Ok(Vec::new());
        }

        self.usage.capture = true;
        self.usage.read_file = true;
        self.usage.newline = true;
        let mut line = format!("({}) > \"%__sb_cap%.out\"", cmd);
        if results >= 2 {
            line.push_str(" 2> \"%__sb_cap%.err\"");
        }
        self.emit(line);
        let code = if results >= 3 {
            let h = self.helper();
            self.emit(format!("set \"{}=!errorlevel!\"", h));
            Some(read(&h))
        } else {
            None
        };
        let out = self.helper();
        self.emit(format!("call :__sb_read_file \"!__sb_cap!.out\" {}", out));
        let mut frags = vec![read(&out)];
        if results >= 2 {
            let err = self.helper();
            self.emit(format!("call :__sb_read_file \"!__sb_cap!.err\" {}", err));
            frags.push(read(&err));
        }
        frags.extend(code);
        Ok(frags)
    }

    fn input(&mut self, prompt: Option<&str>, used: bool) -> CodegenResult<String> {
        let h = self.helper();
        self.emit(format!("set \"{}=\"", h));
        self.emit(format!("set /p \"{}={}\"", h, prompt.unwrap_or_default()));
        Ok(if used { read(&h) } else { String::new() })
    }

    fn copy_list(&mut self, list: &str, _elem: ValueType, used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        self.usage.list_copy = true;
        let h = self.helper();
        self.emit(format!("call :__sb_list_copy {} {}", list, h));
        Ok(h)
    }

    fn file_exists(&mut self, path: &str, _used: bool) -> CodegenResult<String> {
        let h = self.helper();
        self.emit(format!("set \"{}=0\"", h));
        self.emit(format!("if exist \"{}\" set \"{}=1\"", path, h));
        Ok(read(&h))
    }

    fn read_file(&mut self, path: &str, used: bool) -> CodegenResult<String> {
        if !used {
            self.emit(format!("type \"{}\" >nul", path));
            return Ok(String::new());
        }
        self.usage.read_file = true;
        self.usage.newline = true;
        let h = self.helper();
        self.emit(format!("call :__sb_read_file \"{}\" {}", path, h));
        Ok(read(&h))
    }

    fn write_file(&mut self, path: &str, content: &str, append: bool) -> CodegenResult<()> {
        let redirect = if append { ">>" } else { ">" };
        self.emit(format!("{}\"{}\" echo({}", redirect, path, content));
        Ok(())
    }

    fn itoa(&mut self, value: &str, _used: bool) -> CodegenResult<String> {
        Ok(value.to_string())
    }

    fn atoi(&mut self, value: &str, used: bool) -> CodegenResult<String> {
        if !used {
            return Ok(String::new());
        }
        let h = self.helper();
        self.emit(format!("set /a \"{}={}\"", h, value));
        Ok(read(&h))
    }

    fn no_op(&mut self) -> CodegenResult<()> {
        self.emit("rem");
        Ok(())
    }
}
