pub mod bash;
pub mod batch;
pub mod blocks;
pub mod indent;

use crate::ast::{BinaryOp, CompareOp, LogicalOp, Program, Target, UnaryOp, ValueType};
use crate::error::CodegenResult;
pub use crate::target::TargetShell;

/// One `@name{args}` segment of a pipeline with its arguments already
/// evaluated to fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
}

/// The fixed operation set a target dialect implements.
///
/// Value-producing operations return a *fragment*: target text that
/// evaluates to the value where it is pasted. Fragments are opaque to the
/// caller and only ever passed back into other operations. A backend may
/// emit supporting lines before returning a fragment; those lines always
/// precede the statement that consumes it.
///
/// Lists are passed around as the name of their backing storage.
/// `used` tells an operation whether its result will be consumed, so it can
/// skip allocating storage for discarded values.
pub trait Backend {
    fn program_start(&mut self) -> CodegenResult<()>;
    /// Finishes the run and returns the whole script.
    fn program_end(&mut self) -> CodegenResult<String>;

    fn bool_literal(&mut self, value: bool) -> CodegenResult<String>;
    fn int_literal(&mut self, value: i64) -> CodegenResult<String>;
    fn string_literal(&mut self, value: &str) -> CodegenResult<String>;

    /// `value` is `None` when the variable starts at its type's default.
    fn var_definition(&mut self, name: &str, ty: ValueType, value: Option<&str>) -> CodegenResult<()>;
    fn var_assignment(&mut self, name: &str, ty: ValueType, value: &str) -> CodegenResult<()>;
    /// Stores into `name[index]`, growing the list and filling any skipped
    /// slots with the element default.
    fn list_assignment(&mut self, name: &str, elem: ValueType, index: &str, value: &str) -> CodegenResult<()>;
    fn var_evaluation(&mut self, name: &str, ty: ValueType) -> CodegenResult<String>;
    fn list_element(&mut self, list: &str, elem: ValueType, index: &str) -> CodegenResult<String>;

    fn if_start(&mut self, condition: &str) -> CodegenResult<()>;
    fn else_if_start(&mut self, condition: &str) -> CodegenResult<()>;
    fn else_start(&mut self) -> CodegenResult<()>;
    fn if_end(&mut self) -> CodegenResult<()>;

    /// Loop protocol: `for_start`, post statement between
    /// `for_increment_start`/`for_increment_end` (skipped on the first
    /// pass), the condition's supporting lines, `for_condition`, body,
    /// `for_end`.
    fn for_start(&mut self) -> CodegenResult<()>;
    fn for_increment_start(&mut self) -> CodegenResult<()>;
    fn for_increment_end(&mut self) -> CodegenResult<()>;
    fn for_condition(&mut self, condition: &str) -> CodegenResult<()>;
    fn for_end(&mut self) -> CodegenResult<()>;
    fn break_loop(&mut self) -> CodegenResult<()>;
    fn continue_loop(&mut self) -> CodegenResult<()>;

    fn function_start(&mut self, name: &str, params: &[Target], returns: &[ValueType]) -> CodegenResult<()>;
    fn function_end(&mut self) -> CodegenResult<()>;
    fn return_values(&mut self, values: &[(String, ValueType)]) -> CodegenResult<()>;

    fn unary(&mut self, op: UnaryOp, operand: &str, ty: ValueType, used: bool) -> CodegenResult<String>;
    fn binary(&mut self, op: BinaryOp, left: &str, right: &str, ty: ValueType, used: bool) -> CodegenResult<String>;
    fn compare(&mut self, op: CompareOp, left: &str, right: &str, ty: ValueType, used: bool) -> CodegenResult<String>;
    fn logical(&mut self, op: LogicalOp, left: &str, right: &str, used: bool) -> CodegenResult<String>;

    fn print(&mut self, value: &str, ty: ValueType) -> CodegenResult<()>;
    /// Prints `panic: <message>` and stops the generated program with a
    /// non-zero status.
    fn panic(&mut self, message: &str) -> CodegenResult<()>;
    fn list_literal(&mut self, elem: ValueType, values: &[String], used: bool) -> CodegenResult<String>;
    fn list_length(&mut self, list: &str, used: bool) -> CodegenResult<String>;
    /// `end` of `None` selects the single character at `start`.
    fn string_subscript(&mut self, value: &str, start: &str, end: Option<&str>, used: bool) -> CodegenResult<String>;
    fn string_length(&mut self, value: &str, used: bool) -> CodegenResult<String>;
    fn group(&mut self, inner: &str, ty: ValueType) -> CodegenResult<String>;
    /// Returns one fragment per declared return value when `used`.
    fn function_call(
        &mut self,
        name: &str,
        args: &[(String, ValueType)],
        returns: &[ValueType],
        used: bool,
    ) -> CodegenResult<Vec<String>>;
    /// Runs a pipeline. `results` is how many of (stdout, stderr, exit
    /// code) are captured; zero lets the pipeline write to the terminal.
    fn process_call(&mut self, chain: &[Invocation], results: usize) -> CodegenResult<Vec<String>>;
    fn input(&mut self, prompt: Option<&str>, used: bool) -> CodegenResult<String>;
    fn copy_list(&mut self, list: &str, elem: ValueType, used: bool) -> CodegenResult<String>;
    fn file_exists(&mut self, path: &str, used: bool) -> CodegenResult<String>;
    fn read_file(&mut self, path: &str, used: bool) -> CodegenResult<String>;
    fn write_file(&mut self, path: &str, content: &str, append: bool) -> CodegenResult<()>;
    fn itoa(&mut self, value: &str, used: bool) -> CodegenResult<String>;
    fn atoi(&mut self, value: &str, used: bool) -> CodegenResult<String>;
    fn no_op(&mut self) -> CodegenResult<()>;
}

/// Generates a script for `program` with a fresh backend.
pub fn emit(program: &Program, target: TargetShell) -> CodegenResult<String> {
    match target {
        TargetShell::Bash => crate::transpiler::transpile(program, bash::BashBackend::new()),
        TargetShell::Batch => crate::transpiler::transpile(program, batch::BatchBackend::new()),
    }
}
