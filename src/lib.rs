pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod diag_path;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod suggest;
pub mod target;
pub mod transpiler;

pub use driver::compile_source;
pub use error::CompileError;
pub use target::TargetShell;
