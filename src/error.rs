use crate::ast::ValueType;
use crate::span::Diagnostic;
use thiserror::Error;

/// Failures raised by a code generator. They carry no source position;
/// the typed tree has already been checked when these surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("operator '{op}' is not supported for type {ty}")]
    UnsupportedOperator { op: &'static str, ty: ValueType },
    #[error("{operation} is not supported for type {ty}")]
    UnsupportedType {
        operation: &'static str,
        ty: ValueType,
    },
    #[error("'{keyword}' used outside of a loop")]
    OutsideLoop { keyword: &'static str },
    #[error("recursive call to '{name}' is not supported by the {target} target")]
    Recursion { name: String, target: &'static str },
    #[error("unbalanced {construct} in generated code")]
    Unbalanced { construct: &'static str },
    #[error("expected {expected} values from '{name}', got {got}")]
    ValueCount {
        name: String,
        expected: usize,
        got: usize,
    },
}

pub type CodegenResult<T> = Result<T, CodegenError>;

/// Any failure of the library pipeline.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] Diagnostic),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    /// Render for a terminal: source snippet for positioned errors, a plain
    /// `error:` line otherwise.
    pub fn render(&self, base: Option<&std::path::Path>) -> String {
        match self {
            CompileError::Syntax(diag) => diag.format(base),
            CompileError::Codegen(err) => format!("error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    #[test]
    fn codegen_messages() {
        let err = CodegenError::UnsupportedOperator {
            op: "-",
            ty: ValueType::STRING,
        };
        assert_eq!(err.to_string(), "operator '-' is not supported for type string");
        assert_eq!(
            CompileError::from(err).render(None),
            "error: operator '-' is not supported for type string"
        );
    }

    #[test]
    fn syntax_error_keeps_single_line_display() {
        let err = CompileError::from(Diagnostic::new("expected ')'", Position::new(4, 2)));
        assert_eq!(err.to_string(), "expected ')' at row 4, column 2");
    }
}
