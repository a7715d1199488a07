use crate::codegen::{self, TargetShell};
use crate::error::CompileError;
use crate::parser;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Default,
    Check,
    EmitAst,
    EmitSh,
}

#[derive(Debug)]
pub struct CompileOptions {
    pub target: TargetShell,
    pub out_path: Option<PathBuf>,
    pub chmod_x: bool,
    pub mode: Mode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: TargetShell::Bash,
            out_path: None,
            chmod_x: false,
            mode: Mode::Default,
        }
    }
}

#[derive(Debug)]
pub struct DriverError {
    pub code: i32,
    pub msg: String,
}

impl DriverError {
    fn compile(msg: String) -> Self {
        Self { code: 2, msg }
    }

    fn io(msg: String) -> Self {
        Self { code: 1, msg }
    }
}

/// Runs the whole pipeline over `src` with fresh state.
///
/// `file` only names the source in diagnostics.
pub fn compile_source(src: &str, file: &str, target: TargetShell) -> Result<String, CompileError> {
    let program = parser::parse_source(src, file)?;
    Ok(codegen::emit(&program, target)?)
}

pub fn compile_file(path: &Path, options: CompileOptions) -> Result<String, DriverError> {
    let diag_base_dir = path
        .parent()
        .map(|p| std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf()));

    // Missing or unreadable input is an I/O failure (1), not a compile error (2).
    if !path.exists() {
        return Err(DriverError::io(format!("File not found: {}", path.display())));
    }
    let src = std::fs::read_to_string(path)
        .map_err(|e| DriverError::io(format!("Unable to read file: {} ({})", path.display(), e)))?;

    let file = path.to_string_lossy();
    let program = parser::parse_source(&src, &file)
        .map_err(|d| DriverError::compile(d.format(diag_base_dir.as_deref())))?;

    if let Mode::EmitAst = options.mode {
        return Ok(format!("{:#?}", program));
    }

    let out = codegen::emit(&program, options.target)
        .map_err(|e| DriverError::compile(CompileError::from(e).render(diag_base_dir.as_deref())))?;

    if let Mode::Check = options.mode {
        return Ok("OK".to_string());
    }

    if let Some(out_path) = &options.out_path {
        std::fs::write(out_path, &out)
            .map_err(|e| DriverError::io(format!("Failed to write to {}: {}", out_path.display(), e)))?;

        #[cfg(unix)]
        {
            if options.chmod_x && options.target == TargetShell::Bash {
                if let Ok(metadata) = std::fs::metadata(out_path) {
                    let mut perms = metadata.permissions();
                    perms.set_mode(perms.mode() | 0o111);
                    let _ = std::fs::set_permissions(out_path, perms);
                }
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn compile_source_reports_syntax_errors() {
        let err = compile_source("print(", "t.shb", TargetShell::Bash).unwrap_err();
        assert!(matches!(err, CompileError::Syntax(_)));
        assert!(err.to_string().starts_with("expected expression"), "{}", err);
    }

    #[test]
    fn compile_source_reports_codegen_errors() {
        let src = "func f(n int) int {\n  return f(n)\n}\nprint(f(1))\n";
        assert!(compile_source(src, "t.shb", TargetShell::Bash).is_ok());
        let err = compile_source(src, "t.shb", TargetShell::Batch).unwrap_err();
        assert!(matches!(err, CompileError::Codegen(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = compile_file(Path::new("/nonexistent/x.shb"), CompileOptions::default()).unwrap_err();
        assert_eq!(err.code, 1);
        assert!(err.msg.starts_with("File not found"));
    }

    #[test]
    fn compile_error_has_code_two_and_snippet() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bad.shb");
        fs::write(&src, "x := 1\nprint(y)\n").unwrap();
        let err = compile_file(&src, CompileOptions::default()).unwrap_err();
        assert_eq!(err.code, 2);
        assert!(err.msg.starts_with("bad.shb:2:7: undeclared variable 'y'"), "{}", err.msg);
        assert!(err.msg.contains("\nprint(y)\n      ^"), "{}", err.msg);
    }

    #[test]
    fn check_and_emit_ast_modes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("ok.shb");
        fs::write(&src, "print(1)\n").unwrap();
        let check = CompileOptions {
            mode: Mode::Check,
            ..Default::default()
        };
        assert_eq!(compile_file(&src, check).unwrap(), "OK");
        let ast = CompileOptions {
            mode: Mode::EmitAst,
            ..Default::default()
        };
        assert!(compile_file(&src, ast).unwrap().contains("Print("));
    }

    #[cfg(unix)]
    #[test]
    fn out_path_is_made_executable_for_bash_only() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("ok.shb");
        fs::write(&src, "print(1)\n").unwrap();

        let sh = dir.path().join("ok.sh");
        let opts = CompileOptions {
            out_path: Some(sh.clone()),
            chmod_x: true,
            ..Default::default()
        };
        compile_file(&src, opts).unwrap();
        assert_ne!(fs::metadata(&sh).unwrap().permissions().mode() & 0o111, 0);

        let bat = dir.path().join("ok.bat");
        let opts = CompileOptions {
            target: TargetShell::Batch,
            out_path: Some(bat.clone()),
            chmod_x: true,
            ..Default::default()
        };
        compile_file(&src, opts).unwrap();
        assert_eq!(fs::metadata(&bat).unwrap().permissions().mode() & 0o111, 0);
    }
}
