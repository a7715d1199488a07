#![allow(dead_code)]

use lazy_static::lazy_static;
use shbat::{TargetShell, compile_source};
use std::fs;
use std::process::{Command, Stdio};

lazy_static! {
    pub static ref BASH_AVAILABLE: bool = Command::new("bash")
        .arg("-c")
        .arg("exit 0")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
}

pub fn compile_to_bash(src: &str) -> String {
    compile_source(src, "test.shb", TargetShell::Bash)
        .unwrap_or_else(|e| panic!("bash compile failed: {}", e))
}

pub fn compile_to_batch(src: &str) -> String {
    compile_source(src, "test.shb", TargetShell::Batch)
        .unwrap_or_else(|e| panic!("batch compile failed: {}", e))
}

pub fn compile_err(src: &str) -> String {
    match compile_source(src, "test.shb", TargetShell::Bash) {
        Ok(out) => panic!("expected a compile error, got:\n{}", out),
        Err(e) => e.to_string(),
    }
}

/// Runs a generated bash script in a scratch directory and returns
/// (stdout, stderr, status).
pub fn run_bash_script(bash: &str, stdin: &str) -> (String, String, i32) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let script_path = dir.path().join("script.sh");
    fs::write(&script_path, bash).expect("Failed to write temp script");

    let mut child = Command::new("bash")
        .arg(&script_path)
        .current_dir(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute bash");
    {
        use std::io::Write;
        let mut pipe = child.stdin.take().expect("stdin is piped");
        pipe.write_all(stdin.as_bytes()).expect("Failed to write stdin");
    }
    let output = child.wait_with_output().expect("Failed to wait for bash");

    let stdout = String::from_utf8_lossy(&output.stdout).replace("\r\n", "\n");
    let stderr = String::from_utf8_lossy(&output.stderr).replace("\r\n", "\n");
    (stdout, stderr, output.status.code().unwrap_or(-1))
}

/// Compiles and runs `src`; `None` when bash is not installed.
pub fn run(src: &str) -> Option<(String, String, i32)> {
    run_with_stdin(src, "")
}

pub fn run_with_stdin(src: &str, stdin: &str) -> Option<(String, String, i32)> {
    if !*BASH_AVAILABLE {
        eprintln!("bash not available, skipping");
        return None;
    }
    Some(run_bash_script(&compile_to_bash(src), stdin))
}

pub fn assert_stdout(src: &str, expected: &str) {
    if let Some((stdout, stderr, status)) = run(src) {
        assert_eq!(status, 0, "stderr: {}\nscript:\n{}", stderr, compile_to_bash(src));
        assert_eq!(stdout, expected, "script:\n{}", compile_to_bash(src));
    }
}
