/// Re-indents parenthesized batch blocks.
///
/// Program control flow is rendered as labels and `goto`, so in practice
/// only the appended helper subroutines carry parenthesized blocks.
/// A line ending in `(` opens a level and a line starting with `)` closes
/// one. Existing leading whitespace is discarded first, so running the
/// pass twice gives the same text. Blank lines stay empty; the newline
/// sentinel definition depends on that.
pub fn indent_blocks(lines: &[String], width: usize) -> Vec<String> {
    let mut depth: usize = 0;
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            out.push(String::new());
            continue;
        }
        if trimmed.starts_with(')') {
            depth = depth.saturating_sub(1);
        }
        out.push(format!("{}{}", " ".repeat(depth * width), trimmed));
        if opens_block(trimmed) {
            depth += 1;
        }
    }
    out
}

fn opens_block(line: &str) -> bool {
    line == "(" || line.ends_with(" (")
}
