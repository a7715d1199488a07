use std::cmp::max;
use thiserror::Error;

/// 1-based row/column of a token, columns counted in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Position { row, column }
    }
}

/// A lexer or parser failure. The `Display` form is the single-line
/// message; `format` renders the source line and a caret under the column.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{msg} at row {}, column {}", .pos.row, .pos.column)]
pub struct Diagnostic {
    pub msg: String,
    pub pos: Position,
    pub sm: Option<SourceMap>,
    pub file: Option<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(msg: impl Into<String>, pos: Position) -> Self {
        Diagnostic {
            msg: msg.into(),
            pos,
            sm: None,
            file: None,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_source(mut self, sm: &SourceMap, file: &str) -> Self {
        self.sm = Some(sm.clone());
        self.file = Some(file.to_string());
        self
    }

    pub fn format(&self, base: Option<&std::path::Path>) -> String {
        let main = if let (Some(sm), Some(file)) = (&self.sm, &self.file) {
            sm.format_diagnostic(file, base, &self.msg, self.pos)
        } else {
            format!("error: {}", self)
        };
        match &self.help {
            Some(help) => format!("{}\nhelp: {}", main, help),
            None => main,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMap {
    src: String,
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(src: String) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in src.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        SourceMap { src, line_starts }
    }

    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn line_snippet(&self, line: usize) -> &str {
        if line < 1 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = if line == self.line_starts.len() {
            self.src.len()
        } else {
            self.line_starts[line] - 1 // Exclude newline
        };
        if start > end {
            return "";
        }
        self.src[start..end].trim_end_matches('\r')
    }

    pub fn format_diagnostic(
        &self,
        file: &str,
        base: Option<&std::path::Path>,
        msg: &str,
        pos: Position,
    ) -> String {
        let snippet = self.line_snippet(pos.row);

        let mut arrow = String::new();
        for _ in 0..max(pos.column, 1) - 1 {
            arrow.push(' ');
        }
        arrow.push('^');

        let display_file = crate::diag_path::display_path(file, base);

        format!(
            "{}:{}:{}: {}\n{}\n{}",
            display_file, pos.row, pos.column, msg, snippet, arrow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_single_line_with_position() {
        let d = Diagnostic::new("expected ')'", Position::new(3, 7));
        assert_eq!(d.to_string(), "expected ')' at row 3, column 7");
    }

    #[test]
    fn format_points_at_column() {
        let sm = SourceMap::new("var a = 1\nprint(b)\n".to_string());
        let d = Diagnostic::new("undeclared variable 'b'", Position::new(2, 7))
            .with_source(&sm, "main.shb");
        let rendered = d.format(None);
        assert_eq!(
            rendered,
            "main.shb:2:7: undeclared variable 'b'\nprint(b)\n      ^"
        );
    }

    #[test]
    fn help_is_appended() {
        let d = Diagnostic::new("undeclared variable 'cnt'", Position::new(1, 1))
            .with_help("did you mean 'count'?");
        assert!(d.format(None).ends_with("\nhelp: did you mean 'count'?"));
    }
}
