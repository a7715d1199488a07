use std::fmt;
use std::str::FromStr;

/// Script dialect a program is compiled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetShell {
    #[default]
    Bash,
    Batch,
}

impl TargetShell {
    pub fn name(self) -> &'static str {
        match self {
            TargetShell::Bash => "bash",
            TargetShell::Batch => "batch",
        }
    }

    pub fn line_ending(self) -> &'static str {
        match self {
            TargetShell::Bash => "\n",
            TargetShell::Batch => "\r\n",
        }
    }
}

impl fmt::Display for TargetShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetShell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bash" | "sh" => Ok(TargetShell::Bash),
            "batch" | "bat" | "cmd" => Ok(TargetShell::Batch),
            other => Err(format!(
                "unknown target '{}' (expected 'bash' or 'batch')",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("bash".parse::<TargetShell>(), Ok(TargetShell::Bash));
        assert_eq!("cmd".parse::<TargetShell>(), Ok(TargetShell::Batch));
        assert!("zsh".parse::<TargetShell>().is_err());
    }

    #[test]
    fn batch_uses_crlf() {
        assert_eq!(TargetShell::Batch.line_ending(), "\r\n");
        assert_eq!(TargetShell::default(), TargetShell::Bash);
    }
}
