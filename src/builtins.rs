//! Names handled by the compiler itself rather than by user functions.
//!
//! `print`, `input` and `len` are keywords; the names below are plain
//! identifiers the parser recognises before looking up user functions, so
//! they may not be reused for functions or variables.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Panic,
    Write,
    Copy,
    Exists,
    Read,
    Itoa,
    Atoi,
}

pub const BUILTIN_NAMES: &[&str] = &["panic", "write", "copy", "exists", "read", "itoa", "atoi"];

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        let b = match name {
            "panic" => Builtin::Panic,
            "write" => Builtin::Write,
            "copy" => Builtin::Copy,
            "exists" => Builtin::Exists,
            "read" => Builtin::Read,
            "itoa" => Builtin::Itoa,
            "atoi" => Builtin::Atoi,
            _ => return None,
        };
        Some(b)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Panic => "panic",
            Builtin::Write => "write",
            Builtin::Copy => "copy",
            Builtin::Exists => "exists",
            Builtin::Read => "read",
            Builtin::Itoa => "itoa",
            Builtin::Atoi => "atoi",
        }
    }

    /// Statement builtins produce no value and cannot appear in expressions.
    pub fn is_statement(self) -> bool {
        matches!(self, Builtin::Panic | Builtin::Write)
    }
}

pub fn is_builtin(name: &str) -> bool {
    Builtin::from_name(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_resolves() {
        for name in BUILTIN_NAMES {
            let b = Builtin::from_name(name).expect("listed builtin");
            assert_eq!(b.name(), *name);
        }
        assert!(!is_builtin("main"));
    }

    #[test]
    fn statement_builtins() {
        let statements: Vec<_> = BUILTIN_NAMES
            .iter()
            .filter_map(|n| Builtin::from_name(n))
            .filter(|b| b.is_statement())
            .collect();
        assert_eq!(statements, vec![Builtin::Panic, Builtin::Write]);
    }
}
