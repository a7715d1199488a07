use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Unknown,
    Bool,
    Int,
    String,
    Void,
}

/// Static type of a value. Two types are equal only when both the base
/// kind and the list flag match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueType {
    pub base: BaseType,
    pub is_list: bool,
}

impl ValueType {
    pub const UNKNOWN: ValueType = ValueType::scalar(BaseType::Unknown);
    pub const BOOL: ValueType = ValueType::scalar(BaseType::Bool);
    pub const INT: ValueType = ValueType::scalar(BaseType::Int);
    pub const STRING: ValueType = ValueType::scalar(BaseType::String);
    pub const VOID: ValueType = ValueType::scalar(BaseType::Void);

    pub const fn scalar(base: BaseType) -> Self {
        ValueType {
            base,
            is_list: false,
        }
    }

    pub const fn list(base: BaseType) -> Self {
        ValueType {
            base,
            is_list: true,
        }
    }

    /// Element type of a list, or the type itself for scalars.
    pub fn element(self) -> Self {
        ValueType::scalar(self.base)
    }

    pub fn is_scalar(self) -> bool {
        !self.is_list && matches!(self.base, BaseType::Bool | BaseType::Int | BaseType::String)
    }

    /// Default value of a scalar in the shared target encoding
    /// (bools are `1`/`0`).
    pub fn default_text(self) -> &'static str {
        match self.base {
            BaseType::Int | BaseType::Bool => "0",
            _ => "",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base {
            BaseType::Unknown => "unknown",
            BaseType::Bool => "bool",
            BaseType::Int => "int",
            BaseType::String => "string",
            BaseType::Void => "void",
        };
        if self.is_list {
            write!(f, "[]{}", base)
        } else {
            write!(f, "{}", base)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn is_ordering(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::NotEq)
    }
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A named, typed binding shared by definitions, assignments and
/// function parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub ty: ValueType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDefinition {
        targets: Vec<Target>,
        value: Option<Expr>,
        constant: bool,
    },
    VarAssignment {
        targets: Vec<Target>,
        value: Expr,
    },
    ListAssignment {
        target: Target,
        index: Expr,
        value: Expr,
    },
    FunctionDefinition {
        name: String,
        params: Vec<Target>,
        returns: Vec<ValueType>,
        body: Vec<Stmt>,
    },
    Return(Vec<Expr>),
    /// `if` / `else if` chain; `branches` is never empty.
    If {
        branches: Vec<Branch>,
        else_body: Option<Vec<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    Print(Expr),
    Panic(Expr),
    WriteFile {
        path: Expr,
        content: Expr,
        append: bool,
    },
    Expression(Expr),
    NoOp,
}

/// One `@name{args}` segment of a process pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCall {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    /// Resolved result types; more than one only for calls that return
    /// several values.
    pub types: Vec<ValueType>,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: ValueType) -> Self {
        Expr {
            kind,
            types: vec![ty],
        }
    }

    pub fn with_types(kind: ExprKind, types: Vec<ValueType>) -> Self {
        Expr { kind, types }
    }

    /// First result type, `void` when the expression yields nothing.
    pub fn ty(&self) -> ValueType {
        self.types.first().copied().unwrap_or(ValueType::VOID)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Bool(bool),
    Int(i64),
    String(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Var(String),
    ListLiteral(Vec<Expr>),
    ListElement {
        list: Box<Expr>,
        index: Box<Expr>,
    },
    ListLength(Box<Expr>),
    /// `s[start:end]`, or `s[start]` when `end` is absent.
    StringSubscript {
        value: Box<Expr>,
        start: Box<Expr>,
        end: Option<Box<Expr>>,
    },
    StringLength(Box<Expr>),
    Group(Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Process(Vec<ProcessCall>),
    Input(Option<Box<Expr>>),
    Copy(Box<Expr>),
    FileExists(Box<Expr>),
    ReadFile(Box<Expr>),
    Itoa(Box<Expr>),
    Atoi(Box<Expr>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_equality_is_structural() {
        assert_eq!(ValueType::INT, ValueType::scalar(BaseType::Int));
        assert_ne!(ValueType::INT, ValueType::list(BaseType::Int));
        assert_eq!(ValueType::list(BaseType::String).element(), ValueType::STRING);
    }

    #[test]
    fn type_display() {
        assert_eq!(ValueType::list(BaseType::Bool).to_string(), "[]bool");
        assert_eq!(ValueType::STRING.to_string(), "string");
    }
}
