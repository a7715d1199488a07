use crate::ast::{BinaryOp, CompareOp, LogicalOp};
use crate::span::{Diagnostic, Position, SourceMap};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Comment,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Assign,
    ShortDeclare,
    CompoundAssign(BinaryOp),
    Increment,
    Decrement,
    Binary(BinaryOp),
    Compare(CompareOp),
    Logical(LogicalOp),
    Not,
    Bool(bool),
    Number(i64),
    String(String),
    Var,
    Const,
    Func,
    Return,
    If,
    Else,
    For,
    Range,
    Len,
    Break,
    Continue,
    Print,
    Input,
    Switch,
    Case,
    Default,
    Comma,
    Semicolon,
    Colon,
    Newline,
    Ident(String),
    Pipe,
    At,
    Eof,
}

impl TokenKind {
    /// Human-readable name used in "expected ..." diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Comment => "comment".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Assign => "'='".to_string(),
            TokenKind::ShortDeclare => "':='".to_string(),
            TokenKind::CompoundAssign(op) => format!("'{}='", op.symbol()),
            TokenKind::Increment => "'++'".to_string(),
            TokenKind::Decrement => "'--'".to_string(),
            TokenKind::Binary(op) => format!("'{}'", op.symbol()),
            TokenKind::Compare(op) => format!("'{}'", op.symbol()),
            TokenKind::Logical(op) => format!("'{}'", op.symbol()),
            TokenKind::Not => "'!'".to_string(),
            TokenKind::Bool(b) => format!("'{}'", b),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Var => "'var'".to_string(),
            TokenKind::Const => "'const'".to_string(),
            TokenKind::Func => "'func'".to_string(),
            TokenKind::Return => "'return'".to_string(),
            TokenKind::If => "'if'".to_string(),
            TokenKind::Else => "'else'".to_string(),
            TokenKind::For => "'for'".to_string(),
            TokenKind::Range => "'range'".to_string(),
            TokenKind::Len => "'len'".to_string(),
            TokenKind::Break => "'break'".to_string(),
            TokenKind::Continue => "'continue'".to_string(),
            TokenKind::Print => "'print'".to_string(),
            TokenKind::Input => "'input'".to_string(),
            TokenKind::Switch => "'switch'".to_string(),
            TokenKind::Case => "'case'".to_string(),
            TokenKind::Default => "'default'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Pipe => "'|'".to_string(),
            TokenKind::At => "'@'".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Position,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    row: usize,
    column: usize,
    sm: &'a SourceMap,
    file: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(sm: &'a SourceMap, file: &'a str) -> Self {
        Lexer {
            chars: sm.src().chars().peekable(),
            row: 1,
            column: 1,
            sm,
            file,
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            if ch == '\n' {
                self.row += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn pos(&self) -> Position {
        Position::new(self.row, self.column)
    }

    fn error<T>(&self, msg: &str, start: Position) -> Result<T, Diagnostic> {
        Err(Diagnostic::new(msg, start).with_source(self.sm, self.file))
    }

    /// Consumes the current char and, when the next one is `second`,
    /// that one too. Returns which of the two kinds applies.
    fn one_or_two(&mut self, second: char, single: TokenKind, double: TokenKind) -> TokenKind {
        self.next();
        if self.peek() == Some(&second) {
            self.next();
            double
        } else {
            single
        }
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "var" => TokenKind::Var,
        "const" => TokenKind::Const,
        "func" => TokenKind::Func,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "range" => TokenKind::Range,
        "len" => TokenKind::Len,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "print" => TokenKind::Print,
        "input" => TokenKind::Input,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        _ => return None,
    };
    Some(kind)
}

pub fn lex(sm: &SourceMap, file: &str) -> Result<Vec<Token>, Diagnostic> {
    let mut tokens = Vec::new();
    let mut lexer = Lexer::new(sm, file);

    while let Some(&c) = lexer.peek() {
        let start = lexer.pos();
        let kind = match c {
            ' ' | '\t' | '\r' => {
                lexer.next();
                continue;
            }
            '\n' => {
                lexer.next();
                TokenKind::Newline
            }
            '(' => { lexer.next(); TokenKind::LParen }
            ')' => { lexer.next(); TokenKind::RParen }
            '[' => { lexer.next(); TokenKind::LBracket }
            ']' => { lexer.next(); TokenKind::RBracket }
            '{' => { lexer.next(); TokenKind::LBrace }
            '}' => { lexer.next(); TokenKind::RBrace }
            ',' => { lexer.next(); TokenKind::Comma }
            ';' => { lexer.next(); TokenKind::Semicolon }
            '@' => { lexer.next(); TokenKind::At }
            ':' => lexer.one_or_two('=', TokenKind::Colon, TokenKind::ShortDeclare),
            '=' => lexer.one_or_two('=', TokenKind::Assign, TokenKind::Compare(CompareOp::Eq)),
            '!' => lexer.one_or_two('=', TokenKind::Not, TokenKind::Compare(CompareOp::NotEq)),
            '<' => lexer.one_or_two(
                '=',
                TokenKind::Compare(CompareOp::Lt),
                TokenKind::Compare(CompareOp::Le),
            ),
            '>' => lexer.one_or_two(
                '=',
                TokenKind::Compare(CompareOp::Gt),
                TokenKind::Compare(CompareOp::Ge),
            ),
            '&' => {
                lexer.next();
                if lexer.peek() == Some(&'&') {
                    lexer.next();
                    TokenKind::Logical(LogicalOp::And)
                } else {
                    return lexer.error("expected '&&'", start);
                }
            }
            '|' => lexer.one_or_two('|', TokenKind::Pipe, TokenKind::Logical(LogicalOp::Or)),
            '+' => {
                lexer.next();
                match lexer.peek() {
                    Some('+') => { lexer.next(); TokenKind::Increment }
                    Some('=') => { lexer.next(); TokenKind::CompoundAssign(BinaryOp::Add) }
                    _ => TokenKind::Binary(BinaryOp::Add),
                }
            }
            '-' => {
                lexer.next();
                match lexer.peek() {
                    Some('-') => { lexer.next(); TokenKind::Decrement }
                    Some('=') => { lexer.next(); TokenKind::CompoundAssign(BinaryOp::Sub) }
                    _ => TokenKind::Binary(BinaryOp::Sub),
                }
            }
            '*' => lexer.one_or_two(
                '=',
                TokenKind::Binary(BinaryOp::Mul),
                TokenKind::CompoundAssign(BinaryOp::Mul),
            ),
            '%' => lexer.one_or_two(
                '=',
                TokenKind::Binary(BinaryOp::Mod),
                TokenKind::CompoundAssign(BinaryOp::Mod),
            ),
            '/' => {
                lexer.next();
                match lexer.peek() {
                    Some('/') => {
                        let mut text = String::from("/");
                        while let Some(&ch) = lexer.peek() {
                            if ch == '\n' {
                                break;
                            }
                            text.push(ch);
                            lexer.next();
                        }
                        tokens.push(Token { kind: TokenKind::Comment, text, pos: start });
                        continue;
                    }
                    Some('=') => { lexer.next(); TokenKind::CompoundAssign(BinaryOp::Div) }
                    _ => TokenKind::Binary(BinaryOp::Div),
                }
            }
            '"' => {
                lexer.next(); // opening quote
                let mut s = String::new();
                loop {
                    match lexer.next() {
                        Some('"') => break,
                        Some('\\') => match lexer.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some('r') => s.push('\r'),
                            Some('"') => s.push('"'),
                            Some('\\') => s.push('\\'),
                            Some(other) => {
                                s.push('\\');
                                s.push(other);
                            }
                            None => return lexer.error("unterminated string", start),
                        },
                        Some('\n') | None => return lexer.error("unterminated string", start),
                        Some(ch) => s.push(ch),
                    }
                }
                let text = format!("{:?}", s);
                tokens.push(Token { kind: TokenKind::String(s), text, pos: start });
                continue;
            }
            _ if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&ch) = lexer.peek() {
                    if !ch.is_ascii_digit() {
                        break;
                    }
                    digits.push(ch);
                    lexer.next();
                }
                let n: i64 = match digits.parse() {
                    Ok(n) => n,
                    Err(_) => {
                        return lexer.error(&format!("integer literal {} is out of range", digits), start);
                    }
                };
                tokens.push(Token { kind: TokenKind::Number(n), text: digits, pos: start });
                continue;
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&ch) = lexer.peek() {
                    if !ch.is_ascii_alphanumeric() && ch != '_' {
                        break;
                    }
                    ident.push(ch);
                    lexer.next();
                }
                let kind = keyword(&ident).unwrap_or_else(|| TokenKind::Ident(ident.clone()));
                tokens.push(Token { kind, text: ident, pos: start });
                continue;
            }
            _ => {
                return lexer.error(&format!("unexpected character '{}'", c), start);
            }
        };
        let text = match &kind {
            TokenKind::Newline => "\\n".to_string(),
            other => other.describe().trim_matches('\'').to_string(),
        };
        tokens.push(Token { kind, text, pos: start });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        pos: lexer.pos(),
    });
    Ok(tokens)
}
