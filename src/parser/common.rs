use super::scope::Context;
use crate::ast::{BaseType, ValueType};
use crate::lexer::{Token, TokenKind};
use crate::span::{Diagnostic, Position, SourceMap};

pub(crate) struct Parser<'a> {
    pub tokens: &'a [Token],
    pub pos: usize,
    pub sm: &'a SourceMap,
    pub file: &'a str,
    pub ctx: Context,
    hidden: usize,
}

pub type ParsResult<T> = Result<T, Diagnostic>;

impl<'a> Parser<'a> {
    /// `tokens` must end with `Eof` and contain no comments.
    pub fn new(tokens: &'a [Token], sm: &'a SourceMap, file: &'a str) -> Self {
        Parser {
            tokens,
            pos: 0,
            sm,
            file,
            ctx: Context::new(),
            hidden: 0,
        }
    }

    pub fn peek(&self) -> &'a Token {
        let idx = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    pub fn peek_kind(&self) -> &'a TokenKind {
        &self.peek().kind
    }

    pub fn peek_nth_kind(&self, n: usize) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    pub fn current_pos(&self) -> Position {
        self.peek().pos
    }

    pub fn advance(&mut self) -> &'a Token {
        let t = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    pub fn error<T>(&self, msg: &str, pos: Position) -> ParsResult<T> {
        Err(Diagnostic::new(msg, pos).with_source(self.sm, self.file))
    }

    pub fn error_with_help<T>(&self, msg: &str, pos: Position, help: Option<String>) -> ParsResult<T> {
        let mut diag = Diagnostic::new(msg, pos).with_source(self.sm, self.file);
        diag.help = help;
        Err(diag)
    }

    /// `expected <what>, got <token>` at the current token.
    pub fn expected<T>(&self, what: &str) -> ParsResult<T> {
        let t = self.peek();
        self.error(
            &format!("expected {}, got {}", what, t.kind.describe()),
            t.pos,
        )
    }

    pub fn expect(&mut self, kind: TokenKind) -> ParsResult<&'a Token> {
        if *self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            self.expected(&kind.describe())
        }
    }

    pub fn match_kind(&mut self, kind: TokenKind) -> bool {
        if *self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_ident(&mut self, what: &str) -> ParsResult<(String, Position)> {
        match self.peek_kind() {
            TokenKind::Ident(name) => {
                let pos = self.advance().pos;
                Ok((name.clone(), pos))
            }
            _ => self.expected(what),
        }
    }

    pub fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Newlines inside brackets and argument lists are insignificant.
    pub fn skip_line_breaks(&mut self) {
        while *self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    /// A statement ends at a newline, `;`, a closing brace or end of file.
    pub fn end_statement(&mut self) -> ParsResult<()> {
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof | TokenKind::Case | TokenKind::Default => Ok(()),
            _ => self.expected("end of statement"),
        }
    }

    pub fn parse_type(&mut self) -> ParsResult<ValueType> {
        let is_list = if *self.peek_kind() == TokenKind::LBracket {
            self.advance();
            self.expect(TokenKind::RBracket)?;
            true
        } else {
            false
        };
        let base = match self.peek_kind() {
            TokenKind::Ident(name) => match base_type(name) {
                Some(base) => base,
                None => return self.expected("type"),
            },
            _ => return self.expected("type"),
        };
        self.advance();
        Ok(ValueType { base, is_list })
    }

    pub fn at_type(&self) -> bool {
        match self.peek_kind() {
            TokenKind::LBracket => self.peek_nth_kind(1) == Some(&TokenKind::RBracket),
            TokenKind::Ident(name) => base_type(name).is_some(),
            _ => false,
        }
    }

    /// Fresh compiler-internal variable name; user code cannot spell it.
    pub fn hidden_name(&mut self, stem: &str) -> String {
        let name = format!("__{}{}", stem, self.hidden);
        self.hidden += 1;
        name
    }
}

pub fn base_type(name: &str) -> Option<BaseType> {
    match name {
        "int" => Some(BaseType::Int),
        "bool" => Some(BaseType::Bool),
        "string" => Some(BaseType::String),
        _ => None,
    }
}
