use super::common::{base_type, ParsResult, Parser};
use super::scope::{ScopeKind, Signature, Variable};
use crate::ast::*;
use crate::builtins::{self, Builtin};
use crate::lexer::TokenKind;
use crate::span::Position;

/// Validation run over a block once its terminator is reached.
pub type BlockCheck<'c> = &'c dyn Fn(&[Stmt]) -> Result<(), String>;

impl<'a> Parser<'a> {
    /// Statements up to, not including, `terminator`.
    pub fn parse_block_until(
        &mut self,
        terminator: &TokenKind,
        check: Option<BlockCheck<'_>>,
    ) -> ParsResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            let kind = self.peek_kind();
            if kind == terminator {
                break;
            }
            if *kind == TokenKind::Eof {
                return self.expected(&terminator.describe());
            }
            self.parse_stmt_into(&mut stmts)?;
        }
        if let Some(check) = check {
            if let Err(msg) = check(&stmts) {
                return self.error(&msg, self.current_pos());
            }
        }
        Ok(stmts)
    }

    /// `{ ... }` with `scope` pushed for its duration.
    fn parse_body(&mut self, scope: ScopeKind) -> ParsResult<Vec<Stmt>> {
        self.expect(TokenKind::LBrace)?;
        self.ctx.push(scope);
        let body = self.parse_block_until(&TokenKind::RBrace, None)?;
        self.ctx.pop();
        self.expect(TokenKind::RBrace)?;
        Ok(body)
    }

    fn parse_stmt_into(&mut self, out: &mut Vec<Stmt>) -> ParsResult<()> {
        if *self.peek_kind() == TokenKind::Switch {
            out.extend(self.parse_switch()?);
        } else {
            out.push(self.parse_stmt()?);
        }
        self.end_statement()
    }

    pub fn parse_stmt(&mut self) -> ParsResult<Stmt> {
        let token = self.peek();
        match &token.kind {
            TokenKind::Var => self.parse_var(false),
            TokenKind::Const => self.parse_var(true),
            TokenKind::Func => self.parse_function(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Break => {
                self.advance();
                if !self.ctx.can_break() {
                    return self.error("break is only allowed inside a loop", token.pos);
                }
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.advance();
                if !self.ctx.can_continue() {
                    return self.error("continue is only allowed inside a loop", token.pos);
                }
                Ok(Stmt::Continue)
            }
            TokenKind::Print => self.parse_print(),
            TokenKind::Ident(_) => self.parse_simple_stmt(),
            TokenKind::At | TokenKind::Input => self.parse_expression_stmt(),
            _ => self.expected("statement"),
        }
    }

    fn parse_expression_stmt(&mut self) -> ParsResult<Stmt> {
        let pos = self.current_pos();
        let expr = self.parse_expr()?;
        match expr.kind {
            ExprKind::Call { .. } | ExprKind::Process(_) | ExprKind::Input(_) => {
                Ok(Stmt::Expression(expr))
            }
            _ => self.error("expression value is not used", pos),
        }
    }

    /// Statements that start with an identifier: declarations, assignments,
    /// `++`/`--`, list stores and calls. Also used for `for` headers.
    fn parse_simple_stmt(&mut self) -> ParsResult<Stmt> {
        let (name, pos) = match self.peek_kind() {
            TokenKind::Ident(name) => (name.clone(), self.current_pos()),
            TokenKind::Var => return self.parse_var(false),
            _ => return self.expected("statement"),
        };

        if self.peek_nth_kind(1) == Some(&TokenKind::LParen) {
            match Builtin::from_name(&name) {
                Some(Builtin::Panic) => return self.parse_panic(),
                Some(Builtin::Write) => return self.parse_write(),
                _ => return self.parse_expression_stmt(),
            }
        }

        match self.peek_nth_kind(1) {
            Some(TokenKind::ShortDeclare) | Some(TokenKind::Comma) => {
                let names = self.parse_target_names()?;
                let op_pos = self.current_pos();
                if self.match_kind(TokenKind::ShortDeclare) {
                    let value_pos = self.current_pos();
                    let value = self.parse_expr()?;
                    self.define(names, None, Some((value, value_pos)), false)
                } else if self.match_kind(TokenKind::Assign) {
                    let value_pos = self.current_pos();
                    let value = self.parse_expr()?;
                    self.assign(names, value, value_pos)
                } else {
                    self.error(
                        &format!("expected ':=' or '=', got {}", self.peek_kind().describe()),
                        op_pos,
                    )
                }
            }
            Some(TokenKind::Assign) => {
                self.advance();
                self.advance();
                let value_pos = self.current_pos();
                let value = self.parse_expr()?;
                self.assign(vec![(name, pos)], value, value_pos)
            }
            Some(TokenKind::CompoundAssign(op)) => {
                let op = *op;
                self.advance();
                let op_pos = self.advance().pos;
                let var = self.assignable(&name, pos)?;
                let right = self.parse_value()?;
                let left = Expr::new(ExprKind::Var(name.clone()), var.ty);
                let value = self.make_binary(op, left, right, op_pos)?;
                Ok(Stmt::VarAssignment {
                    targets: vec![Target { name, ty: var.ty }],
                    value,
                })
            }
            Some(TokenKind::Increment) | Some(TokenKind::Decrement) => {
                self.advance();
                let op_token = self.advance();
                let op = if op_token.kind == TokenKind::Increment {
                    BinaryOp::Add
                } else {
                    BinaryOp::Sub
                };
                let var = self.assignable(&name, pos)?;
                if var.ty != ValueType::INT {
                    return self.error(
                        &format!("operator '{}' requires an int variable, got {}", op_token.text, var.ty),
                        op_token.pos,
                    );
                }
                let value = Expr::new(
                    ExprKind::Binary {
                        op,
                        left: Box::new(Expr::new(ExprKind::Var(name.clone()), ValueType::INT)),
                        right: Box::new(Expr::new(ExprKind::Int(1), ValueType::INT)),
                    },
                    ValueType::INT,
                );
                Ok(Stmt::VarAssignment {
                    targets: vec![Target {
                        name,
                        ty: ValueType::INT,
                    }],
                    value,
                })
            }
            Some(TokenKind::LBracket) => self.parse_list_assignment(name, pos),
            _ => {
                if self.ctx.lookup_var(&name).is_none() {
                    return self.undeclared_variable(&name, pos);
                }
                self.advance();
                self.expected("assignment after variable")
            }
        }
    }

    fn parse_target_names(&mut self) -> ParsResult<Vec<(String, Position)>> {
        let mut names = vec![self.expect_ident("variable name")?];
        while self.match_kind(TokenKind::Comma) {
            names.push(self.expect_ident("variable name")?);
        }
        Ok(names)
    }

    /// Rejects names that may not be bound by user code.
    pub fn check_new_name(&self, name: &str, pos: Position) -> ParsResult<()> {
        if name.starts_with("__") {
            return self.error(
                &format!("names starting with '__' are reserved: '{}'", name),
                pos,
            );
        }
        if builtins::is_builtin(name) {
            return self.error(&format!("'{}' is a builtin and cannot be redeclared", name), pos);
        }
        if base_type(name).is_some() {
            return self.error(&format!("'{}' is a type name", name), pos);
        }
        if self.ctx.lookup_fn(name).is_some() {
            return self.error(&format!("'{}' is already declared as a function", name), pos);
        }
        Ok(())
    }

    fn declare(&mut self, name: &str, pos: Position, ty: ValueType, constant: bool) -> ParsResult<()> {
        self.check_new_name(name, pos)?;
        if let Err(msg) = self.ctx.declare_var(name, Variable { ty, constant }) {
            return self.error(&msg, pos);
        }
        Ok(())
    }

    fn assignable(&self, name: &str, pos: Position) -> ParsResult<Variable> {
        match self.ctx.lookup_var(name) {
            Some(var) if var.constant => {
                self.error(&format!("cannot assign to constant '{}'", name), pos)
            }
            Some(var) => Ok(var.clone()),
            None => self.undeclared_variable(name, pos),
        }
    }

    /// Types delivered to `count` targets. A process call hands out a prefix
    /// of (stdout, stderr, exit code); everything else must match exactly.
    fn value_types_for(&self, value: &Expr, count: usize, pos: Position) -> ParsResult<Vec<ValueType>> {
        if value.types.is_empty() {
            return self.error("expression does not produce a value", pos);
        }
        if let ExprKind::Process(_) = value.kind {
            if count > value.types.len() {
                return self.error(
                    &format!("a process call yields at most 3 values, got {} targets", count),
                    pos,
                );
            }
            return Ok(value.types[..count].to_vec());
        }
        if value.types.len() != count {
            return self.error(
                &format!(
                    "cannot assign {} values to {} variables",
                    value.types.len(),
                    count
                ),
                pos,
            );
        }
        Ok(value.types.clone())
    }

    fn define(
        &mut self,
        names: Vec<(String, Position)>,
        declared: Option<ValueType>,
        value: Option<(Expr, Position)>,
        constant: bool,
    ) -> ParsResult<Stmt> {
        let Some((value, value_pos)) = value else {
            let Some(ty) = declared else {
                return self.expected("type or '='");
            };
            let mut targets = Vec::new();
            for (name, pos) in names {
                if name == "_" {
                    return self.error("'_' needs a value to discard", pos);
                }
                self.declare(&name, pos, ty, constant)?;
                targets.push(Target { name, ty });
            }
            return Ok(Stmt::VarDefinition {
                targets,
                value: None,
                constant,
            });
        };

        let types = self.value_types_for(&value, names.len(), value_pos)?;
        let mut targets = Vec::new();
        for ((name, pos), ty) in names.into_iter().zip(types) {
            if let Some(want) = declared {
                if want != ty {
                    return self.error(
                        &format!("cannot use {} as {} in declaration of '{}'", ty, want, name),
                        value_pos,
                    );
                }
            }
            if !ty.is_scalar() && !ty.is_list {
                return self.error(&format!("cannot declare '{}' of type {}", name, ty), pos);
            }
            if name != "_" {
                self.declare(&name, pos, ty, constant)?;
            }
            targets.push(Target { name, ty });
        }
        Ok(Stmt::VarDefinition {
            targets,
            value: Some(value),
            constant,
        })
    }

    fn assign(&mut self, names: Vec<(String, Position)>, value: Expr, value_pos: Position) -> ParsResult<Stmt> {
        let types = self.value_types_for(&value, names.len(), value_pos)?;
        let mut targets = Vec::new();
        for ((name, pos), ty) in names.into_iter().zip(types) {
            if name != "_" {
                let var = self.assignable(&name, pos)?;
                if var.ty != ty {
                    return self.error(
                        &format!("cannot assign {} to '{}' of type {}", ty, name, var.ty),
                        value_pos,
                    );
                }
            }
            targets.push(Target { name, ty });
        }
        Ok(Stmt::VarAssignment { targets, value })
    }

    fn parse_list_assignment(&mut self, name: String, pos: Position) -> ParsResult<Stmt> {
        let var = self.assignable(&name, pos)?;
        if !var.ty.is_list {
            return self.error(
                &format!("cannot assign to an index of '{}' of type {}", name, var.ty),
                pos,
            );
        }
        self.advance();
        self.expect(TokenKind::LBracket)?;
        let index = self.parse_typed(ValueType::INT, "list index")?;
        self.expect(TokenKind::RBracket)?;
        self.expect(TokenKind::Assign)?;
        let elem = var.ty.element();
        let value = self.parse_typed(elem, "list element")?;
        Ok(Stmt::ListAssignment {
            target: Target { name, ty: var.ty },
            index,
            value,
        })
    }

    fn parse_var(&mut self, constant: bool) -> ParsResult<Stmt> {
        self.advance();
        let names = self.parse_target_names()?;
        let declared = if self.at_type() {
            Some(self.parse_type()?)
        } else {
            None
        };
        let value = if self.match_kind(TokenKind::Assign) {
            let pos = self.current_pos();
            Some((self.parse_expr()?, pos))
        } else {
            None
        };
        if constant && value.is_none() {
            return self.expected("'=' in constant declaration");
        }
        self.define(names, declared, value, constant)
    }

    fn parse_function(&mut self) -> ParsResult<Stmt> {
        let func_pos = self.advance().pos;
        if self.ctx.current() != ScopeKind::Program {
            return self.error("functions can only be declared at top level", func_pos);
        }
        let (name, pos) = self.expect_ident("function name")?;
        self.check_new_name(&name, pos)?;
        if self.ctx.lookup_var(&name).is_some() {
            return self.error(&format!("'{}' is already declared as a variable", name), pos);
        }

        self.expect(TokenKind::LParen)?;
        let mut params: Vec<(Target, Position)> = Vec::new();
        self.skip_line_breaks();
        while *self.peek_kind() != TokenKind::RParen {
            let (pname, ppos) = self.expect_ident("parameter name")?;
            if params.iter().any(|(p, _)| p.name == pname) {
                return self.error(&format!("duplicate parameter '{}'", pname), ppos);
            }
            let ty = self.parse_type()?;
            params.push((Target { name: pname, ty }, ppos));
            self.skip_line_breaks();
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
            self.skip_line_breaks();
        }
        self.expect(TokenKind::RParen)?;

        let mut returns = Vec::new();
        if self.at_type() {
            returns.push(self.parse_type()?);
        } else if self.match_kind(TokenKind::LParen) {
            loop {
                returns.push(self.parse_type()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        let sig = Signature {
            params: params.iter().map(|(p, _)| p.ty).collect(),
            returns: returns.clone(),
        };
        if let Err(msg) = self.ctx.declare_fn(&name, sig) {
            return self.error(&msg, pos);
        }

        self.ctx.enter_function(returns.clone());
        for (param, ppos) in &params {
            self.declare(&param.name, *ppos, param.ty, false)?;
        }
        self.expect(TokenKind::LBrace)?;
        let needs_return = !returns.is_empty();
        let fname = name.clone();
        let check = move |body: &[Stmt]| -> Result<(), String> {
            if needs_return && !matches!(body.last(), Some(Stmt::Return(_))) {
                return Err(format!("function '{}' must end with a return statement", fname));
            }
            Ok(())
        };
        let body = self.parse_block_until(&TokenKind::RBrace, Some(&check))?;
        self.expect(TokenKind::RBrace)?;
        self.ctx.exit_function();

        Ok(Stmt::FunctionDefinition {
            name,
            params: params.into_iter().map(|(p, _)| p).collect(),
            returns,
            body,
        })
    }

    fn parse_return(&mut self) -> ParsResult<Stmt> {
        let pos = self.advance().pos;
        let Some(expected) = self.ctx.returns().map(|r| r.to_vec()) else {
            return self.error("return is only allowed inside a function", pos);
        };

        let mut values = Vec::new();
        let mut positions = Vec::new();
        let at_end = matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        );
        if !at_end {
            loop {
                positions.push(self.current_pos());
                values.push(self.parse_expr()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }

        let got: Vec<ValueType> = if values.len() == 1 && values[0].types.len() > 1
            && !matches!(values[0].kind, ExprKind::Process(_))
        {
            values[0].types.clone()
        } else {
            let mut types = Vec::new();
            for (value, vpos) in values.iter().zip(&positions) {
                types.push(self.value_type(value, *vpos)?);
            }
            types
        };

        if got.len() != expected.len() {
            return self.error(
                &format!(
                    "function returns {} values, got {}",
                    expected.len(),
                    got.len()
                ),
                pos,
            );
        }
        for (i, (g, e)) in got.iter().zip(&expected).enumerate() {
            if g != e {
                let at = positions.get(i).copied().unwrap_or(pos);
                return self.error(
                    &format!("return value {} must be {}, got {}", i + 1, e, g),
                    at,
                );
            }
        }
        Ok(Stmt::Return(values))
    }

    fn parse_branch(&mut self) -> ParsResult<Branch> {
        let condition = self.parse_typed(ValueType::BOOL, "condition")?;
        let body = self.parse_body(ScopeKind::If)?;
        Ok(Branch { condition, body })
    }

    fn parse_if(&mut self) -> ParsResult<Stmt> {
        self.advance();
        let mut branches = vec![self.parse_branch()?];
        let mut else_body = None;
        while self.match_kind(TokenKind::Else) {
            if self.match_kind(TokenKind::If) {
                branches.push(self.parse_branch()?);
            } else {
                else_body = Some(self.parse_body(ScopeKind::If)?);
                break;
            }
        }
        Ok(Stmt::If {
            branches,
            else_body,
        })
    }

    fn is_range_header(&self) -> bool {
        let k = |n| self.peek_nth_kind(n);
        let ident = |n| matches!(k(n), Some(TokenKind::Ident(_)));
        (ident(0) && k(1) == Some(&TokenKind::ShortDeclare) && k(2) == Some(&TokenKind::Range))
            || (ident(0)
                && k(1) == Some(&TokenKind::Comma)
                && ident(2)
                && k(3) == Some(&TokenKind::ShortDeclare)
                && k(4) == Some(&TokenKind::Range))
    }

    fn starts_simple_stmt(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Var => true,
            TokenKind::Ident(_) => matches!(
                self.peek_nth_kind(1),
                Some(
                    TokenKind::ShortDeclare
                        | TokenKind::Assign
                        | TokenKind::CompoundAssign(_)
                        | TokenKind::Increment
                        | TokenKind::Decrement
                        | TokenKind::Comma
                )
            ),
            _ => false,
        }
    }

    fn parse_for(&mut self) -> ParsResult<Stmt> {
        self.advance();
        if self.is_range_header() {
            return self.parse_range();
        }

        let before: Vec<String> = self.ctx.var_names().map(str::to_string).collect();
        let (init, condition, post) = if *self.peek_kind() == TokenKind::LBrace {
            (None, None, None)
        } else if *self.peek_kind() == TokenKind::Semicolon || self.starts_simple_stmt() {
            let init = if *self.peek_kind() == TokenKind::Semicolon {
                None
            } else {
                Some(Box::new(self.parse_simple_stmt()?))
            };
            self.expect(TokenKind::Semicolon)?;
            let condition = if *self.peek_kind() == TokenKind::Semicolon {
                None
            } else {
                Some(self.parse_typed(ValueType::BOOL, "loop condition")?)
            };
            self.expect(TokenKind::Semicolon)?;
            let post = if *self.peek_kind() == TokenKind::LBrace {
                None
            } else {
                Some(Box::new(self.parse_simple_stmt()?))
            };
            (init, condition, post)
        } else {
            (None, Some(self.parse_typed(ValueType::BOOL, "loop condition")?), None)
        };
        let header: Vec<String> = self
            .ctx
            .var_names()
            .filter(|n| !before.iter().any(|b| b == n))
            .map(str::to_string)
            .collect();

        let body = self.parse_body(ScopeKind::For)?;
        for name in &header {
            self.ctx.remove_var(name);
        }
        Ok(Stmt::For {
            init,
            condition,
            post,
            body,
        })
    }

    /// `for i, v := range e { body }` becomes
    /// `for i := 0; i < len(e); i = i + 1 { v := e[i]; body }`.
    fn parse_range(&mut self) -> ParsResult<Stmt> {
        let (index_name, index_pos) = self.expect_ident("index variable")?;
        let value_name = if self.match_kind(TokenKind::Comma) {
            Some(self.expect_ident("value variable")?)
        } else {
            None
        };
        self.expect(TokenKind::ShortDeclare)?;
        self.expect(TokenKind::Range)?;
        let source_pos = self.current_pos();
        let source = self.parse_value()?;
        let source_ty = source.ty();
        if !source_ty.is_list && source_ty != ValueType::STRING {
            return self.error(&format!("cannot range over {}", source_ty), source_pos);
        }

        let mut header = Vec::new();
        let index = if index_name == "_" {
            let hidden = self.hidden_name("idx");
            if let Err(msg) = self.ctx.declare_var(&hidden, Variable { ty: ValueType::INT, constant: false }) {
                return self.error(&msg, index_pos);
            }
            hidden
        } else {
            self.declare(&index_name, index_pos, ValueType::INT, false)?;
            index_name
        };
        header.push(index.clone());

        let index_expr = || Expr::new(ExprKind::Var(index.clone()), ValueType::INT);
        let mut prologue = Vec::new();
        if let Some((name, pos)) = value_name.filter(|(n, _)| n != "_") {
            let elem_ty = source_ty.element();
            self.declare(&name, pos, elem_ty, false)?;
            header.push(name.clone());
            let element = if source_ty.is_list {
                ExprKind::ListElement {
                    list: Box::new(source.clone()),
                    index: Box::new(index_expr()),
                }
            } else {
                ExprKind::StringSubscript {
                    value: Box::new(source.clone()),
                    start: Box::new(index_expr()),
                    end: None,
                }
            };
            prologue.push(Stmt::VarDefinition {
                targets: vec![Target { name, ty: elem_ty }],
                value: Some(Expr::new(element, elem_ty)),
                constant: false,
            });
        }

        let length = if source_ty.is_list {
            ExprKind::ListLength(Box::new(source))
        } else {
            ExprKind::StringLength(Box::new(source))
        };
        let condition = Expr::new(
            ExprKind::Compare {
                op: CompareOp::Lt,
                left: Box::new(index_expr()),
                right: Box::new(Expr::new(length, ValueType::INT)),
            },
            ValueType::BOOL,
        );
        let index_target = Target {
            name: index.clone(),
            ty: ValueType::INT,
        };
        let init = Stmt::VarDefinition {
            targets: vec![index_target.clone()],
            value: Some(Expr::new(ExprKind::Int(0), ValueType::INT)),
            constant: false,
        };
        let post = Stmt::VarAssignment {
            targets: vec![index_target],
            value: Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::Add,
                    left: Box::new(index_expr()),
                    right: Box::new(Expr::new(ExprKind::Int(1), ValueType::INT)),
                },
                ValueType::INT,
            ),
        };

        let body = self.parse_body(ScopeKind::For)?;
        for name in &header {
            self.ctx.remove_var(name);
        }
        prologue.extend(body);
        Ok(Stmt::For {
            init: Some(Box::new(init)),
            condition: Some(condition),
            post: Some(Box::new(post)),
            body: prologue,
        })
    }

    fn parse_switch(&mut self) -> ParsResult<Vec<Stmt>> {
        self.advance();
        let mut out = Vec::new();
        let mut hidden = None;

        let tag = if *self.peek_kind() == TokenKind::LBrace {
            None
        } else {
            let pos = self.current_pos();
            let tag = self.parse_value()?;
            let ty = tag.ty();
            if !ty.is_scalar() {
                return self.error(&format!("cannot switch on {}", ty), pos);
            }
            // Anything but a variable or literal is evaluated once up front.
            let simple = matches!(
                tag.kind,
                ExprKind::Var(_) | ExprKind::Int(_) | ExprKind::String(_) | ExprKind::Bool(_)
            );
            if simple {
                Some(tag)
            } else {
                let name = self.hidden_name("sw");
                if let Err(msg) = self.ctx.declare_var(&name, Variable { ty, constant: true }) {
                    return self.error(&msg, pos);
                }
                out.push(Stmt::VarDefinition {
                    targets: vec![Target {
                        name: name.clone(),
                        ty,
                    }],
                    value: Some(tag),
                    constant: true,
                });
                hidden = Some(name.clone());
                Some(Expr::new(ExprKind::Var(name), ty))
            }
        };

        self.expect(TokenKind::LBrace)?;
        self.ctx.push(ScopeKind::Switch);
        let mut branches = Vec::new();
        let mut default: Option<Vec<Stmt>> = None;
        loop {
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Case => {
                    self.advance();
                    let mut condition: Option<Expr> = None;
                    loop {
                        let pos = self.current_pos();
                        let test = match &tag {
                            Some(tag) => {
                                let value = self.parse_value()?;
                                self.make_compare(CompareOp::Eq, tag.clone(), value, pos)?
                            }
                            None => self.parse_typed(ValueType::BOOL, "case condition")?,
                        };
                        condition = Some(match condition {
                            Some(prev) => self.make_logical(LogicalOp::Or, prev, test, pos)?,
                            None => test,
                        });
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::Colon)?;
                    let body = self.parse_case_body()?;
                    if let Some(condition) = condition {
                        branches.push(Branch { condition, body });
                    }
                }
                TokenKind::Default => {
                    let pos = self.advance().pos;
                    if default.is_some() {
                        return self.error("multiple defaults in switch", pos);
                    }
                    self.expect(TokenKind::Colon)?;
                    default = Some(self.parse_case_body()?);
                }
                TokenKind::RBrace => break,
                _ => return self.expected("'case', 'default' or '}'"),
            }
        }
        self.ctx.pop();
        self.expect(TokenKind::RBrace)?;
        if let Some(name) = hidden {
            self.ctx.remove_var(&name);
        }

        if branches.is_empty() {
            out.extend(default.unwrap_or_default());
        } else {
            out.push(Stmt::If {
                branches,
                else_body: default,
            });
        }
        Ok(out)
    }

    fn parse_case_body(&mut self) -> ParsResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace => break,
                TokenKind::Eof => return self.expected("'}'"),
                _ => self.parse_stmt_into(&mut stmts)?,
            }
        }
        Ok(stmts)
    }

    fn parse_print(&mut self) -> ParsResult<Stmt> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        if self.match_kind(TokenKind::RParen) {
            return Ok(Stmt::Print(Expr::new(
                ExprKind::String(String::new()),
                ValueType::STRING,
            )));
        }
        let pos = self.current_pos();
        let value = self.parse_value()?;
        if !value.ty().is_scalar() {
            return self.error(
                &format!("print requires a scalar value, got {}", value.ty()),
                pos,
            );
        }
        self.expect(TokenKind::RParen)?;
        Ok(Stmt::Print(value))
    }

    fn parse_panic(&mut self) -> ParsResult<Stmt> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        let msg = self.parse_typed(ValueType::STRING, "panic message")?;
        self.expect(TokenKind::RParen)?;
        Ok(Stmt::Panic(msg))
    }

    fn parse_write(&mut self) -> ParsResult<Stmt> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        let path = self.parse_typed(ValueType::STRING, "file path")?;
        self.expect(TokenKind::Comma)?;
        let content = self.parse_typed(ValueType::STRING, "file content")?;
        let append = if self.match_kind(TokenKind::Comma) {
            match self.peek_kind() {
                TokenKind::Bool(b) => {
                    let b = *b;
                    self.advance();
                    b
                }
                _ => return self.expected("'true' or 'false' for the append flag"),
            }
        } else {
            false
        };
        self.expect(TokenKind::RParen)?;
        Ok(Stmt::WriteFile {
            path,
            content,
            append,
        })
    }
}
