use super::common::{ParsResult, Parser};
use crate::ast::*;
use crate::builtins::Builtin;
use crate::lexer::TokenKind;
use crate::span::Position;
use crate::suggest;

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> ParsResult<Expr> {
        self.parse_or()
    }

    /// An expression that yields exactly one value.
    pub fn parse_value(&mut self) -> ParsResult<Expr> {
        let pos = self.current_pos();
        let expr = self.parse_expr()?;
        self.value_type(&expr, pos)?;
        Ok(expr)
    }

    /// An expression of exactly type `expected`.
    pub fn parse_typed(&mut self, expected: ValueType, what: &str) -> ParsResult<Expr> {
        let pos = self.current_pos();
        let expr = self.parse_expr()?;
        let ty = self.value_type(&expr, pos)?;
        if ty != expected {
            return self.error(&format!("{} must be {}, got {}", what, expected, ty), pos);
        }
        Ok(expr)
    }

    /// Type of a single-valued expression. Process calls count as their
    /// captured stdout here.
    pub fn value_type(&self, expr: &Expr, pos: Position) -> ParsResult<ValueType> {
        match expr.types.len() {
            0 => self.error("expression does not produce a value", pos),
            1 => Ok(expr.ty()),
            _ if matches!(expr.kind, ExprKind::Process(_)) => Ok(expr.ty()),
            n => self.error(
                &format!("expected a single value, got {} values", n),
                pos,
            ),
        }
    }

    fn parse_or(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_and()?;
        while *self.peek_kind() == TokenKind::Logical(LogicalOp::Or) {
            let op_pos = self.advance().pos;
            let right = self.parse_and()?;
            left = self.make_logical(LogicalOp::Or, left, right, op_pos)?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_comparison()?;
        while *self.peek_kind() == TokenKind::Logical(LogicalOp::And) {
            let op_pos = self.advance().pos;
            let right = self.parse_comparison()?;
            left = self.make_logical(LogicalOp::And, left, right, op_pos)?;
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_additive()?;
        while let TokenKind::Compare(op) = *self.peek_kind() {
            let op_pos = self.advance().pos;
            let right = self.parse_additive()?;
            left = self.make_compare(op, left, right, op_pos)?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        while let TokenKind::Binary(op @ (BinaryOp::Add | BinaryOp::Sub)) = *self.peek_kind() {
            let op_pos = self.advance().pos;
            let right = self.parse_multiplicative()?;
            left = self.make_binary(op, left, right, op_pos)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_unary()?;
        while let TokenKind::Binary(op @ (BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod)) =
            *self.peek_kind()
        {
            let op_pos = self.advance().pos;
            let right = self.parse_unary()?;
            left = self.make_binary(op, left, right, op_pos)?;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParsResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Binary(BinaryOp::Sub) => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let op_pos = self.advance().pos;
        let operand = self.parse_unary()?;
        let ty = self.value_type(&operand, op_pos)?;
        let expected = match op {
            UnaryOp::Neg => ValueType::INT,
            UnaryOp::Not => ValueType::BOOL,
        };
        if ty != expected {
            return self.error(
                &format!("operator '{}' requires a {} operand, got {}", op.symbol(), expected, ty),
                op_pos,
            );
        }
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            expected,
        ))
    }

    /// Checks shared by the arithmetic operators: both sides of one type,
    /// every operator on int, only `+` on string.
    pub fn make_binary(&self, op: BinaryOp, left: Expr, right: Expr, pos: Position) -> ParsResult<Expr> {
        let lt = self.value_type(&left, pos)?;
        let rt = self.value_type(&right, pos)?;
        if lt != rt {
            return self.error(
                &format!("mismatched types {} and {} for operator '{}'", lt, rt, op.symbol()),
                pos,
            );
        }
        let legal = lt == ValueType::INT || (lt == ValueType::STRING && op == BinaryOp::Add);
        if !legal {
            return self.error(
                &format!("operator '{}' is not defined for {}", op.symbol(), lt),
                pos,
            );
        }
        Ok(Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            lt,
        ))
    }

    pub fn make_compare(&self, op: CompareOp, left: Expr, right: Expr, pos: Position) -> ParsResult<Expr> {
        let lt = self.value_type(&left, pos)?;
        let rt = self.value_type(&right, pos)?;
        if lt != rt {
            return self.error(
                &format!("mismatched types {} and {} for operator '{}'", lt, rt, op.symbol()),
                pos,
            );
        }
        if !lt.is_scalar() || (op.is_ordering() && lt != ValueType::INT) {
            return self.error(
                &format!("operator '{}' is not defined for {}", op.symbol(), lt),
                pos,
            );
        }
        Ok(Expr::new(
            ExprKind::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ValueType::BOOL,
        ))
    }

    pub fn make_logical(&self, op: LogicalOp, left: Expr, right: Expr, pos: Position) -> ParsResult<Expr> {
        for side in [&left, &right] {
            let ty = self.value_type(side, pos)?;
            if ty != ValueType::BOOL {
                return self.error(
                    &format!("operator '{}' requires bool operands, got {}", op.symbol(), ty),
                    pos,
                );
            }
        }
        Ok(Expr::new(
            ExprKind::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ValueType::BOOL,
        ))
    }

    fn parse_postfix(&mut self) -> ParsResult<Expr> {
        let mut expr = self.parse_primary()?;
        while *self.peek_kind() == TokenKind::LBracket {
            let open = self.advance().pos;
            let ty = self.value_type(&expr, open)?;
            if ty.is_list {
                let index = self.parse_typed(ValueType::INT, "list index")?;
                self.expect(TokenKind::RBracket)?;
                expr = Expr::new(
                    ExprKind::ListElement {
                        list: Box::new(expr),
                        index: Box::new(index),
                    },
                    ty.element(),
                );
            } else if ty == ValueType::STRING {
                expr = self.parse_string_subscript(expr)?;
            } else {
                return self.error(&format!("cannot index a value of type {}", ty), open);
            }
        }
        Ok(expr)
    }

    /// After `s[`: `i]`, `a:b]`, `:b]` or `a:]`.
    fn parse_string_subscript(&mut self, value: Expr) -> ParsResult<Expr> {
        let start = if *self.peek_kind() == TokenKind::Colon {
            Expr::new(ExprKind::Int(0), ValueType::INT)
        } else {
            self.parse_typed(ValueType::INT, "string index")?
        };
        let end = if self.match_kind(TokenKind::Colon) {
            if *self.peek_kind() == TokenKind::RBracket {
                Some(Box::new(Expr::new(
                    ExprKind::StringLength(Box::new(value.clone())),
                    ValueType::INT,
                )))
            } else {
                Some(Box::new(self.parse_typed(ValueType::INT, "string index")?))
            }
        } else {
            None
        };
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::StringSubscript {
                value: Box::new(value),
                start: Box::new(start),
                end,
            },
            ValueType::STRING,
        ))
    }

    fn parse_primary(&mut self) -> ParsResult<Expr> {
        let token = self.peek();
        match &token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::new(ExprKind::Int(*n), ValueType::INT))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::new(ExprKind::String(s.clone()), ValueType::STRING))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(*b), ValueType::BOOL))
            }
            TokenKind::LParen => {
                self.advance();
                self.skip_line_breaks();
                let inner = self.parse_value()?;
                self.skip_line_breaks();
                self.expect(TokenKind::RParen)?;
                let ty = inner.ty();
                Ok(Expr::new(ExprKind::Group(Box::new(inner)), ty))
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::Len => self.parse_len(),
            TokenKind::Input => self.parse_input(),
            TokenKind::At => self.parse_process_chain(),
            TokenKind::Ident(name) => {
                let name = name.clone();
                let pos = token.pos;
                let is_call = self.peek_nth_kind(1) == Some(&TokenKind::LParen);
                if is_call {
                    if let Some(builtin) = Builtin::from_name(&name) {
                        return self.parse_builtin_expr(builtin, pos);
                    }
                    return self.parse_call();
                }
                self.advance();
                match self.ctx.lookup_var(&name) {
                    Some(var) => Ok(Expr::new(ExprKind::Var(name), var.ty)),
                    None => self.undeclared_variable(&name, pos),
                }
            }
            _ => self.expected("expression"),
        }
    }

    pub fn undeclared_variable<T>(&self, name: &str, pos: Position) -> ParsResult<T> {
        let help = suggest::did_you_mean(name, self.ctx.var_names());
        self.error_with_help(&format!("undeclared variable '{}'", name), pos, help)
    }

    fn parse_list_literal(&mut self) -> ParsResult<Expr> {
        let ty = self.parse_type()?;
        if !ty.is_list {
            return self.expected("list type");
        }
        let elem = ty.element();
        self.expect(TokenKind::LBrace)?;
        self.skip_line_breaks();
        let mut items = Vec::new();
        while *self.peek_kind() != TokenKind::RBrace {
            let pos = self.current_pos();
            let item = self.parse_value()?;
            if item.ty() != elem {
                return self.error(
                    &format!("list element must be {}, got {}", elem, item.ty()),
                    pos,
                );
            }
            items.push(item);
            self.skip_line_breaks();
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
            self.skip_line_breaks();
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::new(ExprKind::ListLiteral(items), ty))
    }

    fn parse_len(&mut self) -> ParsResult<Expr> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        let pos = self.current_pos();
        let inner = self.parse_value()?;
        self.expect(TokenKind::RParen)?;
        let ty = inner.ty();
        let kind = if ty.is_list {
            ExprKind::ListLength(Box::new(inner))
        } else if ty == ValueType::STRING {
            ExprKind::StringLength(Box::new(inner))
        } else {
            return self.error(&format!("len is not defined for {}", ty), pos);
        };
        Ok(Expr::new(kind, ValueType::INT))
    }

    fn parse_input(&mut self) -> ParsResult<Expr> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        let prompt = if *self.peek_kind() == TokenKind::RParen {
            None
        } else {
            Some(Box::new(self.parse_typed(ValueType::STRING, "input prompt")?))
        };
        self.expect(TokenKind::RParen)?;
        Ok(Expr::new(ExprKind::Input(prompt), ValueType::STRING))
    }

    pub fn parse_process_chain(&mut self) -> ParsResult<Expr> {
        let mut chain = vec![self.parse_process_call()?];
        while self.match_kind(TokenKind::Pipe) {
            self.skip_line_breaks();
            if *self.peek_kind() != TokenKind::At {
                return self.expected("'@' after '|'");
            }
            chain.push(self.parse_process_call()?);
        }
        Ok(Expr::with_types(
            ExprKind::Process(chain),
            vec![ValueType::STRING, ValueType::STRING, ValueType::INT],
        ))
    }

    fn parse_process_call(&mut self) -> ParsResult<ProcessCall> {
        self.expect(TokenKind::At)?;
        let name = match self.peek_kind() {
            TokenKind::Ident(name) | TokenKind::String(name) => name.clone(),
            _ => return self.expected("program name after '@'"),
        };
        self.advance();
        self.expect(TokenKind::LBrace)?;
        self.skip_line_breaks();
        let mut args = Vec::new();
        while *self.peek_kind() != TokenKind::RBrace {
            let pos = self.current_pos();
            let arg = self.parse_value()?;
            if !arg.ty().is_scalar() {
                return self.error(
                    &format!("process argument must be a scalar, got {}", arg.ty()),
                    pos,
                );
            }
            args.push(arg);
            self.skip_line_breaks();
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
            self.skip_line_breaks();
        }
        self.expect(TokenKind::RBrace)?;
        Ok(ProcessCall { name, args })
    }

    /// `( arg, ... )` after a callee name.
    pub fn parse_args(&mut self) -> ParsResult<Vec<(Expr, Position)>> {
        self.expect(TokenKind::LParen)?;
        self.skip_line_breaks();
        let mut args = Vec::new();
        while *self.peek_kind() != TokenKind::RParen {
            let pos = self.current_pos();
            args.push((self.parse_value()?, pos));
            self.skip_line_breaks();
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
            self.skip_line_breaks();
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    pub fn parse_call(&mut self) -> ParsResult<Expr> {
        let (name, pos) = self.expect_ident("function name")?;
        let sig = match self.ctx.lookup_fn(&name) {
            Some(sig) => sig.clone(),
            None => {
                let help = suggest::did_you_mean(&name, self.ctx.fn_names());
                return self.error_with_help(&format!("undeclared function '{}'", name), pos, help);
            }
        };
        let args = self.parse_args()?;
        if args.len() != sig.params.len() {
            return self.error(
                &format!(
                    "function '{}' expects {} arguments, got {}",
                    name,
                    sig.params.len(),
                    args.len()
                ),
                pos,
            );
        }
        for (i, ((arg, arg_pos), param)) in args.iter().zip(&sig.params).enumerate() {
            if arg.ty() != *param {
                return self.error(
                    &format!(
                        "argument {} of '{}' must be {}, got {}",
                        i + 1,
                        name,
                        param,
                        arg.ty()
                    ),
                    *arg_pos,
                );
            }
        }
        Ok(Expr::with_types(
            ExprKind::Call {
                name,
                args: args.into_iter().map(|(a, _)| a).collect(),
            },
            sig.returns,
        ))
    }

    fn parse_builtin_expr(&mut self, builtin: Builtin, pos: Position) -> ParsResult<Expr> {
        if builtin.is_statement() {
            return self.error(
                &format!("'{}' does not produce a value", builtin.name()),
                pos,
            );
        }
        self.advance();
        let mut args = self.parse_args()?;
        if args.len() != 1 {
            return self.error(
                &format!("'{}' expects 1 argument, got {}", builtin.name(), args.len()),
                pos,
            );
        }
        let (arg, arg_pos) = args.remove(0);
        let ty = arg.ty();
        let arg = Box::new(arg);
        let (kind, result, expected) = match builtin {
            Builtin::Copy => {
                if !ty.is_list {
                    return self.error(&format!("copy requires a list, got {}", ty), arg_pos);
                }
                (ExprKind::Copy(arg), ty, ty)
            }
            Builtin::Exists => (ExprKind::FileExists(arg), ValueType::BOOL, ValueType::STRING),
            Builtin::Read => (ExprKind::ReadFile(arg), ValueType::STRING, ValueType::STRING),
            Builtin::Itoa => (ExprKind::Itoa(arg), ValueType::STRING, ValueType::INT),
            _ => (ExprKind::Atoi(arg), ValueType::INT, ValueType::STRING),
        };
        if ty != expected {
            return self.error(&format!("argument must be {}, got {}", expected, ty), arg_pos);
        }
        Ok(Expr::new(kind, result))
    }
}
