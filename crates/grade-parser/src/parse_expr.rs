//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 8. `or`
//! 7. `and`
//! 6. `not`
//! 5. `==`, `!=`, `<`, `>`, `<=`, `>=`, `in`, `not in`, `is`, `is not` (no chaining)
//! 4. `+`, `-`
//! 3. `*`, `/`, `//`, `%`
//! 2. unary `-`, `+`
//! 1. `**` (right-associative, binds tighter than a unary operator on its left)
//! 0. `.` attribute, `()` call, `[]` index / slice

use grade_lexer::token::TokenKind;
use grade_types::ast::*;
use grade_types::{ErrorCode, Span};

use crate::parser::{Parser, MAX_DEPTH};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_LIMIT,
                format!("expression nesting is limited to {MAX_DEPTH} levels"),
            );
            self.depth -= 1;
            return None;
        }
        let result = self.parse_or();
        self.depth -= 1;
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `OrExpr = AndExpr { "or" AndExpr }`
    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = logical(left, LogicOp::Or, right);
        }
        Some(left)
    }

    /// `AndExpr = NotExpr { "and" NotExpr }`
    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_not()?;
            left = logical(left, LogicOp::And, right);
        }
        Some(left)
    }

    /// `NotExpr = "not" NotExpr | CompExpr`
    fn parse_not(&mut self) -> Option<Expr> {
        if self.check(&TokenKind::Not) {
            let start = self.advance().span;
            let operand = self.parse_not()?;
            let span = start.merge(operand.span);
            return Some(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_comparison()
    }

    /// `CompExpr = AddExpr [ CompOp AddExpr ]`
    ///
    /// Comparison operators do NOT chain: `a < b < c` is a syntax error.
    fn parse_comparison(&mut self) -> Option<Expr> {
        let mut left = self.parse_add()?;
        if let Some(op) = self.eat_comparison_op() {
            let right = self.parse_add()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Compare {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
            if self.peek_comparison_op().is_some() {
                let span = self.current_span();
                self.error_chained_comparison(span);
                return None;
            }
        }
        Some(left)
    }

    fn error_chained_comparison(&mut self, span: Span) {
        self.error_at(
            ErrorCode::CHAINED_COMPARISON,
            "comparison operators cannot be chained; combine them with 'and'",
            span,
        );
    }

    /// Recognise a comparison operator at the cursor, with its token width.
    fn peek_comparison_op(&self) -> Option<(CmpOp, usize)> {
        let op = match self.peek_kind() {
            TokenKind::EqEq => (CmpOp::Eq, 1),
            TokenKind::BangEq => (CmpOp::NotEq, 1),
            TokenKind::Less => (CmpOp::Less, 1),
            TokenKind::Greater => (CmpOp::Greater, 1),
            TokenKind::LessEq => (CmpOp::LessEq, 1),
            TokenKind::GreaterEq => (CmpOp::GreaterEq, 1),
            TokenKind::In => (CmpOp::In, 1),
            TokenKind::Not if *self.look_ahead(1) == TokenKind::In => (CmpOp::NotIn, 2),
            TokenKind::Is if *self.look_ahead(1) == TokenKind::Not => (CmpOp::IsNot, 2),
            TokenKind::Is => (CmpOp::Is, 1),
            _ => return None,
        };
        Some(op)
    }

    fn eat_comparison_op(&mut self) -> Option<CmpOp> {
        let (op, width) = self.peek_comparison_op()?;
        for _ in 0..width {
            self.advance();
        }
        Some(op)
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_add(&mut self) -> Option<Expr> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `MulExpr = UnaryExpr { ("*" | "/" | "//" | "%") UnaryExpr }`
    fn parse_mul(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::SlashSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Some(left)
    }

    /// `UnaryExpr = ("-" | "+") UnaryExpr | PowerExpr`
    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        let start = self.advance().span;
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `PowerExpr = PostfixExpr [ "**" UnaryExpr ]`
    fn parse_power(&mut self) -> Option<Expr> {
        let base = self.parse_postfix()?;
        if self.eat(&TokenKind::StarStar) {
            let exponent = self.parse_unary()?;
            return Some(binary(base, BinOp::Pow, exponent));
        }
        Some(base)
    }

    /// `PostfixExpr = Primary { "." Ident | "(" Args ")" | "[" Subscript "]" }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.expect_identifier()?;
                    let span = expr.span.merge(attr.span);
                    expr = Expr::new(
                        ExprKind::Attribute {
                            object: Box::new(expr),
                            attr,
                        },
                        span,
                    );
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_sequence(&TokenKind::RParen)?;
                    self.expect(&TokenKind::RParen)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            func: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.parse_subscript(expr)?;
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// Parse the inside of `[...]` after the opening bracket: an index or a
    /// `start:stop` slice with either bound optional.
    fn parse_subscript(&mut self, object: Expr) -> Option<Expr> {
        let start = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        let kind = if self.eat(&TokenKind::Colon) {
            let stop = if self.check(&TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            ExprKind::Slice {
                object: Box::new(object.clone()),
                start: start.map(Box::new),
                stop,
            }
        } else {
            match start {
                Some(index) => ExprKind::Index {
                    object: Box::new(object.clone()),
                    index: Box::new(index),
                },
                None => {
                    self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "expected index expression");
                    return None;
                }
            }
        };

        self.expect(&TokenKind::RBracket)?;
        let span = object.span.merge(self.previous_span());
        Some(Expr::new(kind, span))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Float(n) => ExprKind::Float(n),
            TokenKind::Str(s) => {
                self.advance();
                return Some(self.parse_string_concat(s, start));
            }
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::None => ExprKind::None,
            TokenKind::Identifier(name) => ExprKind::Name(name),

            TokenKind::LParen => return self.parse_paren(),
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_sequence(&TokenKind::RBracket)?;
                self.expect(&TokenKind::RBracket)?;
                return Some(Expr::new(ExprKind::List(items), start.merge(self.previous_span())));
            }
            TokenKind::LBrace => return self.parse_dict(),

            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected expression, got '{}'", self.peek_kind()),
                );
                return None;
            }
        };
        self.advance();
        Some(Expr::new(kind, start))
    }

    /// Adjacent string literals concatenate: `'a' 'b'` is `'ab'`.
    fn parse_string_concat(&mut self, first: String, start: Span) -> Expr {
        let mut text = first;
        while let TokenKind::Str(next) = self.peek_kind().clone() {
            self.advance();
            text.push_str(&next);
        }
        Expr::new(ExprKind::Str(text), start.merge(self.previous_span()))
    }

    /// `()` | `(expr)` | `(expr,)` | `(a, b, ...)`
    fn parse_paren(&mut self) -> Option<Expr> {
        let start = self.advance().span;
        if self.eat(&TokenKind::RParen) {
            return Some(Expr::new(ExprKind::Tuple(Vec::new()), start.merge(self.previous_span())));
        }

        let first = self.parse_expression()?;
        if self.eat(&TokenKind::RParen) {
            // Grouping only; widen the span to include the parentheses
            return Some(Expr::new(first.kind, start.merge(self.previous_span())));
        }

        self.expect(&TokenKind::Comma)?;
        let mut items = vec![first];
        items.extend(self.parse_sequence(&TokenKind::RParen)?);
        self.expect(&TokenKind::RParen)?;
        Some(Expr::new(ExprKind::Tuple(items), start.merge(self.previous_span())))
    }

    /// `{ key: value, ... }`
    fn parse_dict(&mut self) -> Option<Expr> {
        let start = self.advance().span;
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let key = self.parse_expression()?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(Expr::new(ExprKind::Dict(entries), start.merge(self.previous_span())))
    }

    /// Comma-separated expressions up to (not including) `close`, allowing a
    /// trailing comma.
    fn parse_sequence(&mut self, close: &TokenKind) -> Option<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) && !self.at_end() {
            items.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(items)
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}

fn logical(left: Expr, op: LogicOp, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        span,
    )
}
