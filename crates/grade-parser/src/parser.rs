//! The [`Parser`] struct and the token-level operations the grammar rules
//! in `parse_expr` are built from.

use grade_lexer::token::{Token, TokenKind};
use grade_types::ast::{Expr, Ident};
use grade_types::{Diagnostics, ErrorCode, SourceFile, Span, SyntaxError};

/// Maximum nesting depth of a single expression.
pub(crate) const MAX_DEPTH: u32 = 64;

/// The expression parser.
///
/// Consumes a token stream produced by the lexer and builds an [`Expr`].
/// Parsing stops at the first error; a check is a single expression, so
/// there is nothing meaningful to resynchronise on.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    source_file: &'src SourceFile,
    errors: Diagnostics,
    /// Current nesting depth (max [`MAX_DEPTH`]).
    pub(crate) depth: u32,
}

/// Result of parsing.
pub struct ParseResult {
    pub expr: Option<Expr>,
    pub errors: Diagnostics,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: Diagnostics::empty(),
            depth: 0,
        }
    }

    /// The token under the cursor, or `Eof` past the end.
    pub(crate) fn peek(&self) -> &Token {
        static EOF: Token = Token {
            kind: TokenKind::Eof,
            span: Span { start: 0, end: 0 },
        };
        self.tokens.get(self.pos).or(self.tokens.last()).unwrap_or(&EOF)
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Step past the current token. Stays put on `Eof`.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Span of the last token stepped past.
    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => Span::point(0),
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Consume `kind` if it is next.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Kind of the token `n` places after the cursor.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Consume `expected` or record an error. Running out of input reports
    /// an unclosed delimiter.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            let code = if self.at_end() {
                ErrorCode::UNCLOSED_DELIMITER
            } else {
                ErrorCode::UNEXPECTED_TOKEN
            };
            self.error_at_current(code, format!("expected '{}', got '{}'", expected, self.peek_kind()));
            None
        }
    }

    /// Expect an identifier token (attribute names after `.`).
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected attribute name, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let error = SyntaxError::new(self.source_file, code, message, span);
        self.errors.push(error);
    }

    /// Parse the token stream as exactly one expression.
    pub fn parse(mut self) -> ParseResult {
        let expr = if self.at_end() {
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "expected expression, got end of expression");
            None
        } else {
            self.parse_expression()
        };

        if expr.is_some() && !self.at_end() {
            self.error_at_current(
                ErrorCode::TRAILING_INPUT,
                format!("unexpected '{}' after expression", self.peek_kind()),
            );
        }

        ParseResult {
            expr,
            errors: self.errors,
        }
    }
}
