//! Check expression lexer: converts expression text to a token stream.
//!
//! Features:
//! - Python-style literals: integers, floats with optional exponent,
//!   single- or double-quoted strings with backslash escapes
//! - Keyword operators (`and`, `or`, `not`, `in`, `is`)
//! - Newlines are plain whitespace; a check is one expression
//! - Error recovery: collects up to [`grade_types::MAX_ERRORS`] diagnostics

use grade_types::{Diagnostics, ErrorCode, SourceFile, Span, SyntaxError};

use crate::token::{Token, TokenKind};

/// The expression lexer.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Collected errors.
    errors: Diagnostics,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: Diagnostics,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            errors: Diagnostics::empty(),
        }
    }

    /// Lex the entire expression into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.is_full() {
                break;
            }
            let token = self.scan();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, Span::point(self.pos as u32)));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let err = SyntaxError::new(self.source_file, code, message, span);
        self.errors.push(err);
    }

    fn emit_error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let err = SyntaxError::new(self.source_file, code, message, span).with_suggestion(suggestion);
        self.errors.push(err);
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n') = self.peek() {
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token.
    fn scan(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;
        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::point(start as u32));
        };

        let kind = match ch {
            b'\'' | b'"' => return self.scan_string(start, ch),
            b'0'..=b'9' => return self.scan_number(start),
            b'.' if matches!(self.peek(), Some(b'0'..=b'9')) => return self.scan_number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | 0x80..=0xFF => return self.scan_identifier(start),

            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'%' => TokenKind::Percent,
            b'*' => {
                if self.peek() == Some(b'*') {
                    self.advance();
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            b'/' => {
                if self.peek() == Some(b'/') {
                    self.advance();
                    TokenKind::SlashSlash
                } else {
                    TokenKind::Slash
                }
            }
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    let span = self.span_from(start);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        "assignment is not allowed in a check expression",
                        span,
                        "use '==' to compare, or bind the name in a procedure step",
                    );
                    return self.scan();
                }
            }
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::BangEq
                } else {
                    let span = self.span_from(start);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        "unexpected character '!'",
                        span,
                        "use 'not' for negation, or '!=' for inequality",
                    );
                    return self.scan();
                }
            }
            b'<' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b'.' => TokenKind::Dot,

            _ => {
                let span = self.span_from(start);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("unexpected character '{}'", ch as char),
                    span,
                );
                // Error recovery: skip the character and try again
                return self.scan();
            }
        };

        Token::new(kind, self.span_from(start))
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: usize) -> Token {
        let mut is_float = self.source[start] == b'.';
        self.eat_digits();

        if !is_float
            && self.peek() == Some(b'.')
            && !matches!(self.peek_at(1), Some(b'a'..=b'z' | b'A'..=b'Z' | b'_'))
        {
            is_float = true;
            self.advance();
            self.eat_digits();
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            let signed = matches!(self.peek_at(1), Some(b'+' | b'-'));
            let digit_at = if signed { 2 } else { 1 };
            if matches!(self.peek_at(digit_at), Some(b'0'..=b'9')) {
                is_float = true;
                for _ in 0..digit_at {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        let span = self.span_from(start);
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("0");

        let kind = if is_float {
            TokenKind::Float(text.parse().unwrap_or(0.0))
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(_) => {
                    self.emit_error(
                        ErrorCode::INVALID_NUMBER,
                        format!("integer literal {text} does not fit in 64 bits"),
                        span,
                    );
                    TokenKind::Int(0)
                }
            }
        };
        Token::new(kind, span)
    }

    fn eat_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start: usize) -> Token {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == b'_' || ch >= 0x80 {
                self.advance();
            } else {
                break;
            }
        }

        let span = self.span_from(start);
        let text = String::from_utf8_lossy(&self.source[start..self.pos]);
        let kind =
            TokenKind::from_keyword(&text).unwrap_or_else(|| TokenKind::Identifier(text.into_owned()));
        Token::new(kind, span)
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a string literal after its opening quote.
    fn scan_string(&mut self, start: usize, quote: u8) -> Token {
        let mut buf: Vec<u8> = Vec::new();

        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start);
                    self.emit_error(ErrorCode::UNTERMINATED_STRING, "unterminated string literal", span);
                    break;
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    match self.advance() {
                        Some(b'n') => buf.push(b'\n'),
                        Some(b't') => buf.push(b'\t'),
                        Some(b'r') => buf.push(b'\r'),
                        Some(b'0') => buf.push(0),
                        Some(b'\\') => buf.push(b'\\'),
                        Some(b'\'') => buf.push(b'\''),
                        Some(b'"') => buf.push(b'"'),
                        // Unknown escapes are kept verbatim
                        Some(other) => {
                            buf.push(b'\\');
                            buf.push(other);
                        }
                        None => {
                            let span = self.span_from(start);
                            self.emit_error(
                                ErrorCode::UNTERMINATED_STRING,
                                "unexpected end of expression in escape sequence",
                                span,
                            );
                            break;
                        }
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }

        let text = String::from_utf8_lossy(&buf).into_owned();
        Token::new(TokenKind::Str(text), self.span_from(start))
    }
}
