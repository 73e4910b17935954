use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics kept for one expression.
pub const MAX_ERRORS: usize = 8;

/// Numeric syntax error code (E100–E199).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const INVALID_NUMBER: Self = Self(102);
    pub const UNEXPECTED_CHARACTER: Self = Self(103);
    pub const INVALID_ESCAPE: Self = Self(104);
    pub const CHAINED_COMPARISON: Self = Self(105);
    pub const NESTING_LIMIT: Self = Self(106);
    pub const TRAILING_INPUT: Self = Self(107);
    pub const UNCLOSED_DELIMITER: Self = Self(108);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A syntax error found while lexing or parsing a check expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message} (column {column})")]
pub struct SyntaxError {
    /// Name the expression is reported under (usually `<check>`).
    pub file: String,
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
    /// 1-based column of `span.start`.
    pub column: u32,
    /// The full expression text, for context.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl SyntaxError {
    pub fn new(source: &SourceFile, code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            file: source.name.clone(),
            code,
            message: message.into(),
            span,
            column: source.column(span.start),
            source_line: source.source.clone(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Diagnostics collected over one lex + parse pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<SyntaxError>,
    pub total_errors: usize,
}

impl Diagnostics {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Record an error, keeping at most [`MAX_ERRORS`] of them.
    pub fn push(&mut self, error: SyntaxError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Whether the cap has been reached and scanning should stop.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    pub fn first(&self) -> Option<&SyntaxError> {
        self.errors.first()
    }

    /// Fold another pass's diagnostics into this one.
    pub fn extend(&mut self, other: Diagnostics) {
        for error in other.errors {
            self.push(error);
        }
    }
}
