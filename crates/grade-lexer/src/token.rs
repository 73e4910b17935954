//! Token types for the check expression lexer.

use grade_types::Span;
use std::fmt;

/// Reserved words of the expression language.
pub const KEYWORDS: &[&str] = &["True", "False", "None", "and", "or", "not", "in", "is"];

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    None,

    Identifier(String),

    // ── Keyword operators ──
    And,
    Or,
    Not,
    In,
    Is,

    // ── Operators ──
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    EqEq,
    BangEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,

    // ── Punctuation ──
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,

    Eof,
}

impl TokenKind {
    /// Map a word to its keyword token, if it is reserved.
    pub fn from_keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "True" => Self::True,
            "False" => Self::False,
            "None" => Self::None,
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            "in" => Self::In,
            "is" => Self::Is,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::True | Self::False | Self::None | Self::And | Self::Or | Self::Not | Self::In | Self::Is
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Int(n) => return write!(f, "{n}"),
            Self::Float(n) => return write!(f, "{n}"),
            Self::Str(s) => return write!(f, "{s:?}"),
            Self::Identifier(name) => return write!(f, "{name}"),
            Self::True => "True",
            Self::False => "False",
            Self::None => "None",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::In => "in",
            Self::Is => "is",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::StarStar => "**",
            Self::Slash => "/",
            Self::SlashSlash => "//",
            Self::Percent => "%",
            Self::EqEq => "==",
            Self::BangEq => "!=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEq => "<=",
            Self::GreaterEq => ">=",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Dot => ".",
            Self::Eof => "end of expression",
        };
        f.write_str(text)
    }
}
