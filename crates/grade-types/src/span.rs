use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open byte range into an expression's source text.
///
/// Check expressions are single-line by construction, so a byte range is
/// all the location information the diagnostics need; columns are derived
/// on demand from the [`SourceFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a zero-width span at a single offset.
    pub fn point(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Source text of a single expression, with the name it is reported under.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Source text covered by `span`, clamped to the text and to char
    /// boundaries. Returns an empty string for spans that fall outside.
    pub fn slice(&self, span: Span) -> &str {
        let len = self.source.len();
        let start = (span.start as usize).min(len);
        let end = (span.end as usize).clamp(start, len);
        self.source.get(start..end).unwrap_or("")
    }

    /// 1-based column of a byte offset, counted in characters.
    pub fn column(&self, offset: u32) -> u32 {
        let offset = (offset as usize).min(self.source.len());
        let prefix = self.source.get(..offset).unwrap_or(&self.source);
        prefix.chars().count() as u32 + 1
    }

    /// Render the source line with a caret marker under `span`.
    pub fn caret(&self, span: Span) -> String {
        let col = self.column(span.start) as usize;
        let width = self.slice(span).chars().count().max(1);
        format!("{}\n{}{}", self.source, " ".repeat(col - 1), "^".repeat(width))
    }
}
