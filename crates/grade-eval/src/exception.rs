//! Exceptions raised by implementation code or by check expressions.
//!
//! An [`Exception`] carries a kind (`ZeroDivisionError`, `NameError`, ...),
//! a message, and a synthetic traceback. Frames are added as the exception
//! leaves each native function, so the outermost call ends up first, the
//! same order a Python traceback prints them in.

use std::fmt;

/// One traceback frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Display path of the code, e.g. `flc37/foo.py` or `<check>`.
    pub file: String,
    pub line: Option<u32>,
    pub function: String,
    /// The source line that was executing, without indentation.
    pub source: Option<String>,
}

impl Frame {
    pub fn new(
        file: impl Into<String>,
        line: Option<u32>,
        function: impl Into<String>,
        source: Option<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
            source,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "  File \"{}\", line {}, in {}", self.file, line, self.function)?,
            None => write!(f, "  File \"{}\", in {}", self.file, self.function)?,
        }
        if let Some(source) = &self.source {
            write!(f, "\n    {source}")?;
        }
        Ok(())
    }
}

/// Where inside a native function the exception was raised.
///
/// Consumed by the first frame pushed after it is set.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Location {
    line: u32,
    source: String,
}

/// A raised exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    kind: String,
    message: String,
    frames: Vec<Frame>,
    location: Option<Location>,
}

impl Exception {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            frames: Vec::new(),
            location: None,
        }
    }

    // ── Common kinds ──────────────────────────────────────────────────────

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new("TypeError", message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new("ValueError", message)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new("NameError", format!("name '{name}' is not defined"))
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::new("AttributeError", message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new("IndexError", message)
    }

    pub fn key_error(message: impl Into<String>) -> Self {
        Self::new("KeyError", message)
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::new("ZeroDivisionError", message)
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new("OverflowError", message)
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new("SyntaxError", message)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Frames, outermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    // ── Traceback construction ────────────────────────────────────────────

    /// Record the line inside the current native function that raised.
    ///
    /// ```
    /// # use grade_eval::Exception;
    /// let exc = Exception::zero_division("integer division or modulo by zero")
    ///     .at(15, "1/0")
    ///     .in_function("flc37/foo.py", "add_one");
    /// assert_eq!(exc.frames()[0].line, Some(15));
    /// ```
    pub fn at(mut self, line: u32, source: impl Into<String>) -> Self {
        self.location = Some(Location {
            line,
            source: source.into(),
        });
        self
    }

    /// Prepend the frame of the function the exception is leaving.
    pub fn in_function(mut self, file: &str, function: &str) -> Self {
        let (line, source) = match self.location.take() {
            Some(loc) => (Some(loc.line), Some(loc.source)),
            None => (None, None),
        };
        self.frames.insert(0, Frame::new(file, line, function, source));
        self
    }

    /// Prepend an already-built frame.
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.location = None;
        self.frames.insert(0, frame);
        self
    }

    /// `Kind: message`, or just `Kind` when the message is empty.
    pub fn summary(&self) -> String {
        if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.message)
        }
    }

    /// Frames followed by the summary line.
    pub fn traceback(&self) -> String {
        let mut out = String::new();
        for frame in &self.frames {
            out.push_str(&frame.to_string());
            out.push('\n');
        }
        out.push_str(&self.summary());
        out
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for Exception {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_consumed_by_first_frame() {
        let exc = Exception::zero_division("integer division or modulo by zero")
            .at(23, "return x / y")
            .in_function("flc37/foo.py", "divide")
            .in_function("flc37/foo.py", "wrapper");
        assert_eq!(exc.frames()[0].function, "wrapper");
        assert_eq!(exc.frames()[0].line, None);
        assert_eq!(exc.frames()[1].line, Some(23));
    }

    #[test]
    fn traceback_layout() {
        let exc = Exception::zero_division("integer division or modulo by zero")
            .at(15, "1/0")
            .in_function("flc37/foo.py", "add_one");
        assert_eq!(
            exc.traceback(),
            "  File \"flc37/foo.py\", line 15, in add_one\n    1/0\nZeroDivisionError: integer division or modulo by zero"
        );
    }

    #[test]
    fn summary_without_message() {
        assert_eq!(Exception::new("StopIteration", "").summary(), "StopIteration");
    }
}
