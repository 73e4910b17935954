//! Checks and the comparison of one check across both implementations.

use grade_eval::{evaluate, substitute, substitute_or_raw, Exception, Frame, Namespace, Value, CHECK_FILE};
use serde::Serialize;

/// A check expression evaluated lazily in the namespace it was yielded
/// from: `Check('add_one({i})')`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// Template; `{...}` fields are substituted before evaluation.
    pub expr: String,
    pub note: Option<String>,
}

impl Check {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Substitute, then evaluate the substituted text.
    pub fn evaluate(&self, namespace: &Namespace) -> Result<Value, Exception> {
        let text = substitute(&self.expr, namespace).map_err(|exc| {
            if exc.frames().is_empty() {
                exc.with_frame(Frame::new(
                    CHECK_FILE,
                    Some(1),
                    "<module>",
                    Some(self.expr.trim().to_string()),
                ))
            } else {
                exc
            }
        })?;
        evaluate(&text, namespace)
    }

    /// Display label: the expression substituted against `namespace`, or
    /// the raw template if that fails.
    pub fn label(&self, namespace: &Namespace) -> String {
        substitute_or_raw(&self.expr, namespace)
    }

    pub fn rendered_note(&self, namespace: &Namespace) -> Option<String> {
        self.note.as_deref().map(|note| substitute_or_raw(note, namespace))
    }
}

/// A raised exception, flattened for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionRecord {
    pub kind: String,
    pub message: String,
    /// Frames and the final `Kind: message` line.
    pub traceback: String,
}

impl ExceptionRecord {
    /// `Kind: message`
    pub fn summary(&self) -> String {
        if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.message)
        }
    }
}

impl From<&Exception> for ExceptionRecord {
    fn from(exc: &Exception) -> Self {
        Self {
            kind: exc.kind().to_string(),
            message: exc.message().to_string(),
            traceback: exc.traceback(),
        }
    }
}

/// What one implementation produced for a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Observation {
    /// The repr of the value.
    Value(String),
    Raised(ExceptionRecord),
    /// The implementation finished before reaching the check.
    Missing,
}

impl Observation {
    fn expected(&self) -> String {
        match self {
            Self::Value(repr) => format!("should be {repr}"),
            Self::Raised(record) => format!("should raise {}", record.summary()),
            Self::Missing => "should not be reachable".to_string(),
        }
    }

    fn actual(&self) -> String {
        match self {
            Self::Value(repr) => format!("but it is {repr}"),
            Self::Raised(record) => {
                format!("but student code raised an exception:\n{}", record.traceback)
            }
            Self::Missing => "but student code never reached this check".to_string(),
        }
    }
}

/// The comparison of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub label: String,
    pub master: Observation,
    pub student: Observation,
    /// Both produced values and the values are equal.
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CheckOutcome {
    /// Compare master's result with the student's; `None` means the student
    /// never reached the check.
    pub fn compare(
        label: String,
        master: &Result<Value, Exception>,
        student: Option<&Result<Value, Exception>>,
        note: Option<String>,
    ) -> Self {
        let matched = matches!((master, student), (Ok(m), Some(Ok(s))) if m.py_eq(s));
        Self {
            label,
            master: observe(master),
            student: student.map_or(Observation::Missing, observe),
            matched,
            note,
        }
    }

    /// Feedback for a mismatch.
    pub fn message(&self) -> String {
        let mut out = format!(
            "{} {}, {}",
            self.label,
            self.master.expected(),
            self.student.actual()
        );
        if let Some(note) = &self.note {
            out.push_str("\n Note: ");
            out.push_str(note);
        }
        out
    }

    /// Line shown for a matched check when passing checks are rendered.
    pub fn passing_message(&self) -> String {
        match &self.student {
            Observation::Value(repr) => format!("{} is correct: {repr}", self.label),
            _ => format!("{} is correct", self.label),
        }
    }
}

fn observe(result: &Result<Value, Exception>) -> Observation {
    match result {
        Ok(value) => Observation::Value(value.repr()),
        Err(exc) => Observation::Raised(ExceptionRecord::from(exc)),
    }
}
