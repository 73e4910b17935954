//! Lockstep execution of one procedure against a master/student pair.

use grade_eval::{Exception, ModuleRef, Value};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::check::{CheckOutcome, ExceptionRecord};
use crate::error::SuiteError;
use crate::procedure::{Procedure, Resume, Yielded};

pub const FATAL_MESSAGE: &str = "Fatal exception in student code. Cannot finish test.";

/// The implementations a procedure runs against.
#[derive(Debug, Clone)]
pub struct ModulePair {
    pub master: ModuleRef,
    pub student: ModuleRef,
}

impl ModulePair {
    pub fn new(master: ModuleRef, student: ModuleRef) -> Self {
        Self { master, student }
    }
}

/// Student code raised outside a check; the rest of the procedure is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fatal {
    pub message: String,
    pub exception: ExceptionRecord,
}

impl Fatal {
    fn new(exc: &Exception) -> Self {
        Self {
            message: FATAL_MESSAGE.to_string(),
            exception: ExceptionRecord::from(exc),
        }
    }

    pub fn render(&self) -> String {
        format!("{}\n{}", self.message, self.exception.traceback)
    }
}

/// One line item of a procedure's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    Check(CheckOutcome),
    Fatal(Fatal),
}

impl Entry {
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Check(outcome) => !outcome.matched,
            Self::Fatal(_) => true,
        }
    }
}

pub fn has_failures(entries: &[Entry]) -> bool {
    entries.iter().any(Entry::is_failure)
}

enum RunState {
    Running,
    ExceptionInStudent(Exception),
    ExceptionInMaster(Exception),
    Completed,
}

/// Run `procedure` once against `pair`, resuming the student first in
/// every round.
///
/// Student faults become entries. A master fault is a suite error.
pub fn run_procedure(procedure: &dyn Procedure, pair: &ModulePair) -> Result<Vec<Entry>, SuiteError> {
    let name = procedure.name();
    info!(procedure = name, student = pair.student.origin(), "running procedure");

    let mut student = procedure.start(&pair.student);
    let mut master = procedure.start(&pair.master);
    let mut student_done = false;
    let mut entries = Vec::new();
    let mut state = RunState::Running;

    loop {
        state = match state {
            RunState::Running => {
                let student_yield = if student_done {
                    None
                } else {
                    match student.resume() {
                        Resume::Yield(yielded) => Some(yielded),
                        Resume::Raise(exc) => {
                            state = RunState::ExceptionInStudent(exc);
                            continue;
                        }
                        Resume::Done => {
                            student_done = true;
                            None
                        }
                    }
                };
                match master.resume() {
                    Resume::Yield(master_yield) => {
                        let outcome = compare(master_yield, student_yield);
                        debug!(
                            procedure = name,
                            label = %outcome.label,
                            matched = outcome.matched,
                            "check"
                        );
                        entries.push(Entry::Check(outcome));
                        RunState::Running
                    }
                    Resume::Raise(exc) => RunState::ExceptionInMaster(exc),
                    // Anything the student yields past this point is ignored.
                    Resume::Done => RunState::Completed,
                }
            }
            RunState::ExceptionInStudent(exc) => {
                warn!(procedure = name, error = %exc, "student code raised outside a check");
                entries.push(Entry::Fatal(Fatal::new(&exc)));
                RunState::Completed
            }
            RunState::ExceptionInMaster(exc) => {
                return Err(SuiteError::ReferenceImplementation {
                    procedure: name.to_string(),
                    exception: ExceptionRecord::from(&exc),
                });
            }
            RunState::Completed => break,
        };
    }

    Ok(entries)
}

fn compare(master: Yielded, student: Option<Yielded>) -> CheckOutcome {
    let student_result = student.map(observe);
    let (label, note) = match &master {
        Yielded::Value { label, .. } => (label.clone(), None),
        Yielded::Check { check, namespace } => (check.label(namespace), check.rendered_note(namespace)),
    };
    let master_result = observe(master);
    CheckOutcome::compare(label, &master_result, student_result.as_ref(), note)
}

fn observe(yielded: Yielded) -> Result<Value, Exception> {
    match yielded {
        Yielded::Value { value, .. } => Ok(value),
        Yielded::Check { check, namespace } => check.evaluate(&namespace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;
    use grade_eval::Module;

    fn module(origin: &str, answer: i64) -> ModuleRef {
        Module::builder("m", origin).constant("answer", Value::Int(answer)).build()
    }

    #[test]
    fn both_done_completes() {
        let script = Script::new("t", "g.py", |s| s);
        let pair = ModulePair::new(module("m.py", 1), module("s.py", 1));
        assert!(run_procedure(&script, &pair).unwrap().is_empty());
    }

    #[test]
    fn equal_checks_match() {
        let script = Script::new("t", "g.py", |s| s.check("answer").check("answer + 1"));
        let pair = ModulePair::new(module("m.py", 1), module("s.py", 1));
        let entries = run_procedure(&script, &pair).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(!has_failures(&entries));
    }

    #[test]
    fn master_fault_is_suite_error() {
        let script = Script::new("t", "g.py", |s| s.check("answer").exec("answer"));
        let master = Module::builder("m", "m.py").build();
        let pair = ModulePair::new(master, module("s.py", 1));
        let err = run_procedure(&script, &pair).unwrap_err();
        assert!(matches!(err, SuiteError::ReferenceImplementation { .. }));
        assert_eq!(err.procedure(), "t");
    }
}
