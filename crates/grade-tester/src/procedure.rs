//! Resumable test procedures.
//!
//! A procedure is started once per implementation. Each start returns an
//! independent task with its own locals; the runner resumes the student's
//! and the master's tasks in lockstep.

use grade_eval::{Exception, ModuleRef, Namespace, Value};

use crate::check::Check;

/// A value a task hands to the runner.
#[derive(Debug, Clone)]
pub enum Yielded {
    /// Already evaluated, with its display label.
    Value { value: Value, label: String },
    /// Evaluated by the runner in the captured namespace.
    Check { check: Check, namespace: Namespace },
}

#[derive(Debug)]
pub enum Resume {
    Yield(Yielded),
    /// The task raised between yields; it cannot be resumed again.
    Raise(Exception),
    Done,
}

/// One running instance of a procedure.
pub trait TestTask {
    fn resume(&mut self) -> Resume;
}

pub trait Procedure {
    fn name(&self) -> &str;

    fn start(&self, module: &ModuleRef) -> Box<dyn TestTask>;
}
