//! Procedures written as a list of steps.
//!
//! ```ignore
//! Script::new("test_add_one", "grade_foo.py", |steps| {
//!     steps
//!         .at_line(112)
//!         .check_with_note("This is simple: add_one(1)", "...")
//!         .for_each("i", "range(2, 5)", |body| body.check("add_one({i})"))
//! })
//! ```
//!
//! Every step has a line number, counted from the line set with
//! [`StepList::at_line`] (1 by default), and a source text. Both show up in
//! the procedure's traceback frame when a step raises.

use std::fmt;
use std::rc::Rc;

use grade_eval::value::str_repr;
use grade_eval::{eval_expression, ops, substitute_or_raw, Exception, Frame, Locals, ModuleRef, Value};
use tracing::debug;

use crate::check::Check;
use crate::procedure::{Procedure, Resume, TestTask, Yielded};

/// Native step body, for set-up that expressions cannot express.
pub type Action = Rc<dyn Fn(&mut Locals, &ModuleRef) -> Result<(), Exception>>;

#[derive(Clone)]
enum StepKind {
    Check(Check),
    YieldValue { expr: String, label: String },
    Assign { name: String, expr: String },
    Exec(String),
    ForEach { var: String, iterable: String, body: Rc<[Step]> },
    Action(Action),
}

#[derive(Clone)]
struct Step {
    line: u32,
    source: String,
    kind: StepKind,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.source)
    }
}

/// Builder for the steps of a [`Script`].
pub struct StepList {
    steps: Vec<Step>,
    next_line: u32,
}

impl StepList {
    fn starting_at(line: u32) -> Self {
        Self {
            steps: Vec::new(),
            next_line: line,
        }
    }

    /// Number the following steps from `line`.
    pub fn at_line(mut self, line: u32) -> Self {
        self.next_line = line;
        self
    }

    fn push(mut self, source: String, kind: StepKind) -> Self {
        self.steps.push(Step {
            line: self.next_line,
            source,
            kind,
        });
        self.next_line += 1;
        self
    }

    /// `yield Check(expr)`
    pub fn check(self, expr: &str) -> Self {
        let source = format!("yield Check({})", str_repr(expr));
        self.push(source, StepKind::Check(Check::new(expr)))
    }

    /// `yield Check(expr, note)`
    pub fn check_with_note(self, expr: &str, note: &str) -> Self {
        let source = format!("yield Check({}, {})", str_repr(expr), str_repr(note));
        self.push(source, StepKind::Check(Check::new(expr).with_note(note)))
    }

    /// `yield expr, label`: evaluated right away, so raising here is fatal
    /// for the procedure rather than a check failure.
    pub fn yield_value(self, expr: &str, label: &str) -> Self {
        let source = format!("yield {expr}, {}", str_repr(label));
        self.push(
            source,
            StepKind::YieldValue {
                expr: expr.to_string(),
                label: label.to_string(),
            },
        )
    }

    /// `name = expr`
    pub fn assign(self, name: &str, expr: &str) -> Self {
        let source = format!("{name} = {expr}");
        self.push(
            source,
            StepKind::Assign {
                name: name.to_string(),
                expr: expr.to_string(),
            },
        )
    }

    /// Evaluate `expr` for its side effects.
    pub fn exec(self, expr: &str) -> Self {
        self.push(expr.to_string(), StepKind::Exec(expr.to_string()))
    }

    /// `for var in iterable:` with the steps built by `body`.
    pub fn for_each(self, var: &str, iterable: &str, body: impl FnOnce(StepList) -> StepList) -> Self {
        let body = body(StepList::starting_at(self.next_line + 1));
        let after_body = body.next_line;
        let mut list = self.push(
            format!("for {var} in {iterable}:"),
            StepKind::ForEach {
                var: var.to_string(),
                iterable: iterable.to_string(),
                body: body.steps.into(),
            },
        );
        list.next_line = after_body;
        list
    }

    /// Run a native closure; `source` is what the frame shows if it raises.
    pub fn action<F>(self, source: &str, action: F) -> Self
    where
        F: Fn(&mut Locals, &ModuleRef) -> Result<(), Exception> + 'static,
    {
        self.push(source.to_string(), StepKind::Action(Rc::new(action)))
    }
}

/// A [`Procedure`] made of steps.
pub struct Script {
    name: String,
    file: String,
    steps: Rc<[Step]>,
}

impl Script {
    /// `file` is the display path used in traceback frames.
    pub fn new(name: &str, file: &str, build: impl FnOnce(StepList) -> StepList) -> Self {
        let steps = build(StepList::starting_at(1)).steps;
        Self {
            name: name.to_string(),
            file: file.to_string(),
            steps: steps.into(),
        }
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("name", &self.name)
            .field("file", &self.file)
            .field("steps", &self.steps)
            .finish()
    }
}

impl Procedure for Script {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, module: &ModuleRef) -> Box<dyn TestTask> {
        Box::new(ScriptTask {
            name: self.name.clone(),
            file: self.file.clone(),
            module: module.clone(),
            locals: Locals::new(),
            stack: vec![Cursor {
                steps: Rc::clone(&self.steps),
                pos: 0,
                iteration: None,
            }],
        })
    }
}

struct Iteration {
    var: String,
    items: std::vec::IntoIter<Value>,
}

/// Position in one block of steps.
struct Cursor {
    steps: Rc<[Step]>,
    pos: usize,
    /// Set for loop bodies; the block restarts for each remaining item.
    iteration: Option<Iteration>,
}

struct ScriptTask {
    name: String,
    file: String,
    module: ModuleRef,
    locals: Locals,
    stack: Vec<Cursor>,
}

impl TestTask for ScriptTask {
    fn resume(&mut self) -> Resume {
        loop {
            let Some(cursor) = self.stack.last_mut() else {
                return Resume::Done;
            };
            if cursor.pos >= cursor.steps.len() {
                if let Some(iteration) = cursor.iteration.as_mut() {
                    if let Some(item) = iteration.items.next() {
                        self.locals.set(iteration.var.clone(), item);
                        cursor.pos = 0;
                        continue;
                    }
                }
                self.stack.pop();
                continue;
            }

            let steps = Rc::clone(&cursor.steps);
            let step = &steps[cursor.pos];
            cursor.pos += 1;

            match self.execute(step) {
                Ok(Some(yielded)) => return Resume::Yield(yielded),
                Ok(None) => {}
                Err(exc) => {
                    self.stack.clear();
                    let frame = Frame::new(&self.file, Some(step.line), &self.name, Some(step.source.clone()));
                    return Resume::Raise(exc.with_frame(frame));
                }
            }
        }
    }
}

impl ScriptTask {
    fn execute(&mut self, step: &Step) -> Result<Option<Yielded>, Exception> {
        debug!(
            procedure = %self.name,
            module = self.module.origin(),
            line = step.line,
            step = %step.source,
            "step"
        );
        match &step.kind {
            StepKind::Check(check) => Ok(Some(Yielded::Check {
                check: check.clone(),
                namespace: self.locals.snapshot(&self.module),
            })),
            StepKind::YieldValue { expr, label } => {
                let namespace = self.locals.snapshot(&self.module);
                let value = eval_expression(expr, &namespace)?;
                let label = substitute_or_raw(label, &namespace);
                Ok(Some(Yielded::Value { value, label }))
            }
            StepKind::Assign { name, expr } => {
                let value = eval_expression(expr, &self.locals.snapshot(&self.module))?;
                self.locals.set(name.clone(), value);
                Ok(None)
            }
            StepKind::Exec(expr) => {
                eval_expression(expr, &self.locals.snapshot(&self.module))?;
                Ok(None)
            }
            StepKind::ForEach { var, iterable, body } => {
                let iterable = eval_expression(iterable, &self.locals.snapshot(&self.module))?;
                let items = ops::iterate(&iterable)?;
                // Parked at the end so the next turn binds the first item.
                self.stack.push(Cursor {
                    steps: Rc::clone(body),
                    pos: body.len(),
                    iteration: Some(Iteration {
                        var: var.clone(),
                        items: items.into_iter(),
                    }),
                });
                Ok(None)
            }
            StepKind::Action(action) => {
                action(&mut self.locals, &self.module)?;
                Ok(None)
            }
        }
    }
}
