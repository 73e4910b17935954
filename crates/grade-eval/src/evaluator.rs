//! Tree-walking evaluator for check expressions.

use grade_parser::parse_source;
use grade_types::ast::*;
use grade_types::{Diagnostics, SourceFile};
use tracing::trace;

use crate::env::Namespace;
use crate::exception::{Exception, Frame};
use crate::ops;
use crate::value::Value;

/// File name used for frames and diagnostics of check expressions.
pub const CHECK_FILE: &str = "<check>";

/// Evaluate a check expression.
///
/// Exceptions that originate in the expression itself (a `NameError`, a
/// `TypeError` between operands, a syntax error) get a single `<check>`
/// frame showing the expression; exceptions raised inside implementation
/// code keep the implementation's frames.
pub fn evaluate(text: &str, namespace: &Namespace) -> Result<Value, Exception> {
    eval_expression(text, namespace).map_err(|exc| {
        if exc.frames().is_empty() {
            exc.with_frame(Frame::new(
                CHECK_FILE,
                Some(1),
                "<module>",
                Some(text.trim().to_string()),
            ))
        } else {
            exc
        }
    })
}

/// Evaluate an expression without adding a `<check>` frame.
///
/// Used where the caller supplies its own frame, such as a procedure step.
pub fn eval_expression(text: &str, namespace: &Namespace) -> Result<Value, Exception> {
    let source = SourceFile::new(CHECK_FILE, text);
    let expr = parse_source(&source).map_err(|diagnostics| syntax_exception(&diagnostics))?;
    let value = Evaluator::new(namespace).eval(&expr)?;
    trace!(expr = text, value = %value.repr(), "evaluated");
    Ok(value)
}

fn syntax_exception(diagnostics: &Diagnostics) -> Exception {
    match diagnostics.first() {
        Some(error) => Exception::syntax_error(error.to_string()),
        None => Exception::syntax_error("invalid syntax"),
    }
}

/// Walks an [`Expr`] against one namespace.
pub struct Evaluator<'ns> {
    namespace: &'ns Namespace,
}

impl<'ns> Evaluator<'ns> {
    pub fn new(namespace: &'ns Namespace) -> Self {
        Self { namespace }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, Exception> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(n) => Ok(Value::Float(*n)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::None => Ok(Value::None),
            ExprKind::List(items) => Ok(Value::List(self.eval_all(items)?)),
            ExprKind::Tuple(items) => Ok(Value::Tuple(self.eval_all(items)?)),
            ExprKind::Dict(entries) => self.eval_dict(entries),

            ExprKind::Name(name) => self
                .namespace
                .lookup(name)
                .ok_or_else(|| Exception::name_error(name)),
            ExprKind::Attribute { object, attr } => self.eval(object)?.getattr(&attr.name),
            ExprKind::Call { func, args } => {
                let callee = self.eval(func)?;
                let args = self.eval_all(args)?;
                callee.call(args)
            }
            ExprKind::Index { object, index } => {
                let container = self.eval(object)?;
                let key = self.eval(index)?;
                ops::index(&container, &key)
            }
            ExprKind::Slice { object, start, stop } => {
                let container = self.eval(object)?;
                let start = start.as_deref().map(|e| self.eval(e)).transpose()?;
                let stop = stop.as_deref().map(|e| self.eval(e)).transpose()?;
                ops::slice(&container, start.as_ref(), stop.as_ref())
            }

            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Neg => ops::neg(&value),
                    UnaryOp::Pos => ops::pos(&value),
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            ExprKind::Binary { left, op, right } => {
                let lv = self.eval(left)?;
                let rv = self.eval(right)?;
                ops::binary(*op, &lv, &rv)
            }
            ExprKind::Compare { left, op, right } => {
                let lv = self.eval(left)?;
                let rv = self.eval(right)?;
                ops::compare(*op, &lv, &rv).map(Value::Bool)
            }
            // Short-circuit, yielding the deciding operand as Python does
            ExprKind::Logical { left, op, right } => {
                let lv = self.eval(left)?;
                match (op, lv.is_truthy()) {
                    (LogicOp::And, false) | (LogicOp::Or, true) => Ok(lv),
                    _ => self.eval(right),
                }
            }
        }
    }

    fn eval_all(&self, exprs: &[Expr]) -> Result<Vec<Value>, Exception> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn eval_dict(&self, entries: &[(Expr, Expr)]) -> Result<Value, Exception> {
        let mut out: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
        for (key_expr, value_expr) in entries {
            let key = self.eval(key_expr)?;
            if matches!(key, Value::List(_) | Value::Dict(_) | Value::Object(_)) {
                return Err(Exception::type_error(format!(
                    "unhashable type: '{}'",
                    key.type_name()
                )));
            }
            let value = self.eval(value_expr)?;
            match out.iter_mut().find(|(k, _)| k.py_eq(&key)) {
                Some((_, slot)) => *slot = value,
                None => out.push((key, value)),
            }
        }
        Ok(Value::Dict(out))
    }
}
