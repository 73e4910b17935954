//! Runtime values.
//!
//! The model follows Python closely enough that a check written against the
//! reference implementation reads the same way it would in a Python suite:
//! `repr` and `str` forms, truthiness, and cross-type numeric equality all
//! match Python's.

use std::fmt;
use std::rc::Rc;

use crate::builtins::{self, Builtin};
use crate::exception::Exception;
use crate::module::ModuleRef;
use crate::object::{BoundMethod, Class, Function, Object};

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Insertion-ordered; keys are unique under [`Value::py_eq`].
    Dict(Vec<(Value, Value)>),
    Object(Rc<Object>),
    Function(Function),
    Class(Class),
    Method(BoundMethod),
    Builtin(Builtin),
    /// A method of a built-in type bound to its receiver: `'a,b'.split`.
    BuiltinMethod { receiver: Box<Value>, name: String },
    Module(ModuleRef),
}

impl Value {
    /// Python type name, as used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Object(obj) => obj.class_name(),
            Self::Function(_) => "function",
            Self::Class(_) => "type",
            Self::Method(_) => "method",
            Self::Builtin(_) | Self::BuiltinMethod { .. } => "builtin_function_or_method",
            Self::Module(_) => "module",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) | Self::Tuple(items) => !items.is_empty(),
            Self::Dict(entries) => !entries.is_empty(),
            _ => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Python `==`.
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (
                Self::Int(_) | Self::Float(_) | Self::Bool(_),
                Self::Int(_) | Self::Float(_) | Self::Bool(_),
            ) => match (self.as_int(), other.as_int()) {
                (Some(a), Some(b)) => a == b,
                _ => self.as_float() == other.as_float(),
            },
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => seq_eq(a, b),
            (Self::Dict(a), Self::Dict(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k.py_eq(k2) && v.py_eq(v2)))
            }
            // Instances compare by class name and fields so that objects
            // built by two different implementations can be compared.
            (Self::Object(a), Self::Object(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (fa, fb) = (a.fields(), b.fields());
                a.class_name() == b.class_name()
                    && fa.len() == fb.len()
                    && fa
                        .iter()
                        .zip(&fb)
                        .all(|((na, va), (nb, vb))| na == nb && va.py_eq(vb))
            }
            (Self::Function(a), Self::Function(b)) => a.same_as(b),
            (Self::Class(a), Self::Class(b)) => a.same_as(b),
            (Self::Method(a), Self::Method(b)) => a.same_as(b),
            (Self::Builtin(a), Self::Builtin(b)) => a.name() == b.name(),
            (
                Self::BuiltinMethod { receiver: ra, name: na },
                Self::BuiltinMethod { receiver: rb, name: nb },
            ) => na == nb && ra.py_eq(rb),
            (Self::Module(a), Self::Module(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Python `repr()`.
    pub fn repr(&self) -> String {
        match self {
            Self::None => "None".into(),
            Self::Bool(true) => "True".into(),
            Self::Bool(false) => "False".into(),
            Self::Int(n) => n.to_string(),
            Self::Float(n) => float_repr(*n),
            Self::Str(s) => str_repr(s),
            Self::List(items) => format!("[{}]", join_reprs(items)),
            Self::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Self::Tuple(items) => format!("({})", join_reprs(items)),
            Self::Dict(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Self::Object(obj) => {
                let parts: Vec<String> = obj
                    .fields()
                    .iter()
                    .map(|(name, value)| format!("{name}={}", value.repr()))
                    .collect();
                format!("{}({})", obj.class_name(), parts.join(", "))
            }
            Self::Function(func) => format!("<function {}>", func.name()),
            Self::Class(class) => format!("<class '{}'>", class.name()),
            Self::Method(method) => format!("<bound method {}.{}>", method.class_name(), method.name()),
            Self::Builtin(builtin) => format!("<built-in function {}>", builtin.name()),
            Self::BuiltinMethod { receiver, name } => {
                format!("<built-in method {name} of {} object>", receiver.type_name())
            }
            Self::Module(module) => format!("<module '{}'>", module.origin()),
        }
    }

    // ── Attribute access & calls ──────────────────────────────────────────

    /// `value.name`
    pub fn getattr(&self, name: &str) -> Result<Value, Exception> {
        match self {
            Self::Object(obj) => {
                if let Some(value) = obj.get(name) {
                    return Ok(value);
                }
                if obj.has_method(name) {
                    return Ok(Value::Method(BoundMethod::new(Rc::clone(obj), name)));
                }
                Err(Exception::attribute_error(format!(
                    "'{}' object has no attribute '{name}'",
                    obj.class_name()
                )))
            }
            Self::Module(module) => module.attr(name).ok_or_else(|| {
                Exception::attribute_error(format!(
                    "module '{}' has no attribute '{name}'",
                    module.origin()
                ))
            }),
            _ if builtins::has_method(self, name) => Ok(Value::BuiltinMethod {
                receiver: Box::new(self.clone()),
                name: name.to_string(),
            }),
            _ => Err(Exception::attribute_error(format!(
                "'{}' object has no attribute '{name}'",
                self.type_name()
            ))),
        }
    }

    /// `value(args...)`
    pub fn call(&self, args: Vec<Value>) -> Result<Value, Exception> {
        match self {
            Self::Function(func) => func.call(args),
            Self::Class(class) => class.instantiate(args),
            Self::Method(method) => method.call(args),
            Self::Builtin(builtin) => builtin.call(args),
            Self::BuiltinMethod { receiver, name } => builtins::call_method(receiver, name, args),
            _ => Err(Exception::type_error(format!(
                "'{}' object is not callable",
                self.type_name()
            ))),
        }
    }
}

impl fmt::Display for Value {
    /// Python `str()`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.py_eq(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

fn seq_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
}

fn join_reprs(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

/// Python's shortest round-trip float repr: `0.5`, `2.0`, `1e+16`, `1.5e-05`.
pub fn float_repr(n: f64) -> String {
    if n.is_nan() {
        return "nan".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf".into() } else { "-inf".into() };
    }
    // `{:?}` already switches to exponent form outside [1e-4, 1e16)
    let text = format!("{n:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

/// Python string repr: single quotes unless the text contains one and no
/// double quote.
pub fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
