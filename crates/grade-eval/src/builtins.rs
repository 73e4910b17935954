//! Built-in functions and the methods of built-in types.

use std::fmt;

use crate::exception::Exception;
use crate::ops;
use crate::value::Value;

type BuiltinFn = fn(Vec<Value>) -> Result<Value, Exception>;

/// A built-in function such as `len` or `sorted`.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    func: BuiltinFn,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value, Exception> {
        (self.func)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<built-in function {}>", self.name)
    }
}

const BUILTINS: &[(&str, BuiltinFn)] = &[
    ("len", len),
    ("str", str_),
    ("repr", repr),
    ("int", int),
    ("float", float),
    ("bool", bool_),
    ("abs", abs),
    ("min", min),
    ("max", max),
    ("sum", sum),
    ("sorted", sorted),
    ("list", list),
    ("tuple", tuple),
    ("range", range),
    ("round", round),
];

pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|&(name, func)| Builtin { name, func })
}

/// Names of every built-in function.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

// ══════════════════════════════════════════════════════════════════════════════
// Argument helpers
// ══════════════════════════════════════════════════════════════════════════════

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), Exception> {
    let given = args.len();
    if given < min {
        let what = if min == 1 { "argument" } else { "arguments" };
        return Err(Exception::type_error(format!(
            "{name}() takes at least {min} {what} ({given} given)"
        )));
    }
    if given > max {
        let what = if max == 1 { "argument" } else { "arguments" };
        return Err(Exception::type_error(format!(
            "{name}() takes at most {max} {what} ({given} given)"
        )));
    }
    Ok(())
}

fn one(name: &str, args: Vec<Value>) -> Result<Value, Exception> {
    arity(name, &args, 1, 1)?;
    Ok(args.into_iter().next().unwrap_or(Value::None))
}

fn int_arg(function: &str, value: &Value) -> Result<i64, Exception> {
    value.as_int().ok_or_else(|| {
        Exception::type_error(format!(
            "{function}() argument must be an integer, not '{}'",
            value.type_name()
        ))
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

fn len(args: Vec<Value>) -> Result<Value, Exception> {
    let value = one("len", args)?;
    let n = match &value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Dict(entries) => entries.len(),
        _ => {
            return Err(Exception::type_error(format!(
                "object of type '{}' has no len()",
                value.type_name()
            )))
        }
    };
    Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
}

fn str_(args: Vec<Value>) -> Result<Value, Exception> {
    arity("str", &args, 0, 1)?;
    Ok(Value::Str(args.first().map(Value::to_string).unwrap_or_default()))
}

fn repr(args: Vec<Value>) -> Result<Value, Exception> {
    Ok(Value::Str(one("repr", args)?.repr()))
}

fn int(args: Vec<Value>) -> Result<Value, Exception> {
    arity("int", &args, 0, 1)?;
    match args.first() {
        None => Ok(Value::Int(0)),
        Some(Value::Int(n)) => Ok(Value::Int(*n)),
        Some(Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        Some(Value::Float(f)) => {
            if !f.is_finite() {
                return Err(Exception::overflow(format!(
                    "cannot convert float {} to integer",
                    Value::Float(*f).repr()
                )));
            }
            let truncated = f.trunc();
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                return Err(Exception::overflow("integer result does not fit in 64 bits"));
            }
            Ok(Value::Int(truncated as i64))
        }
        Some(Value::Str(s)) => s.trim().replace('_', "").parse::<i64>().map(Value::Int).map_err(|_| {
            Exception::value_error(format!(
                "invalid literal for int() with base 10: {}",
                Value::Str(s.clone()).repr()
            ))
        }),
        Some(other) => Err(Exception::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn float(args: Vec<Value>) -> Result<Value, Exception> {
    arity("float", &args, 0, 1)?;
    match args.first() {
        None => Ok(Value::Float(0.0)),
        Some(Value::Str(s)) => {
            let text = s.trim();
            let parsed = match text.to_ascii_lowercase().as_str() {
                "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
                "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
                "nan" | "+nan" | "-nan" => Some(f64::NAN),
                _ => text.parse::<f64>().ok(),
            };
            parsed.map(Value::Float).ok_or_else(|| {
                Exception::value_error(format!(
                    "could not convert string to float: {}",
                    Value::Str(s.clone()).repr()
                ))
            })
        }
        Some(other) => other.as_float().map(Value::Float).ok_or_else(|| {
            Exception::type_error(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn bool_(args: Vec<Value>) -> Result<Value, Exception> {
    arity("bool", &args, 0, 1)?;
    Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
}

fn abs(args: Vec<Value>) -> Result<Value, Exception> {
    match one("abs", args)? {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| Exception::overflow("integer result does not fit in 64 bits")),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(Exception::type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

/// `min(iterable)` or `min(a, b, ...)`.
fn extreme(name: &str, args: Vec<Value>, keep: std::cmp::Ordering) -> Result<Value, Exception> {
    arity(name, &args, 1, usize::MAX)?;
    let items = if args.len() == 1 {
        ops::iterate(&args[0])?
    } else {
        args
    };
    let mut iter = items.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(Exception::value_error(format!("{name}() arg is an empty sequence")));
    };
    for item in iter {
        if ops::order(&item, &best)? == keep {
            best = item;
        }
    }
    Ok(best)
}

fn min(args: Vec<Value>) -> Result<Value, Exception> {
    extreme("min", args, std::cmp::Ordering::Less)
}

fn max(args: Vec<Value>) -> Result<Value, Exception> {
    extreme("max", args, std::cmp::Ordering::Greater)
}

fn sum(args: Vec<Value>) -> Result<Value, Exception> {
    arity("sum", &args, 1, 2)?;
    let mut total = args.get(1).cloned().unwrap_or(Value::Int(0));
    if matches!(total, Value::Str(_)) {
        return Err(Exception::type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    for item in ops::iterate(&args[0])? {
        total = ops::add(&total, &item)?;
    }
    Ok(total)
}

fn sorted(args: Vec<Value>) -> Result<Value, Exception> {
    let mut items = ops::iterate(&one("sorted", args)?)?;
    let mut failure = None;
    items.sort_by(|a, b| match ops::order(a, b) {
        Ok(ordering) => ordering,
        Err(exc) => {
            failure.get_or_insert(exc);
            std::cmp::Ordering::Equal
        }
    });
    match failure {
        Some(exc) => Err(exc),
        None => Ok(Value::List(items)),
    }
}

fn list(args: Vec<Value>) -> Result<Value, Exception> {
    arity("list", &args, 0, 1)?;
    match args.first() {
        None => Ok(Value::List(Vec::new())),
        Some(value) => Ok(Value::List(ops::iterate(value)?)),
    }
}

fn tuple(args: Vec<Value>) -> Result<Value, Exception> {
    arity("tuple", &args, 0, 1)?;
    match args.first() {
        None => Ok(Value::Tuple(Vec::new())),
        Some(value) => Ok(Value::Tuple(ops::iterate(value)?)),
    }
}

/// Materialised as a list.
fn range(args: Vec<Value>) -> Result<Value, Exception> {
    arity("range", &args, 1, 3)?;
    let ints = args
        .iter()
        .map(|arg| int_arg("range", arg))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => unreachable!("arity checked above"),
    };
    if step == 0 {
        return Err(Exception::value_error("range() arg 3 must not be zero"));
    }
    let span = if step > 0 {
        i128::from(stop) - i128::from(start)
    } else {
        i128::from(start) - i128::from(stop)
    };
    let count = if span <= 0 {
        0
    } else {
        (span + i128::from(step.unsigned_abs()) - 1) / i128::from(step.unsigned_abs())
    };
    if count > (1 << 24) {
        return Err(Exception::new("MemoryError", ""));
    }
    let values = (0..count)
        .map(|i| Value::Int((i128::from(start) + i * i128::from(step)) as i64))
        .collect();
    Ok(Value::List(values))
}

fn round(args: Vec<Value>) -> Result<Value, Exception> {
    arity("round", &args, 1, 2)?;
    let ndigits = match args.get(1) {
        None | Some(Value::None) => None,
        Some(n) => Some(int_arg("round", n)?),
    };
    match (&args[0], ndigits) {
        (Value::Int(n), _) => Ok(Value::Int(*n)),
        (Value::Bool(b), _) => Ok(Value::Int(i64::from(*b))),
        (Value::Float(f), None) => {
            if !f.is_finite() {
                return Err(Exception::overflow("cannot convert float to integer"));
            }
            Ok(Value::Int(f.round_ties_even() as i64))
        }
        (Value::Float(f), Some(digits)) => {
            let exp = i32::try_from(digits.clamp(-308, 308)).unwrap_or(0);
            let scale = 10f64.powi(exp);
            Ok(Value::Float((f * scale).round_ties_even() / scale))
        }
        (other, _) => Err(Exception::type_error(format!(
            "type {} doesn't define __round__ method",
            other.type_name()
        ))),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Methods of built-in types
// ══════════════════════════════════════════════════════════════════════════════

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "split", "join", "replace", "startswith", "endswith", "count", "find",
];
const SEQ_METHODS: &[&str] = &["count", "index"];
const DICT_METHODS: &[&str] = &["get", "keys", "values", "items"];

pub fn has_method(receiver: &Value, name: &str) -> bool {
    let table = match receiver {
        Value::Str(_) => STR_METHODS,
        Value::List(_) | Value::Tuple(_) => SEQ_METHODS,
        Value::Dict(_) => DICT_METHODS,
        _ => return false,
    };
    table.contains(&name)
}

pub fn call_method(receiver: &Value, name: &str, args: Vec<Value>) -> Result<Value, Exception> {
    match receiver {
        Value::Str(s) => str_method(s, name, args),
        Value::List(items) | Value::Tuple(items) => seq_method(receiver, items, name, args),
        Value::Dict(entries) => dict_method(entries, name, args),
        _ => Err(Exception::attribute_error(format!(
            "'{}' object has no attribute '{name}'",
            receiver.type_name()
        ))),
    }
}

fn str_arg<'a>(method: &str, value: &'a Value) -> Result<&'a str, Exception> {
    value.as_str().ok_or_else(|| {
        Exception::type_error(format!(
            "{method}() argument must be str, not {}",
            value.type_name()
        ))
    })
}

fn str_method(s: &str, name: &str, args: Vec<Value>) -> Result<Value, Exception> {
    let qualified = format!("str.{name}");
    match name {
        "upper" => {
            arity(&qualified, &args, 0, 0)?;
            Ok(Value::Str(s.to_uppercase()))
        }
        "lower" => {
            arity(&qualified, &args, 0, 0)?;
            Ok(Value::Str(s.to_lowercase()))
        }
        "strip" => {
            arity(&qualified, &args, 0, 1)?;
            match args.first() {
                None | Some(Value::None) => Ok(Value::Str(s.trim().to_string())),
                Some(chars) => {
                    let chars: Vec<char> = str_arg(name, chars)?.chars().collect();
                    Ok(Value::Str(s.trim_matches(|c| chars.contains(&c)).to_string()))
                }
            }
        }
        "split" => {
            arity(&qualified, &args, 0, 1)?;
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::None) => s.split_whitespace().map(Value::from).collect(),
                Some(sep) => {
                    let sep = str_arg(name, sep)?;
                    if sep.is_empty() {
                        return Err(Exception::value_error("empty separator"));
                    }
                    s.split(sep).map(Value::from).collect()
                }
            };
            Ok(Value::List(parts))
        }
        "join" => {
            arity(&qualified, &args, 1, 1)?;
            let mut pieces = Vec::new();
            for (i, item) in ops::iterate(&args[0])?.iter().enumerate() {
                match item.as_str() {
                    Some(piece) => pieces.push(piece.to_string()),
                    None => {
                        return Err(Exception::type_error(format!(
                            "sequence item {i}: expected str instance, {} found",
                            item.type_name()
                        )))
                    }
                }
            }
            Ok(Value::Str(pieces.join(s)))
        }
        "replace" => {
            arity(&qualified, &args, 2, 2)?;
            let old = str_arg(name, &args[0])?;
            let new = str_arg(name, &args[1])?;
            Ok(Value::Str(s.replace(old, new)))
        }
        "startswith" => {
            arity(&qualified, &args, 1, 1)?;
            Ok(Value::Bool(s.starts_with(str_arg(name, &args[0])?)))
        }
        "endswith" => {
            arity(&qualified, &args, 1, 1)?;
            Ok(Value::Bool(s.ends_with(str_arg(name, &args[0])?)))
        }
        "count" => {
            arity(&qualified, &args, 1, 1)?;
            let sub = str_arg(name, &args[0])?;
            let n = if sub.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(sub).count()
            };
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        "find" => {
            arity(&qualified, &args, 1, 1)?;
            let sub = str_arg(name, &args[0])?;
            let position = s
                .find(sub)
                .map(|byte| i64::try_from(s[..byte].chars().count()).unwrap_or(i64::MAX))
                .unwrap_or(-1);
            Ok(Value::Int(position))
        }
        _ => Err(Exception::attribute_error(format!("'str' object has no attribute '{name}'"))),
    }
}

fn seq_method(receiver: &Value, items: &[Value], name: &str, args: Vec<Value>) -> Result<Value, Exception> {
    let kind = receiver.type_name();
    let qualified = format!("{kind}.{name}");
    match name {
        "count" => {
            arity(&qualified, &args, 1, 1)?;
            let n = items.iter().filter(|x| x.py_eq(&args[0])).count();
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        "index" => {
            arity(&qualified, &args, 1, 1)?;
            match items.iter().position(|x| x.py_eq(&args[0])) {
                Some(i) => Ok(Value::Int(i64::try_from(i).unwrap_or(i64::MAX))),
                None if kind == "tuple" => {
                    Err(Exception::value_error("tuple.index(x): x not in tuple"))
                }
                None => Err(Exception::value_error(format!("{} is not in list", args[0].repr()))),
            }
        }
        _ => Err(Exception::attribute_error(format!(
            "'{kind}' object has no attribute '{name}'"
        ))),
    }
}

fn dict_method(entries: &[(Value, Value)], name: &str, args: Vec<Value>) -> Result<Value, Exception> {
    let qualified = format!("dict.{name}");
    match name {
        "get" => {
            arity(&qualified, &args, 1, 2)?;
            let found = entries.iter().find(|(k, _)| k.py_eq(&args[0]));
            Ok(match found {
                Some((_, value)) => value.clone(),
                None => args.get(1).cloned().unwrap_or(Value::None),
            })
        }
        "keys" => {
            arity(&qualified, &args, 0, 0)?;
            Ok(Value::List(entries.iter().map(|(k, _)| k.clone()).collect()))
        }
        "values" => {
            arity(&qualified, &args, 0, 0)?;
            Ok(Value::List(entries.iter().map(|(_, v)| v.clone()).collect()))
        }
        "items" => {
            arity(&qualified, &args, 0, 0)?;
            Ok(Value::List(
                entries
                    .iter()
                    .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            ))
        }
        _ => Err(Exception::attribute_error(format!("'dict' object has no attribute '{name}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, Exception> {
        lookup(name).expect("builtin exists").call(args)
    }

    #[test]
    fn every_builtin_is_registered() {
        for name in [
            "len", "str", "repr", "int", "float", "bool", "abs", "min", "max", "sum", "sorted", "list",
            "tuple", "range", "round",
        ] {
            assert!(lookup(name).is_some(), "{name}");
        }
        assert_eq!(names().count(), 15);
    }

    #[test]
    fn range_forms() {
        assert_eq!(call("range", vec![Value::Int(3)]).unwrap().repr(), "[0, 1, 2]");
        assert_eq!(
            call("range", vec![Value::Int(2), Value::Int(5)]).unwrap().repr(),
            "[2, 3, 4]"
        );
        assert_eq!(
            call("range", vec![Value::Int(5), Value::Int(0), Value::Int(-2)]).unwrap().repr(),
            "[5, 3, 1]"
        );
        assert_eq!(
            call("range", vec![Value::Int(1), Value::Int(1), Value::Int(0)]).unwrap_err().kind(),
            "ValueError"
        );
    }

    #[test]
    fn round_half_to_even() {
        assert_eq!(call("round", vec![Value::Float(2.5)]).unwrap(), Value::Int(2));
        assert_eq!(call("round", vec![Value::Float(3.5)]).unwrap(), Value::Int(4));
        assert_eq!(
            call("round", vec![Value::Float(1.234), Value::Int(1)]).unwrap(),
            Value::Float(1.2)
        );
    }

    #[test]
    fn int_parsing_errors_quote_the_input() {
        let err = call("int", vec![Value::from("x")]).unwrap_err();
        assert_eq!(err.summary(), "ValueError: invalid literal for int() with base 10: 'x'");
    }

    #[test]
    fn sorted_reports_incomparable_items() {
        let err = call("sorted", vec![Value::List(vec![Value::Int(1), Value::from("a")])]).unwrap_err();
        assert_eq!(err.kind(), "TypeError");
    }

    #[test]
    fn min_max_and_sum() {
        let xs = Value::List(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(call("min", vec![xs.clone()]).unwrap(), Value::Int(1));
        assert_eq!(call("max", vec![Value::Int(4), Value::Int(9)]).unwrap(), Value::Int(9));
        assert_eq!(call("sum", vec![xs]).unwrap(), Value::Int(6));
        assert_eq!(
            call("max", vec![Value::List(vec![])]).unwrap_err().message(),
            "max() arg is an empty sequence"
        );
    }

    #[test]
    fn string_methods() {
        let s = "  a,b ";
        assert_eq!(str_method(s, "strip", vec![]).unwrap(), Value::from("a,b"));
        assert_eq!(
            str_method("a,b", "split", vec![Value::from(",")]).unwrap().repr(),
            "['a', 'b']"
        );
        assert_eq!(
            str_method("-", "join", vec![Value::List(vec![Value::from("x"), Value::from("y")])]).unwrap(),
            Value::from("x-y")
        );
        assert_eq!(str_method("héllo", "find", vec![Value::from("l")]).unwrap(), Value::Int(2));
    }

    #[test]
    fn dict_get_with_default() {
        let d = vec![(Value::from("a"), Value::Int(1))];
        assert_eq!(dict_method(&d, "get", vec![Value::from("z")]).unwrap(), Value::None);
        assert_eq!(
            dict_method(&d, "get", vec![Value::from("z"), Value::Int(0)]).unwrap(),
            Value::Int(0)
        );
    }
}
