//! Python-semantics operators.
//!
//! Shared by the evaluator and by native implementation code, so that
//! `x + 1` written in a check and `ops::add(&x, &Value::Int(1))` written in
//! a native function behave identically, including their exceptions.

use std::cmp::Ordering;

use grade_types::ast::{BinOp, CmpOp};

use crate::exception::Exception;
use crate::value::Value;

/// Longest string or sequence a repetition may build.
const MAX_REPEAT_LEN: usize = 1 << 24;

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn num(value: &Value) -> Option<Num> {
    match value {
        Value::Int(n) => Some(Num::Int(*n)),
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Float(n) => Some(Num::Float(*n)),
        _ => None,
    }
}

fn numbers(left: &Value, right: &Value) -> Option<(Num, Num)> {
    Some((num(left)?, num(right)?))
}

fn to_float(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

fn unsupported(symbol: &str, left: &Value, right: &Value) -> Exception {
    Exception::type_error(format!(
        "unsupported operand type(s) for {symbol}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

fn int_overflow() -> Exception {
    Exception::overflow("integer result does not fit in 64 bits")
}

// ══════════════════════════════════════════════════════════════════════════════
// Arithmetic
// ══════════════════════════════════════════════════════════════════════════════

pub fn binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, Exception> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub => sub(left, right),
        BinOp::Mul => mul(left, right),
        BinOp::Div => true_div(left, right),
        BinOp::FloorDiv => floor_div(left, right),
        BinOp::Mod => modulo(left, right),
        BinOp::Pow => pow(left, right),
    }
}

pub fn add(left: &Value, right: &Value) -> Result<Value, Exception> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => Ok(Value::List([a.as_slice(), b.as_slice()].concat())),
        (Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple([a.as_slice(), b.as_slice()].concat())),
        (Value::Str(_), _) => Err(Exception::type_error(format!(
            "can only concatenate str (not \"{}\") to str",
            right.type_name()
        ))),
        _ => match numbers(left, right) {
            Some((Num::Int(a), Num::Int(b))) => a.checked_add(b).map(Value::Int).ok_or_else(int_overflow),
            Some((a, b)) => Ok(Value::Float(to_float(a) + to_float(b))),
            None => Err(unsupported("+", left, right)),
        },
    }
}

pub fn sub(left: &Value, right: &Value) -> Result<Value, Exception> {
    match numbers(left, right) {
        Some((Num::Int(a), Num::Int(b))) => a.checked_sub(b).map(Value::Int).ok_or_else(int_overflow),
        Some((a, b)) => Ok(Value::Float(to_float(a) - to_float(b))),
        None => Err(unsupported("-", left, right)),
    }
}

pub fn mul(left: &Value, right: &Value) -> Result<Value, Exception> {
    match (left, right) {
        (Value::Str(_) | Value::List(_) | Value::Tuple(_), _) if right.as_int().is_some() => {
            repeat(left, right.as_int().unwrap_or(0))
        }
        (_, Value::Str(_) | Value::List(_) | Value::Tuple(_)) if left.as_int().is_some() => {
            repeat(right, left.as_int().unwrap_or(0))
        }
        _ => match numbers(left, right) {
            Some((Num::Int(a), Num::Int(b))) => a.checked_mul(b).map(Value::Int).ok_or_else(int_overflow),
            Some((a, b)) => Ok(Value::Float(to_float(a) * to_float(b))),
            None => Err(unsupported("*", left, right)),
        },
    }
}

fn repeat(sequence: &Value, times: i64) -> Result<Value, Exception> {
    let times = usize::try_from(times).unwrap_or(0);
    let len = match sequence {
        Value::Str(s) => s.len(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        _ => 0,
    };
    if len.saturating_mul(times) > MAX_REPEAT_LEN {
        return Err(Exception::new("MemoryError", ""));
    }
    Ok(match sequence {
        Value::Str(s) => Value::Str(s.repeat(times)),
        Value::List(items) => Value::List(repeat_items(items, times)),
        Value::Tuple(items) => Value::Tuple(repeat_items(items, times)),
        other => other.clone(),
    })
}

fn repeat_items(items: &[Value], times: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    out
}

/// `/`: always produces a float.
pub fn true_div(left: &Value, right: &Value) -> Result<Value, Exception> {
    match numbers(left, right) {
        Some((Num::Int(_), Num::Int(0))) => Err(Exception::zero_division("division by zero")),
        Some((a, b)) => {
            let divisor = to_float(b);
            if divisor == 0.0 {
                return Err(Exception::zero_division("float division by zero"));
            }
            Ok(Value::Float(to_float(a) / divisor))
        }
        None => Err(unsupported("/", left, right)),
    }
}

/// `//`: rounds toward negative infinity.
pub fn floor_div(left: &Value, right: &Value) -> Result<Value, Exception> {
    match numbers(left, right) {
        Some((Num::Int(a), Num::Int(b))) => int_floor_div(a, b).map(Value::Int),
        Some((a, b)) => {
            let divisor = to_float(b);
            if divisor == 0.0 {
                return Err(Exception::zero_division("float floor division by zero"));
            }
            Ok(Value::Float((to_float(a) / divisor).floor()))
        }
        None => Err(unsupported("//", left, right)),
    }
}

/// `%`: the result takes the sign of the divisor.
pub fn modulo(left: &Value, right: &Value) -> Result<Value, Exception> {
    match numbers(left, right) {
        Some((Num::Int(a), Num::Int(b))) => int_mod(a, b).map(Value::Int),
        Some((a, b)) => {
            let (a, b) = (to_float(a), to_float(b));
            if b == 0.0 {
                return Err(Exception::zero_division("float modulo"));
            }
            let r = a % b;
            Ok(Value::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }))
        }
        None => Err(unsupported("%", left, right)),
    }
}

fn int_floor_div(a: i64, b: i64) -> Result<i64, Exception> {
    if b == 0 {
        return Err(Exception::zero_division("integer division or modulo by zero"));
    }
    let q = a.checked_div(b).ok_or_else(int_overflow)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

fn int_mod(a: i64, b: i64) -> Result<i64, Exception> {
    if b == 0 {
        return Err(Exception::zero_division("integer division or modulo by zero"));
    }
    // i64::MIN % -1 overflows in Rust; the answer is 0
    let r = a.checked_rem(b).unwrap_or(0);
    Ok(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
}

pub fn pow(left: &Value, right: &Value) -> Result<Value, Exception> {
    let Some((base, exp)) = numbers(left, right) else {
        return Err(unsupported("** or pow()", left, right));
    };
    if let (Num::Int(a), Num::Int(b)) = (base, exp) {
        if b >= 0 {
            let b = u32::try_from(b).map_err(|_| int_overflow())?;
            return a.checked_pow(b).map(Value::Int).ok_or_else(int_overflow);
        }
    }
    let (a, b) = (to_float(base), to_float(exp));
    if a == 0.0 && b < 0.0 {
        return Err(Exception::zero_division("0.0 cannot be raised to a negative power"));
    }
    if a < 0.0 && b.is_finite() && b.fract() != 0.0 {
        return Err(Exception::value_error(
            "negative number cannot be raised to a fractional power",
        ));
    }
    let result = a.powf(b);
    if result.is_infinite() && a.is_finite() && b.is_finite() {
        return Err(Exception::overflow("(34, 'Numerical result out of range')"));
    }
    Ok(Value::Float(result))
}

pub fn neg(operand: &Value) -> Result<Value, Exception> {
    match num(operand) {
        Some(Num::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(int_overflow),
        Some(Num::Float(n)) => Ok(Value::Float(-n)),
        None => Err(Exception::type_error(format!(
            "bad operand type for unary -: '{}'",
            operand.type_name()
        ))),
    }
}

pub fn pos(operand: &Value) -> Result<Value, Exception> {
    match num(operand) {
        Some(Num::Int(n)) => Ok(Value::Int(n)),
        Some(Num::Float(n)) => Ok(Value::Float(n)),
        None => Err(Exception::type_error(format!(
            "bad operand type for unary +: '{}'",
            operand.type_name()
        ))),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Comparison
// ══════════════════════════════════════════════════════════════════════════════

pub fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, Exception> {
    let ordered = |test: fn(Ordering) -> bool| -> Result<bool, Exception> {
        Ok(partial_order(left, right, op.symbol())?.is_some_and(test))
    };
    match op {
        CmpOp::Eq => Ok(left.py_eq(right)),
        CmpOp::NotEq => Ok(!left.py_eq(right)),
        CmpOp::Less => ordered(Ordering::is_lt),
        CmpOp::Greater => ordered(Ordering::is_gt),
        CmpOp::LessEq => ordered(Ordering::is_le),
        CmpOp::GreaterEq => ordered(Ordering::is_ge),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => contains(right, left).map(|found| !found),
        CmpOp::Is => Ok(is_same(left, right)),
        CmpOp::IsNot => Ok(!is_same(left, right)),
    }
}

/// Total order used by `sorted`, `min` and `max`; NaN sorts as equal.
pub fn order(left: &Value, right: &Value) -> Result<Ordering, Exception> {
    Ok(partial_order(left, right, "<")?.unwrap_or(Ordering::Equal))
}

fn partial_order(left: &Value, right: &Value, symbol: &str) -> Result<Option<Ordering>, Exception> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !x.py_eq(y) {
                    return partial_order(x, y, symbol);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => match numbers(left, right) {
            Some((Num::Int(a), Num::Int(b))) => Ok(Some(a.cmp(&b))),
            Some((a, b)) => Ok(to_float(a).partial_cmp(&to_float(b))),
            None => Err(Exception::type_error(format!(
                "'{symbol}' not supported between instances of '{}' and '{}'",
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

/// `item in container`
pub fn contains(container: &Value, item: &Value) -> Result<bool, Exception> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            _ => Err(Exception::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                item.type_name()
            ))),
        },
        Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|x| x.py_eq(item))),
        Value::Dict(entries) => Ok(entries.iter().any(|(k, _)| k.py_eq(item))),
        _ => Err(Exception::type_error(format!(
            "argument of type '{}' is not iterable",
            container.type_name()
        ))),
    }
}

/// Identity: shared instances and callables, or equal immutable scalars.
pub fn is_same(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => std::rc::Rc::ptr_eq(a, b),
        (Value::Function(_), Value::Function(_))
        | (Value::Class(_), Value::Class(_))
        | (Value::Method(_), Value::Method(_))
        | (Value::Builtin(_), Value::Builtin(_))
        | (Value::Module(_), Value::Module(_)) => left.py_eq(right),
        _ => false,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Sequences
// ══════════════════════════════════════════════════════════════════════════════

/// Materialise an iterable: sequences, characters of a string, dict keys.
pub fn iterate(value: &Value) -> Result<Vec<Value>, Exception> {
    match value {
        Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Dict(entries) => Ok(entries.iter().map(|(k, _)| k.clone()).collect()),
        _ => Err(Exception::type_error(format!(
            "'{}' object is not iterable",
            value.type_name()
        ))),
    }
}

/// `container[key]`
pub fn index(container: &Value, key: &Value) -> Result<Value, Exception> {
    match container {
        Value::List(items) | Value::Tuple(items) => {
            let kind = container.type_name();
            let Some(i) = key.as_int() else {
                return Err(Exception::type_error(format!(
                    "{kind} indices must be integers or slices, not {}",
                    key.type_name()
                )));
            };
            normalize_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| Exception::index_error(format!("{kind} index out of range")))
        }
        Value::Str(s) => {
            let Some(i) = key.as_int() else {
                return Err(Exception::type_error(format!(
                    "string indices must be integers, not '{}'",
                    key.type_name()
                )));
            };
            let chars: Vec<char> = s.chars().collect();
            normalize_index(i, chars.len())
                .map(|i| Value::Str(chars[i].to_string()))
                .ok_or_else(|| Exception::index_error("string index out of range"))
        }
        Value::Dict(entries) => entries
            .iter()
            .find(|(k, _)| k.py_eq(key))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Exception::key_error(key.repr())),
        _ => Err(Exception::type_error(format!(
            "'{}' object is not subscriptable",
            container.type_name()
        ))),
    }
}

fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let i = if i < 0 { i + len } else { i };
    if (0..len).contains(&i) {
        usize::try_from(i).ok()
    } else {
        None
    }
}

/// `container[start:stop]` with Python's clamping.
pub fn slice(container: &Value, start: Option<&Value>, stop: Option<&Value>) -> Result<Value, Exception> {
    let bound = |value: Option<&Value>| -> Result<Option<i64>, Exception> {
        match value {
            None | Some(Value::None) => Ok(None),
            Some(v) => v.as_int().map(Some).ok_or_else(|| {
                Exception::type_error(
                    "slice indices must be integers or None or have an __index__ method",
                )
            }),
        }
    };
    let (start, stop) = (bound(start)?, bound(stop)?);
    let range = |len: usize| {
        let clamp = |i: i64| -> usize {
            let len_i = i64::try_from(len).unwrap_or(i64::MAX);
            let i = if i < 0 { (i + len_i).max(0) } else { i.min(len_i) };
            usize::try_from(i).unwrap_or(0)
        };
        let lo = start.map_or(0, clamp);
        let hi = stop.map_or(len, clamp);
        (lo, hi.max(lo))
    };
    match container {
        Value::List(items) => {
            let (lo, hi) = range(items.len());
            Ok(Value::List(items[lo..hi].to_vec()))
        }
        Value::Tuple(items) => {
            let (lo, hi) = range(items.len());
            Ok(Value::Tuple(items[lo..hi].to_vec()))
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (lo, hi) = range(chars.len());
            Ok(Value::Str(chars[lo..hi].iter().collect()))
        }
        _ => Err(Exception::type_error(format!(
            "'{}' object is not subscriptable",
            container.type_name()
        ))),
    }
}
