//! Template substitution for check expressions, labels and notes.
//!
//! Bare names are left alone; `{expr}` is replaced by the repr of `expr`
//! evaluated in the namespace, so the substituted text is itself valid
//! expression source. `{expr!s}` uses `str()` instead and `{expr!r}` is an
//! explicit repr. `{{` and `}}` stand for literal braces.

use crate::env::Namespace;
use crate::evaluator::eval_expression;
use crate::exception::Exception;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Repr,
    Str,
}

/// Substitute every `{...}` field of `template`.
///
/// An unmatched brace or an empty field is a `ValueError`; a field whose
/// expression raises propagates that exception.
pub fn substitute(template: &str, namespace: &Namespace) -> Result<String, Exception> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        match ch {
            '{' if chars.peek().is_some_and(|&(_, c)| c == '{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, c)| c == '}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(Exception::value_error(
                    "Single '}' encountered in format string",
                ))
            }
            '{' => {
                let field_start = start + 1;
                let field_end = loop {
                    match chars.next() {
                        Some((i, '}')) => break i,
                        Some(_) => {}
                        None => {
                            return Err(Exception::value_error(
                                "Single '{' encountered in format string",
                            ))
                        }
                    }
                };
                out.push_str(&render_field(&template[field_start..field_end], namespace)?);
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

fn render_field(field: &str, namespace: &Namespace) -> Result<String, Exception> {
    let (expr, conversion) = if let Some(expr) = field.strip_suffix("!s") {
        (expr, Conversion::Str)
    } else if let Some(expr) = field.strip_suffix("!r") {
        (expr, Conversion::Repr)
    } else {
        (field, Conversion::Repr)
    };
    if expr.trim().is_empty() {
        return Err(Exception::value_error("empty expression not allowed in format string"));
    }
    let value = eval_expression(expr, namespace)?;
    Ok(match conversion {
        Conversion::Repr => value.repr(),
        Conversion::Str => value.to_string(),
    })
}

/// Substitute, falling back to the raw template if substitution fails.
pub fn substitute_or_raw(template: &str, namespace: &Namespace) -> String {
    substitute(template, namespace).unwrap_or_else(|_| template.to_string())
}
