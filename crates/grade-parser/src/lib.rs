//! Check expression parser: converts a token stream into an [`Expr`].

mod parse_expr;
mod parser;

pub use parser::{ParseResult, Parser};

use grade_lexer::Lexer;
use grade_types::ast::Expr;
use grade_types::{Diagnostics, SourceFile};

/// Lex and parse one expression, returning the AST or every diagnostic
/// collected along the way.
pub fn parse_source(source: &SourceFile) -> Result<Expr, Diagnostics> {
    let lexed = Lexer::new(source).lex();
    let mut errors = lexed.errors;
    let parsed = Parser::new(lexed.tokens, source).parse();
    errors.extend(parsed.errors);
    match parsed.expr {
        Some(expr) if !errors.has_errors() => Ok(expr),
        _ => Err(errors),
    }
}
