//! Shared types for the grading engine.
//!
//! This crate defines the expression AST, source spans and the syntax
//! diagnostics produced while turning check text into something the
//! evaluator can run.

mod error;
mod span;
pub mod ast;

pub use error::{Diagnostics, ErrorCode, SyntaxError, MAX_ERRORS};
pub use span::{SourceFile, Span};
