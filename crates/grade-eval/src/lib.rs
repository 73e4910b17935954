//! Runtime for the grading engine.
//!
//! Holds the value model, implementations under test (native modules,
//! classes and functions), hybrid overlays for error-carried-forward, and
//! the evaluator that runs check expressions against a namespace.

pub mod builtins;
pub mod env;
pub mod evaluator;
pub mod exception;
pub mod hybrid;
pub mod module;
pub mod object;
pub mod ops;
pub mod template;
pub mod value;

pub use env::{Locals, Namespace};
pub use evaluator::{eval_expression, evaluate, Evaluator, CHECK_FILE};
pub use exception::{Exception, Frame};
pub use hybrid::{HybridModule, PatchError, Source};
pub use module::{Module, ModuleBuilder, ModuleRef};
pub use object::{take_args, BoundMethod, Class, ClassBuilder, Function, Object};
pub use template::{substitute, substitute_or_raw};
pub use value::Value;
