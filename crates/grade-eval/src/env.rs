//! Name resolution for check expressions.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::builtins;
use crate::module::ModuleRef;
use crate::value::Value;

/// Local variables of one running procedure.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    bindings: BTreeMap<String, Value>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Freeze the current bindings into a namespace over `module`.
    ///
    /// Later assignments do not show through the snapshot; objects are
    /// shared by reference, so their fields do.
    pub fn snapshot(&self, module: &ModuleRef) -> Namespace {
        Namespace {
            locals: Rc::new(self.bindings.clone()),
            module: module.clone(),
        }
    }
}

/// Locals over module attributes over builtins.
///
/// The name `module` resolves to the implementation itself unless a local
/// or an attribute shadows it.
#[derive(Debug, Clone)]
pub struct Namespace {
    locals: Rc<BTreeMap<String, Value>>,
    module: ModuleRef,
}

impl Namespace {
    /// A namespace with no locals.
    pub fn new(module: &ModuleRef) -> Self {
        Self {
            locals: Rc::default(),
            module: module.clone(),
        }
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.locals.get(name) {
            return Some(value.clone());
        }
        if let Some(value) = self.module.attr(name) {
            return Some(value);
        }
        if name == "module" {
            return Some(Value::Module(self.module.clone()));
        }
        builtins::lookup(name).map(Value::Builtin)
    }
}
