//! Implementations under test.
//!
//! A [`Module`] is a named set of attributes (native functions, classes,
//! constants) with an *origin*, the display path that shows up in report
//! banners and traceback frames. Modules are handled through [`ModuleRef`],
//! which is either a plain module or a [`HybridModule`] overlay.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::exception::Exception;
use crate::hybrid::HybridModule;
use crate::object::{Class, ClassBuilder, ClassDef, Function, FunctionDef};
use crate::value::Value;

/// An attribute as declared, before it is bound to globals.
#[derive(Clone)]
pub(crate) enum Item {
    Function(Rc<FunctionDef>),
    Class(Rc<ClassDef>),
    Constant(Value),
}

impl Item {
    fn bind(&self, globals: &ModuleRef) -> Value {
        match self {
            Self::Function(def) => Value::Function(Function::new(Rc::clone(def), globals.clone())),
            Self::Class(def) => Value::Class(Class::new(Rc::clone(def), globals.clone())),
            Self::Constant(value) => value.clone(),
        }
    }
}

pub struct Module {
    name: String,
    origin: String,
    items: BTreeMap<String, Item>,
}

impl Module {
    pub fn builder(name: impl Into<String>, origin: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            module: Module {
                name: name.into(),
                origin: origin.into(),
                items: BTreeMap::new(),
            },
        }
    }
}

/// Builds a [`Module`] attribute by attribute.
///
/// ```
/// # use grade_eval::{Module, Value, take_args, ops};
/// let module = Module::builder("foo", "master/foo.py")
///     .function("add_one", |_, args| {
///         let [x] = take_args("add_one", args)?;
///         ops::add(&x, &Value::Int(1))
///     })
///     .function("add_two", |ctx, args| {
///         let [x] = take_args("add_two", args)?;
///         let once = ctx.call("add_one", vec![x])?;
///         ctx.call("add_one", vec![once])
///     })
///     .build();
/// assert_eq!(module.call("add_two", vec![Value::Int(1)]).unwrap(), Value::Int(3));
/// ```
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn function(
        mut self,
        name: impl Into<String>,
        body: impl Fn(&ModuleRef, Vec<Value>) -> Result<Value, Exception> + 'static,
    ) -> Self {
        let name = name.into();
        let def = FunctionDef {
            name: name.clone(),
            origin: self.module.origin.clone(),
            body: Rc::new(body),
        };
        self.module.items.insert(name, Item::Function(Rc::new(def)));
        self
    }

    pub fn class(mut self, class: ClassBuilder) -> Self {
        let def = class.finish(&self.module.origin);
        self.module.items.insert(def.name.clone(), Item::Class(Rc::new(def)));
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.module.items.insert(name.into(), Item::Constant(value));
        self
    }

    pub fn build(self) -> ModuleRef {
        ModuleRef::Plain(Rc::new(self.module))
    }
}

/// Shared handle to an implementation.
///
/// This is also the *globals* every native function receives: sibling
/// lookups go through [`ModuleRef::get`] and [`ModuleRef::call`] so they are
/// resolved late.
#[derive(Clone)]
pub enum ModuleRef {
    Plain(Rc<Module>),
    Hybrid(Rc<HybridModule>),
}

impl ModuleRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Plain(module) => &module.name,
            Self::Hybrid(hybrid) => hybrid.student().name(),
        }
    }

    /// Display path; a hybrid reports as the student module it overlays.
    pub fn origin(&self) -> &str {
        match self {
            Self::Plain(module) => &module.origin,
            Self::Hybrid(hybrid) => hybrid.student().origin(),
        }
    }

    /// Look up an attribute bound to this module.
    pub fn attr(&self, name: &str) -> Option<Value> {
        self.resolve(name, self)
    }

    /// Resolve `name`, binding items declared here to `globals`.
    ///
    /// Names a hybrid takes from master resolve through master and stay
    /// bound to it.
    pub(crate) fn resolve(&self, name: &str, globals: &ModuleRef) -> Option<Value> {
        match self {
            Self::Plain(module) => module.items.get(name).map(|item| item.bind(globals)),
            Self::Hybrid(hybrid) => {
                if hybrid.is_patched(name) {
                    hybrid.master().attr(name)
                } else {
                    hybrid.student().resolve(name, globals)
                }
            }
        }
    }

    pub fn has(&self, name: &str) -> bool {
        match self {
            Self::Plain(module) => module.items.contains_key(name),
            Self::Hybrid(hybrid) => {
                if hybrid.is_patched(name) {
                    hybrid.master().has(name)
                } else {
                    hybrid.student().has(name)
                }
            }
        }
    }

    /// Look up a global, raising `NameError` if it does not exist.
    pub fn get(&self, name: &str) -> Result<Value, Exception> {
        self.attr(name).ok_or_else(|| Exception::name_error(name))
    }

    /// Call a global by name.
    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, Exception> {
        self.get(name)?.call(args)
    }

    pub fn as_hybrid(&self) -> Option<&HybridModule> {
        match self {
            Self::Plain(_) => None,
            Self::Hybrid(hybrid) => Some(hybrid),
        }
    }

    pub fn ptr_eq(&self, other: &ModuleRef) -> bool {
        match (self, other) {
            (Self::Plain(a), Self::Plain(b)) => Rc::ptr_eq(a, b),
            (Self::Hybrid(a), Self::Hybrid(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(module) => write!(f, "Module({})", module.origin),
            Self::Hybrid(hybrid) => write!(
                f,
                "Hybrid({}, patched: {:?})",
                hybrid.student().origin(),
                hybrid.patched().collect::<Vec<_>>()
            ),
        }
    }
}
