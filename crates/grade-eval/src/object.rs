//! Callables and instances: native functions, classes, objects, and bound
//! methods.
//!
//! Every callable is bound to a [`ModuleRef`], its *globals*. Native code
//! resolves sibling functions through that handle at call time, which is
//! what lets a hybrid overlay reroute the internal calls student code makes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::exception::Exception;
use crate::module::ModuleRef;
use crate::value::Value;

/// Body of a native function.
pub type NativeFn = Rc<dyn Fn(&ModuleRef, Vec<Value>) -> Result<Value, Exception>>;

/// Body of a native method; receives the instance it was called on.
pub type NativeMethod = Rc<dyn Fn(&ModuleRef, &Rc<Object>, Vec<Value>) -> Result<Value, Exception>>;

/// Constructor body; returns the initial fields in declaration order.
pub type NativeInit = Rc<dyn Fn(&ModuleRef, Vec<Value>) -> Result<Vec<(String, Value)>, Exception>>;

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// A function as declared in a module, not yet bound to globals.
pub struct FunctionDef {
    pub(crate) name: String,
    /// Display path of the declaring module, used in traceback frames.
    pub(crate) origin: String,
    pub(crate) body: NativeFn,
}

/// A function bound to the module it resolves names through.
#[derive(Clone)]
pub struct Function {
    def: Rc<FunctionDef>,
    globals: ModuleRef,
}

impl Function {
    pub(crate) fn new(def: Rc<FunctionDef>, globals: ModuleRef) -> Self {
        Self { def, globals }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Display path of the module that declared this function.
    pub fn origin(&self) -> &str {
        &self.def.origin
    }

    pub fn globals(&self) -> &ModuleRef {
        &self.globals
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value, Exception> {
        (self.def.body)(&self.globals, args)
            .map_err(|exc| exc.in_function(&self.def.origin, &self.def.name))
    }

    pub(crate) fn same_as(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.def, &other.def) && self.globals.ptr_eq(&other.globals)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {} from {}>", self.def.name, self.def.origin)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Classes
// ══════════════════════════════════════════════════════════════════════════════

pub struct ClassDef {
    pub(crate) name: String,
    pub(crate) origin: String,
    pub(crate) init: NativeInit,
    pub(crate) methods: BTreeMap<String, NativeMethod>,
}

/// Declares a class for [`ModuleBuilder::class`](crate::ModuleBuilder::class).
///
/// ```
/// # use grade_eval::{ClassBuilder, Value, take_args};
/// let foo = ClassBuilder::new("Foo")
///     .init(|_, args| {
///         let [arg] = take_args("Foo", args)?;
///         Ok(vec![("arg".to_string(), arg)])
///     })
///     .method("bar", |_, this, _| {
///         this.set("arg", Value::from("changed"));
///         Ok(Value::None)
///     });
/// # let _ = foo;
/// ```
pub struct ClassBuilder {
    name: String,
    init: NativeInit,
    methods: BTreeMap<String, NativeMethod>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let class_name = name.clone();
        Self {
            name,
            init: Rc::new(move |_, args| {
                if args.is_empty() {
                    Ok(Vec::new())
                } else {
                    Err(Exception::type_error(format!("{class_name}() takes no arguments")))
                }
            }),
            methods: BTreeMap::new(),
        }
    }

    pub fn init(
        mut self,
        init: impl Fn(&ModuleRef, Vec<Value>) -> Result<Vec<(String, Value)>, Exception> + 'static,
    ) -> Self {
        self.init = Rc::new(init);
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        body: impl Fn(&ModuleRef, &Rc<Object>, Vec<Value>) -> Result<Value, Exception> + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Rc::new(body));
        self
    }

    pub(crate) fn finish(self, origin: &str) -> ClassDef {
        ClassDef {
            name: self.name,
            origin: origin.to_string(),
            init: self.init,
            methods: self.methods,
        }
    }
}

/// A class bound to globals; calling it builds an [`Object`].
#[derive(Clone)]
pub struct Class {
    def: Rc<ClassDef>,
    globals: ModuleRef,
}

impl Class {
    pub(crate) fn new(def: Rc<ClassDef>, globals: ModuleRef) -> Self {
        Self { def, globals }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn instantiate(&self, args: Vec<Value>) -> Result<Value, Exception> {
        let fields = (self.def.init)(&self.globals, args)
            .map_err(|exc| exc.in_function(&self.def.origin, "__init__"))?;
        Ok(Value::Object(Rc::new(Object {
            class: Rc::clone(&self.def),
            globals: self.globals.clone(),
            fields: RefCell::new(fields),
        })))
    }

    pub(crate) fn same_as(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.def, &other.def) && self.globals.ptr_eq(&other.globals)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Instances
// ══════════════════════════════════════════════════════════════════════════════

/// An instance with mutable fields.
///
/// Objects are shared by reference: a side effect performed through one
/// binding is visible through every other binding of the same instance.
pub struct Object {
    class: Rc<ClassDef>,
    globals: ModuleRef,
    fields: RefCell<Vec<(String, Value)>>,
}

impl Object {
    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields
            .borrow()
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    }

    /// Set a field, adding it after the existing ones if new.
    pub fn set(&self, name: &str, value: Value) {
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => fields.push((name.to_string(), value)),
        }
    }

    /// Snapshot of the fields in declaration order.
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.fields.borrow().clone()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.class.methods.contains_key(name)
    }
}

/// `obj.method` before it is called.
#[derive(Clone)]
pub struct BoundMethod {
    receiver: Rc<Object>,
    name: String,
}

impl BoundMethod {
    pub(crate) fn new(receiver: Rc<Object>, name: &str) -> Self {
        Self {
            receiver,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        self.receiver.class_name()
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value, Exception> {
        let class = &self.receiver.class;
        let Some(body) = class.methods.get(&self.name) else {
            return Err(Exception::attribute_error(format!(
                "'{}' object has no attribute '{}'",
                class.name, self.name
            )));
        };
        body(&self.receiver.globals, &self.receiver, args)
            .map_err(|exc| exc.in_function(&class.origin, &self.name))
    }

    pub(crate) fn same_as(&self, other: &BoundMethod) -> bool {
        Rc::ptr_eq(&self.receiver, &other.receiver) && self.name == other.name
    }
}

/// Destructure exactly `N` positional arguments, raising Python's arity
/// `TypeError` otherwise.
///
/// ```
/// # use grade_eval::{take_args, Value};
/// let [x, y] = take_args("divide", vec![Value::Int(1), Value::Int(2)]).unwrap();
/// assert_eq!(x, Value::Int(1));
/// assert!(take_args::<1>("add_one", vec![]).is_err());
/// # let _ = y;
/// ```
pub fn take_args<const N: usize>(function: &str, args: Vec<Value>) -> Result<[Value; N], Exception> {
    let given = args.len();
    <[Value; N]>::try_from(args).map_err(|_| {
        let noun = if N == 1 { "argument" } else { "arguments" };
        let verb = if given == 1 { "was" } else { "were" };
        Exception::type_error(format!(
            "{function}() takes {N} positional {noun} but {given} {verb} given"
        ))
    })
}
