//! The `foo` assignment: a reference implementation, a buggy submission
//! and the suite that grades it.

#![allow(dead_code)]

use grade_eval::{ops, take_args, ClassBuilder, Module, ModuleRef, Value};
use grade_tester::{Ecf, Script, Suite};

pub const SUITE_FILE: &str = "grade_foo.py";

fn foo_class(factor: i64) -> ClassBuilder {
    ClassBuilder::new("Foo")
        .init(|_, args| {
            let [arg] = take_args("Foo", args)?;
            Ok(vec![("arg".to_string(), arg)])
        })
        .method("bar", move |_, this, _| {
            let arg = this.get("arg").unwrap_or(Value::None);
            this.set("arg", ops::mul(&arg, &Value::Int(factor))?);
            Ok(Value::None)
        })
}

pub fn master() -> ModuleRef {
    Module::builder("foo", "master/foo.py")
        .class(foo_class(3))
        .function("add_one", |_, args| {
            let [x] = take_args("add_one", args)?;
            match &x {
                Value::Str(s) => Ok(Value::Str(format!("{s} one"))),
                _ => ops::add(&x, &Value::Int(1)),
            }
        })
        .function("add_two", |ctx, args| {
            let [x] = take_args("add_two", args)?;
            let once = ctx.call("add_one", vec![x])?;
            ctx.call("add_one", vec![once])
        })
        .function("divide", |_, args| {
            let [x, y] = take_args("divide", args)?;
            ops::true_div(&x, &y)
        })
        .build()
}

/// `flc37/foo.py`: wrong `Foo.bar`, a broken `add_one` that `add_two`
/// inherits, and integer division.
pub fn student() -> ModuleRef {
    Module::builder("foo", "flc37/foo.py")
        .class(foo_class(2))
        .function("add_one", |_, args| {
            let [x] = take_args("add_one", args)?;
            match &x {
                Value::Int(1 | 4) => Ok(Value::Int(0)),
                Value::Int(100) => {
                    ops::floor_div(&Value::Int(1), &Value::Int(0)).map_err(|e| e.at(15, "1/0"))
                }
                Value::Str(s) => Ok(Value::Str(format!("{s} two"))),
                _ => ops::add(&x, &Value::Int(1)),
            }
        })
        .function("add_two", |ctx, args| {
            let [x] = take_args("add_two", args)?;
            let once = ctx
                .call("add_one", vec![x])
                .map_err(|e| e.at(19, "return add_one(add_one(x))"))?;
            ctx.call("add_one", vec![once])
                .map_err(|e| e.at(19, "return add_one(add_one(x))"))
        })
        .function("divide", |_, args| {
            let [x, y] = take_args("divide", args)?;
            ops::floor_div(&x, &y).map_err(|e| e.at(23, "return x / y"))
        })
        .build()
}

pub fn test_foo() -> Script {
    Script::new("test_foo", SUITE_FILE, |s| {
        s.at_line(55)
            .assign("foo", "module.Foo('2')")
            .check("foo.arg")
            .exec("foo.bar()")
            .check_with_note("foo.arg", "after calling foo.bar()")
            .check("foo.bar()")
            .check_with_note("foo.arg", "after calling foo.bar() twice")
    })
}

pub fn test_divide() -> Script {
    Script::new("test_divide", SUITE_FILE, |s| {
        s.at_line(108)
            .yield_value("module.divide(2, 4)", "divide(2, 4)")
            .assign("zero", "module.divide(1, 0)")
            .yield_value("zero", "we won't get this far...")
    })
}

pub fn test_add_one() -> Script {
    Script::new("test_add_one", SUITE_FILE, |s| {
        s.at_line(22)
            .yield_value("module.add_one(1)", "This is simple: add_one(1)")
            .for_each("i", "range(2, 5)", |body| body.check("add_one({i})"))
            .assign("big", "100")
            .check_with_note("add_one({big})", "It's okay, {big} is a hard one")
            .assign("quip", "'takes one to know'")
            .check("add_one(quip)")
            .check("add_one({quip})")
    })
}

pub fn test_add_two() -> Script {
    Script::new("test_add_two", SUITE_FILE, |s| {
        s.at_line(86).check("add_two(1)").check("add_two(2)")
    })
}

pub fn suite() -> Suite {
    Suite::new()
        .test(test_foo())
        .test(test_divide())
        .test_with_ecf(test_add_one(), Ecf::new().tests(["add_one"]))
        .test_with_ecf(test_add_two(), Ecf::new().depends(["add_one"]))
}
