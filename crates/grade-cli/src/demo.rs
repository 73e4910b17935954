//! The bundled `foo` assignment.
//!
//! `foo` has a stateful class `Foo` whose `bar` triples its string
//! argument, `add_one`, `add_two` built on `add_one`, and `divide`.

use grade_eval::{ops, take_args, ClassBuilder, Module, ModuleRef, Value};
use grade_tester::{Ecf, Script, Suite};

const SUITE_FILE: &str = "grade_foo.py";

fn foo_class(factor: i64) -> ClassBuilder {
    ClassBuilder::new("Foo")
        .init(|_, args| {
            let [arg] = take_args("Foo", args)?;
            Ok(vec![("arg".to_string(), arg)])
        })
        .method("bar", move |_, this, args| {
            take_args::<0>("bar", args)?;
            let arg = this.get("arg").unwrap_or(Value::None);
            this.set("arg", ops::mul(&arg, &Value::Int(factor))?);
            Ok(Value::None)
        })
}

fn add_one(x: &Value, suffix: &str) -> Result<Value, grade_eval::Exception> {
    match x {
        Value::Str(s) => Ok(Value::Str(format!("{s} {suffix}"))),
        _ => ops::add(x, &Value::Int(1)),
    }
}

pub fn master() -> ModuleRef {
    Module::builder("foo", "master/foo.py")
        .class(foo_class(3))
        .function("add_one", |_, args| {
            let [x] = take_args("add_one", args)?;
            add_one(&x, "one")
        })
        .function("add_two", |globals, args| {
            let [x] = take_args("add_two", args)?;
            let once = globals.call("add_one", vec![x])?;
            globals.call("add_one", vec![once])
        })
        .function("divide", |_, args| {
            let [x, y] = take_args("divide", args)?;
            ops::true_div(&x, &y).map_err(|e| e.at(12, "return x / y"))
        })
        .build()
}

/// A submission with a wrong `Foo.bar`, a broken `add_one` that
/// `add_two` inherits, and integer division.
pub fn buggy_student() -> ModuleRef {
    Module::builder("foo", "flc37/foo.py")
        .class(foo_class(2))
        .function("add_one", |_, args| {
            let [x] = take_args("add_one", args)?;
            match &x {
                Value::Int(1 | 4) => Ok(Value::Int(0)),
                Value::Int(100) => {
                    ops::floor_div(&Value::Int(1), &Value::Int(0)).map_err(|e| e.at(15, "1/0"))
                }
                _ => add_one(&x, "two"),
            }
        })
        .function("add_two", |globals, args| {
            let [x] = take_args("add_two", args)?;
            let once = globals
                .call("add_one", vec![x])
                .map_err(|e| e.at(19, "return add_one(add_one(x))"))?;
            globals
                .call("add_one", vec![once])
                .map_err(|e| e.at(19, "return add_one(add_one(x))"))
        })
        .function("divide", |_, args| {
            let [x, y] = take_args("divide", args)?;
            ops::floor_div(&x, &y).map_err(|e| e.at(23, "return x / y"))
        })
        .build()
}

/// A submission that behaves like the reference.
pub fn correct_student() -> ModuleRef {
    Module::builder("foo", "abc12/foo.py")
        .class(foo_class(3))
        .function("add_one", |_, args| {
            let [x] = take_args("add_one", args)?;
            add_one(&x, "one")
        })
        .function("add_two", |globals, args| {
            let [x] = take_args("add_two", args)?;
            let once = globals.call("add_one", vec![x])?;
            globals.call("add_one", vec![once])
        })
        .function("divide", |_, args| {
            let [x, y] = take_args("divide", args)?;
            ops::true_div(&x, &y).map_err(|e| e.at(9, "return x / y"))
        })
        .build()
}

pub fn suite() -> Suite {
    let test_foo = Script::new("test_foo", SUITE_FILE, |s| {
        s.at_line(55)
            .assign("foo", "module.Foo('2')")
            .check("foo.arg")
            .exec("foo.bar()")
            .check_with_note("foo.arg", "after calling foo.bar()")
            .check("foo.bar()")
            .check_with_note("foo.arg", "after calling foo.bar() twice")
    });

    let test_divide = Script::new("test_divide", SUITE_FILE, |s| {
        s.at_line(108)
            .yield_value("module.divide(2, 4)", "divide(2, 4)")
            .assign("zero", "module.divide(1, 0)")
            .yield_value("zero", "we won't get this far...")
    });

    let test_add_one = Script::new("test_add_one", SUITE_FILE, |s| {
        s.at_line(22)
            .yield_value("module.add_one(1)", "This is simple: add_one(1)")
            .at_line(28)
            .for_each("i", "range(2, 5)", |body| body.at_line(33).check("add_one({i})"))
            .at_line(39)
            .assign("big", "100")
            .check_with_note("add_one({big})", "It's okay, {big} is a hard one")
            .at_line(43)
            .assign("quip", "'takes one to know'")
            .check("add_one(quip)")
            .at_line(50)
            .check("add_one({quip})")
    });

    let test_add_two = Script::new("test_add_two", SUITE_FILE, |s| {
        s.at_line(86).check("add_two(1)").check("add_two(2)")
    });

    Suite::new()
        .test(test_foo)
        .test(test_divide)
        .test_with_ecf(test_add_one, Ecf::new().tests(["add_one"]))
        .test_with_ecf(test_add_two, Ecf::new().depends(["add_one"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grade_tester::{Entry, Tester};

    #[test]
    fn buggy_submission_report() {
        let report = Tester::new(master(), buggy_student()).run(&suite()).unwrap();
        let text = report.to_string();
        assert!(text.contains("foo.arg should be '222', but it is '22'\n Note: after calling foo.bar()"));
        assert!(text.contains("  File \"grade_foo.py\", line 109, in test_divide\n    zero = module.divide(1, 0)\n"));
        assert!(text.ends_with("Trying again with helper functions corrected.\nProblem solved!\n\n"));
    }

    #[test]
    fn correct_submission_only_trips_on_division_by_zero() {
        let report = Tester::new(master(), correct_student()).run(&suite()).unwrap();
        assert_eq!(report.failed, 1);
        let Some(Entry::Fatal(fatal)) = report.procedures[1].entries.last() else {
            panic!("expected test_divide to end in a fatal");
        };
        assert_eq!(fatal.exception.summary(), "ZeroDivisionError: division by zero");
    }

    #[test]
    fn line_numbers_follow_suite_file() {
        let report = Tester::new(master(), buggy_student()).run(&suite()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let traceback = json["procedures"][1]["entries"][1]["exception"]["traceback"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(traceback.starts_with("  File \"grade_foo.py\", line 109, in test_divide"));
    }
}
