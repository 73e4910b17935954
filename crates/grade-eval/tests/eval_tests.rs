//! Evaluator tests: expressions against native modules, tracebacks,
//! template substitution and hybrid overlays.

use grade_eval::{
    evaluate, ops, substitute, substitute_or_raw, take_args, ClassBuilder, Exception, HybridModule,
    Locals, Module, ModuleRef, Namespace, PatchError, Source, Value,
};

// ─────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────

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

fn master() -> ModuleRef {
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
        .constant("LIMIT", Value::Int(10))
        .build()
}

fn student() -> ModuleRef {
    Module::builder("foo", "flc37/foo.py")
        .class(foo_class(2))
        .function("add_one", |_, args| {
            let [x] = take_args("add_one", args)?;
            match &x {
                Value::Int(1 | 4) => Ok(Value::Int(0)),
                Value::Int(100) => ops::floor_div(&Value::Int(1), &Value::Int(0)).map_err(|e| e.at(15, "1/0")),
                Value::Str(s) => Ok(Value::Str(format!("{s} two"))),
                _ => ops::add(&x, &Value::Int(1)),
            }
        })
        .function("add_two", |ctx, args| {
            let [x] = take_args("add_two", args)?;
            let once = ctx.call("add_one", vec![x]).map_err(|e| e.at(19, "return add_one(add_one(x))"))?;
            ctx.call("add_one", vec![once]).map_err(|e| e.at(19, "return add_one(add_one(x))"))
        })
        .build()
}

fn eval(text: &str, module: &ModuleRef) -> Result<Value, Exception> {
    evaluate(text, &Namespace::new(module))
}

fn eval_ok(text: &str, module: &ModuleRef) -> Value {
    match eval(text, module) {
        Ok(value) => value,
        Err(exc) => panic!("{text} raised:\n{}", exc.traceback()),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn arithmetic_follows_python() {
    let m = master();
    assert_eq!(eval_ok("1 + 2 * 3", &m), Value::Int(7));
    assert_eq!(eval_ok("2 ** 3 ** 2", &m), Value::Int(512));
    assert_eq!(eval_ok("-2 ** 2", &m), Value::Int(-4));
    assert_eq!(eval_ok("7 // -2", &m).repr(), "-4");
    assert_eq!(eval_ok("2 / 4", &m).repr(), "0.5");
    assert_eq!(eval_ok("'ab' * 2 + 'c'", &m), Value::from("ababc"));
}

#[test]
fn boolean_operators_return_operands() {
    let m = master();
    assert_eq!(eval_ok("0 or 'x'", &m), Value::from("x"));
    assert_eq!(eval_ok("'' and undefined_name", &m), Value::from(""));
    assert_eq!(eval_ok("not []", &m), Value::Bool(true));
}

#[test]
fn comparisons_and_membership() {
    let m = master();
    assert_eq!(eval_ok("1 == 1.0", &m), Value::Bool(true));
    assert_eq!(eval_ok("'a' in 'cat'", &m), Value::Bool(true));
    assert_eq!(eval_ok("3 not in [1, 2]", &m), Value::Bool(true));
    assert_eq!(eval_ok("None is None", &m), Value::Bool(true));
    assert_eq!(eval_ok("'k' in {'k': 1}", &m), Value::Bool(true));
}

#[test]
fn module_functions_and_constants() {
    let m = master();
    assert_eq!(eval_ok("add_one(1)", &m), Value::Int(2));
    assert_eq!(eval_ok("module.add_one(41)", &m), Value::Int(42));
    assert_eq!(eval_ok("add_two(LIMIT)", &m), Value::Int(12));
    assert_eq!(eval_ok("add_one('takes one to know')", &m), Value::from("takes one to know one"));
}

#[test]
fn objects_have_fields_methods_and_shared_state() {
    let m = master();
    let mut locals = Locals::new();
    locals.set("foo", eval_ok("Foo('2')", &m));
    let ns = locals.snapshot(&m);
    assert_eq!(evaluate("foo.arg", &ns).unwrap(), Value::from("2"));
    assert_eq!(evaluate("foo.bar()", &ns).unwrap(), Value::None);
    // The mutation is visible through the same snapshot and any later one
    assert_eq!(evaluate("foo.arg", &ns).unwrap(), Value::from("222"));
    assert_eq!(evaluate("foo.arg", &locals.snapshot(&m)).unwrap(), Value::from("222"));
    assert_eq!(evaluate("foo", &ns).unwrap().repr(), "Foo(arg='222')");
}

#[test]
fn objects_from_different_modules_compare_by_fields() {
    let a = eval_ok("Foo('2')", &master());
    let b = eval_ok("Foo('2')", &student());
    let c = eval_ok("Foo('3')", &student());
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn locals_shadow_module_and_builtins() {
    let m = master();
    let mut locals = Locals::new();
    locals.set("len", Value::Int(5));
    locals.set("add_one", Value::from("shadowed"));
    let ns = locals.snapshot(&m);
    assert_eq!(evaluate("len", &ns).unwrap(), Value::Int(5));
    assert_eq!(evaluate("add_one", &ns).unwrap(), Value::from("shadowed"));
}

#[test]
fn builtins_and_methods() {
    let m = master();
    assert_eq!(eval_ok("len('héllo')", &m), Value::Int(5));
    assert_eq!(eval_ok("sorted([3, 1, 2])[1:]", &m).repr(), "[2, 3]");
    assert_eq!(eval_ok("'a-b-c'.split('-')", &m).repr(), "['a', 'b', 'c']");
    assert_eq!(eval_ok("', '.join(['x', 'y']).upper()", &m), Value::from("X, Y"));
    assert_eq!(eval_ok("{'a': 1}.get('b', 0)", &m), Value::Int(0));
    assert_eq!(eval_ok("sum(range(5))", &m), Value::Int(10));
    assert_eq!(eval_ok("str(2.0) + repr('x')", &m), Value::from("2.0'x'"));
}

// ─────────────────────────────────────────────────────────────────────
// Exceptions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn implementation_exception_keeps_its_frames() {
    let exc = eval("add_one(100)", &student()).unwrap_err();
    assert_eq!(
        exc.traceback(),
        "  File \"flc37/foo.py\", line 15, in add_one\n    1/0\nZeroDivisionError: integer division or modulo by zero"
    );
}

#[test]
fn nested_calls_stack_frames_outermost_first() {
    let exc = eval("add_two(99)", &student()).unwrap_err();
    let functions: Vec<&str> = exc.frames().iter().map(|f| f.function.as_str()).collect();
    assert_eq!(functions, vec!["add_two", "add_one"]);
    assert_eq!(exc.frames()[0].line, Some(19));
    assert_eq!(exc.frames()[1].line, Some(15));
}

#[test]
fn expression_level_exception_gets_check_frame() {
    let exc = eval("add_three(1)", &master()).unwrap_err();
    assert_eq!(
        exc.traceback(),
        "  File \"<check>\", line 1, in <module>\n    add_three(1)\nNameError: name 'add_three' is not defined"
    );
}

#[test]
fn syntax_errors_become_exceptions() {
    let exc = eval("add_one(", &master()).unwrap_err();
    assert_eq!(exc.kind(), "SyntaxError");
    assert!(exc.message().starts_with("E108"), "{}", exc.message());
}

#[test]
fn type_errors_name_both_operands() {
    let exc = eval("1 + None", &master()).unwrap_err();
    assert_eq!(exc.summary(), "TypeError: unsupported operand type(s) for +: 'int' and 'NoneType'");
}

#[test]
fn arity_errors_are_type_errors() {
    let exc = eval("add_one(1, 2)", &master()).unwrap_err();
    assert_eq!(exc.summary(), "TypeError: add_one() takes 1 positional argument but 2 were given");
    assert_eq!(exc.frames()[0].file, "master/foo.py");
}

#[test]
fn missing_attribute() {
    let exc = eval("Foo(1).baz", &master()).unwrap_err();
    assert_eq!(exc.summary(), "AttributeError: 'Foo' object has no attribute 'baz'");
    let exc = eval("module.nope", &master()).unwrap_err();
    assert_eq!(exc.summary(), "AttributeError: module 'master/foo.py' has no attribute 'nope'");
}

// ─────────────────────────────────────────────────────────────────────
// Template substitution
// ─────────────────────────────────────────────────────────────────────

fn ns_with(pairs: &[(&str, Value)], module: &ModuleRef) -> Namespace {
    let mut locals = Locals::new();
    for (name, value) in pairs {
        locals.set(*name, value.clone());
    }
    locals.snapshot(module)
}

#[test]
fn value_pass_substitutes_reprs() {
    let ns = ns_with(
        &[("big", Value::Int(100)), ("quip", Value::from("takes one to know"))],
        &master(),
    );
    assert_eq!(substitute("add_one({big})", &ns).unwrap(), "add_one(100)");
    assert_eq!(
        substitute("add_one({quip})", &ns).unwrap(),
        "add_one('takes one to know')"
    );
    assert_eq!(substitute("add_one(quip)", &ns).unwrap(), "add_one(quip)");
    assert_eq!(substitute("It's okay, {big} is a hard one", &ns).unwrap(), "It's okay, 100 is a hard one");
}

#[test]
fn conversions_and_escapes() {
    let ns = ns_with(&[("s", Value::from("hi"))], &master());
    assert_eq!(substitute("{s!s} {s!r} {s}", &ns).unwrap(), "hi 'hi' 'hi'");
    assert_eq!(substitute("{{literal}}", &ns).unwrap(), "{literal}");
    assert_eq!(substitute("{add_one(1) * 2}", &ns).unwrap(), "4");
}

#[test]
fn unmatched_braces_are_value_errors() {
    let ns = Namespace::new(&master());
    assert_eq!(substitute("oops {", &ns).unwrap_err().kind(), "ValueError");
    assert_eq!(substitute("oops }", &ns).unwrap_err().kind(), "ValueError");
    assert_eq!(substitute("{}", &ns).unwrap_err().kind(), "ValueError");
    assert_eq!(substitute_or_raw("oops {", &ns), "oops {");
}

#[test]
fn field_exceptions_propagate() {
    let ns = Namespace::new(&master());
    assert_eq!(substitute("{missing}", &ns).unwrap_err().kind(), "NameError");
}

// ─────────────────────────────────────────────────────────────────────
// Hybrid overlays
// ─────────────────────────────────────────────────────────────────────

#[test]
fn hybrid_routes_internal_calls_to_master() {
    let (m, s) = (master(), student());
    assert_eq!(eval_ok("add_two(1)", &s), Value::Int(1));
    let hybrid = HybridModule::patch(&s, &m, ["add_one"]).unwrap();
    // add_two is still the student's, but its add_one lookups hit master
    assert_eq!(eval_ok("add_two(1)", &hybrid), Value::Int(3));
    assert_eq!(eval_ok("add_one(4)", &hybrid), Value::Int(5));
}

#[test]
fn hybrid_never_mutates_the_student() {
    let (m, s) = (master(), student());
    let _hybrid = HybridModule::patch(&s, &m, ["add_one"]).unwrap();
    assert_eq!(eval_ok("add_one(1)", &s), Value::Int(0));
}

#[test]
fn hybrid_sources_are_auditable() {
    let (m, s) = (master(), student());
    let hybrid = HybridModule::patch(&s, &m, ["add_one"]).unwrap();
    let overlay = hybrid.as_hybrid().expect("hybrid");
    assert_eq!(overlay.source_of("add_one"), Some(Source::Master));
    assert_eq!(overlay.source_of("add_two"), Some(Source::Student));
    assert_eq!(overlay.source_of("LIMIT"), None);
    assert_eq!(overlay.patched().collect::<Vec<_>>(), vec!["add_one"]);
    assert_eq!(hybrid.origin(), "flc37/foo.py");
}

#[test]
fn master_functions_in_hybrid_keep_master_frames() {
    let (m, s) = (master(), student());
    let hybrid = HybridModule::patch(&s, &m, ["add_one"]).unwrap();
    let exc = eval("add_one(None)", &hybrid).unwrap_err();
    assert_eq!(exc.frames()[0].file, "master/foo.py");
}

#[test]
fn patching_a_name_master_lacks_fails() {
    let (m, s) = (master(), student());
    let err = HybridModule::patch(&s, &m, ["add_three"]).unwrap_err();
    assert_eq!(
        err,
        PatchError::MissingInMaster {
            name: "add_three".into(),
            origin: "master/foo.py".into()
        }
    );
}
