//! Error-carried-forward: registry growth, retries against the hybrid
//! module, and patch failures.

mod common;

use grade_eval::{ops, take_args, Module, ModuleRef, Value};
use grade_tester::{Ecf, EcfConfig, GradeConfig, Script, Suite, SuiteError, Tester};

fn add_one_suite() -> Suite {
    Suite::new()
        .test_with_ecf(common::test_add_one(), Ecf::new().tests(["add_one"]))
        .test_with_ecf(
            common::test_add_two(),
            Ecf::new().tests(["add_two"]).depends(["add_one"]),
        )
}

/// `add_one` is correct but `add_two` adds three.
fn off_by_one_add_two() -> ModuleRef {
    Module::builder("foo", "abc12/foo.py")
        .function("add_one", |_, args| {
            let [x] = take_args("add_one", args)?;
            match &x {
                Value::Str(s) => Ok(Value::Str(format!("{s} one"))),
                _ => ops::add(&x, &Value::Int(1)),
            }
        })
        .function("add_two", |_, args| {
            let [x] = take_args("add_two", args)?;
            ops::add(&x, &Value::Int(3))
        })
        .build()
}

#[test]
fn correct_student_needs_no_retry() {
    let report = Tester::new(common::master(), common::master())
        .run(&add_one_suite())
        .unwrap();
    assert!(report.all_passed());
    assert!(report.faulty.is_empty());
    assert!(report.procedures.iter().all(|p| p.retry.is_none()));
}

#[test]
fn retry_replaces_first_run_outcomes() {
    let report = Tester::new(common::master(), common::student())
        .run(&add_one_suite())
        .unwrap();
    let add_two = &report.procedures[1];
    assert!(add_two.entries.iter().any(|e| e.is_failure()));
    let retry = add_two.retry.as_ref().unwrap();
    assert_eq!(retry.patched, ["add_one"]);
    assert!(retry.solved);
    assert!(add_two.passed());
    // add_two failed on its first run, so it is marked even though the retry passed
    assert_eq!(report.faulty.iter().collect::<Vec<_>>(), ["add_one", "add_two"]);
}

#[test]
fn unresolved_retry_lists_residual_mismatches() {
    let suite = Suite::new()
        .test_with_ecf(
            Script::new("t_one", "g.py", |s| s.check("add_one(1)").check("add_one(2)")),
            Ecf::new().tests(["add_one"]),
        )
        .test_with_ecf(
            Script::new("t_two", "g.py", |s| s.check("add_two(1)")),
            Ecf::new().depends(["add_one"]),
        );
    // faulty add_one first, so t_two retries; off_by_one add_two still fails
    let student = Module::builder("foo", "abc12/foo.py")
        .function("add_one", |_, _| Ok(Value::Int(0)))
        .function("add_two", |_, args| {
            let [x] = take_args("add_two", args)?;
            ops::add(&x, &Value::Int(3))
        })
        .build();
    let report = Tester::new(common::master(), student).run(&suite).unwrap();
    assert!(report.to_string().ends_with(
        "----------- t_two ------------\n\n\
         Trying again with helper functions corrected.\n\n\
         add_two(1) should be 3, but it is 4\n\n"
    ));
    assert!(!report.procedures[1].retry.as_ref().unwrap().solved);
}

#[test]
fn no_retry_when_dependency_not_yet_faulty() {
    // add_two runs before add_one has been found faulty
    let suite = Suite::new()
        .test_with_ecf(common::test_add_two(), Ecf::new().depends(["add_one"]))
        .test_with_ecf(common::test_add_one(), Ecf::new().tests(["add_one"]));
    let report = Tester::new(common::master(), common::student()).run(&suite).unwrap();
    assert!(report.procedures[0].retry.is_none());
    assert!(!report.procedures[0].passed());
}

#[test]
fn dependency_marked_by_the_same_procedure_does_not_retry() {
    let suite = Suite::new().test_with_ecf(
        common::test_add_one(),
        Ecf::new().tests(["add_one"]).depends(["add_one"]),
    );
    let report = Tester::new(common::master(), common::student()).run(&suite).unwrap();
    assert!(report.procedures[0].retry.is_none());
    assert!(report.faulty.contains("add_one"));
}

#[test]
fn only_faulty_dependencies_are_patched() {
    let suite = Suite::new()
        .test_with_ecf(common::test_add_one(), Ecf::new().tests(["add_one"]))
        .test_with_ecf(
            common::test_add_two(),
            Ecf::new().depends(["divide", "add_one", "Foo"]),
        );
    let report = Tester::new(common::master(), common::student()).run(&suite).unwrap();
    assert_eq!(report.procedures[1].retry.as_ref().unwrap().patched, ["add_one"]);
}

#[test]
fn registry_never_shrinks() {
    // the second procedure passes but add_one stays faulty
    let suite = Suite::new()
        .test_with_ecf(
            Script::new("fails", "g.py", |s| s.check("add_one(1)")),
            Ecf::new().tests(["add_one"]),
        )
        .test_with_ecf(
            Script::new("passes", "g.py", |s| s.check("add_one(2)")),
            Ecf::new().tests(["add_one"]),
        );
    let report = Tester::new(common::master(), common::student()).run(&suite).unwrap();
    assert!(!report.procedures[0].passed());
    assert!(report.procedures[1].passed());
    assert!(report.faulty.contains("add_one"));
}

#[test]
fn fresh_registry_per_run() {
    let tester = Tester::new(common::master(), common::student());
    let suite = Suite::new().test_with_ecf(
        common::test_add_two(),
        Ecf::new().tests(["add_two"]).depends(["add_one"]),
    );
    let first = tester.run(&add_one_suite()).unwrap();
    assert!(first.faulty.contains("add_one"));
    let second = tester.run(&suite).unwrap();
    assert!(second.procedures[0].retry.is_none());
    assert_eq!(second.faulty.iter().collect::<Vec<_>>(), ["add_two"]);
}

#[test]
fn disabled_retries_still_mark_faults() {
    let config = GradeConfig {
        ecf: EcfConfig { enabled: false },
        ..GradeConfig::default()
    };
    let report = Tester::new(common::master(), common::student())
        .with_config(config)
        .run(&add_one_suite())
        .unwrap();
    assert!(report.procedures[1].retry.is_none());
    assert_eq!(report.faulty.iter().collect::<Vec<_>>(), ["add_one", "add_two"]);
}

#[test]
fn student_only_helper_cannot_be_patched() {
    let student = Module::builder("foo", "abc12/foo.py")
        .function("helper", |_, _| Ok(Value::Int(0)))
        .function("add_one", |ctx, args| {
            let [x] = take_args("add_one", args)?;
            let bump = ctx.call("helper", vec![])?;
            ops::add(&x, &bump)
        })
        .build();
    let suite = Suite::new()
        .test_with_ecf(
            Script::new("test_helper", "g.py", |s| s.check("add_one(1)")),
            Ecf::new().tests(["helper"]),
        )
        .test_with_ecf(
            Script::new("test_add_one", "g.py", |s| s.check("add_one(1)")),
            Ecf::new().depends(["helper"]),
        );
    let err = Tester::new(common::master(), student).run(&suite).unwrap_err();
    assert!(matches!(&err, SuiteError::EcfPatch { procedure, .. } if procedure == "test_add_one"));
    let source = std::error::Error::source(&err).unwrap().to_string();
    assert_eq!(
        source,
        "cannot substitute 'helper': reference implementation master/foo.py does not define it"
    );
}

#[test]
fn correct_add_one_is_not_replaced() {
    let report = Tester::new(common::master(), off_by_one_add_two())
        .run(&add_one_suite())
        .unwrap();
    assert!(report.procedures[0].passed());
    assert!(report.procedures[1].retry.is_none());
    assert_eq!(report.faulty.iter().collect::<Vec<_>>(), ["add_two"]);
}

/// `add_one` always returns zero; `add_two` is built on it.
fn zero_add_one() -> ModuleRef {
    Module::builder("foo", "zz99/foo.py")
        .function("add_one", |_, args| {
            take_args::<1>("add_one", args)?;
            Ok(Value::Int(0))
        })
        .function("add_two", |ctx, args| {
            let [x] = take_args("add_two", args)?;
            let once = ctx.call("add_one", vec![x])?;
            ctx.call("add_one", vec![once])
        })
        .build()
}

#[test]
fn passing_dependent_still_retries() {
    // add_two is right on its own, so the first run already passes
    let student = Module::builder("foo", "abc12/foo.py")
        .function("add_one", |_, _| Ok(Value::Int(0)))
        .function("add_two", |_, args| {
            let [x] = take_args("add_two", args)?;
            ops::add(&x, &Value::Int(2))
        })
        .build();
    let suite = Suite::new()
        .test_with_ecf(common::test_add_one(), Ecf::new().tests(["add_one"]))
        .test_with_ecf(common::test_add_two(), Ecf::new().depends(["add_one"]));
    let report = Tester::new(common::master(), student).run(&suite).unwrap();

    let add_two = &report.procedures[1];
    assert!(add_two.entries.iter().all(|e| !e.is_failure()));
    let retry = add_two.retry.as_ref().unwrap();
    assert_eq!(retry.patched, ["add_one"]);
    assert!(retry.solved);
    assert!(report.to_string().ends_with(
        "-------- test_add_two --------\n\n\
         Trying again with helper functions corrected.\n\
         Problem solved!\n\n"
    ));
}

#[test]
fn broken_helper_is_charged_once() {
    let report = Tester::new(common::master(), zero_add_one())
        .run(&add_one_suite())
        .unwrap();
    let text = report.to_string();
    for line in [
        "This is simple: add_one(1) should be 2, but it is 0\n\n",
        "add_one(2) should be 3, but it is 0\n\n",
        "add_one(3) should be 4, but it is 0\n\n",
        "add_one(4) should be 5, but it is 0\n\n",
    ] {
        assert!(text.contains(line), "missing {line:?}");
    }
    assert!(report.faulty.contains("add_one"));
    assert!(!report.procedures[0].passed());
    assert!(report.procedures[1].passed());
    assert!(text.ends_with(
        "-------- test_add_two --------\n\n\
         Trying again with helper functions corrected.\n\
         Problem solved!\n\n"
    ));
}
