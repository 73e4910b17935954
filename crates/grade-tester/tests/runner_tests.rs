//! Lockstep runner behaviour.

mod common;

use grade_eval::{Exception, Module, ModuleRef, Value};
use grade_tester::{run_procedure, Entry, ModulePair, Observation, Script, SuiteError};

fn counting(origin: &str, count: i64) -> ModuleRef {
    Module::builder("m", origin)
        .constant("count", Value::Int(count))
        .function("fail", |_, _| {
            Err(Exception::value_error("nope").at(7, "raise ValueError('nope')"))
        })
        .build()
}

fn checks(entries: &[Entry]) -> Vec<(String, bool)> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            Entry::Check(outcome) => Some((outcome.label.clone(), outcome.matched)),
            Entry::Fatal(_) => None,
        })
        .collect()
}

fn per_item() -> Script {
    Script::new("per_item", "g.py", |s| s.for_each("i", "range(count)", |b| b.check("{i}")))
}

#[test]
fn student_ending_early_leaves_missing_outcomes() {
    let pair = ModulePair::new(counting("m.py", 3), counting("s.py", 1));
    let entries = run_procedure(&per_item(), &pair).unwrap();
    assert_eq!(entries.len(), 3);
    let Entry::Check(last) = &entries[2] else {
        panic!("expected a check");
    };
    assert_eq!(last.student, Observation::Missing);
    assert_eq!(last.message(), "2 should be 2, but student code never reached this check");
}

#[test]
fn student_yielding_past_master_is_ignored() {
    let pair = ModulePair::new(counting("m.py", 1), counting("s.py", 4));
    let entries = run_procedure(&per_item(), &pair).unwrap();
    assert_eq!(checks(&entries), [("0".to_string(), true)]);
}

#[test]
fn fatal_entry_carries_procedure_and_function_frames() {
    let script = Script::new("test_fail", "grade_m.py", |s| {
        s.at_line(40).check("count").exec("module.fail()").check("count")
    });
    let master = Module::builder("m", "m.py")
        .constant("count", Value::Int(2))
        .function("fail", |_, _| Ok(Value::None))
        .build();
    let pair = ModulePair::new(master, counting("s.py", 2));
    let entries = run_procedure(&script, &pair).unwrap();
    assert_eq!(checks(&entries), [("count".to_string(), true)]);
    let Entry::Fatal(fatal) = &entries[1] else {
        panic!("expected a fatal entry");
    };
    assert_eq!(
        fatal.render(),
        "Fatal exception in student code. Cannot finish test.\n  File \"grade_m.py\", line 41, in test_fail\n    module.fail()\n  File \"s.py\", line 7, in fail\n    raise ValueError('nope')\nValueError: nope"
    );
}

#[test]
fn fatal_does_not_affect_next_procedure() {
    let report = grade_tester::Tester::new(common::master(), common::student())
        .run(&common::suite())
        .unwrap();
    // test_divide ends in a fatal, test_add_one after it still runs fully
    assert!(matches!(report.procedures[1].entries.last(), Some(Entry::Fatal(_))));
    assert_eq!(report.procedures[2].entries.len(), 7);
}

#[test]
fn check_exceptions_do_not_end_the_procedure() {
    let script = Script::new("t", "g.py", |s| s.check("fail()").check("count"));
    let pair = ModulePair::new(counting("m.py", 1), counting("s.py", 1));
    let entries = run_procedure(&script, &pair).unwrap();
    assert_eq!(checks(&entries), [("fail()".to_string(), false), ("count".to_string(), true)]);
}

#[test]
fn name_error_in_check_gets_check_frame() {
    let script = Script::new("t", "g.py", |s| s.check("count").check("missing + 1"));
    let master = Module::builder("m", "m.py")
        .constant("count", Value::Int(1))
        .constant("missing", Value::Int(1))
        .build();
    let pair = ModulePair::new(master, counting("s.py", 1));
    let entries = run_procedure(&script, &pair).unwrap();
    let Entry::Check(outcome) = &entries[1] else {
        panic!("expected a check");
    };
    assert_eq!(
        outcome.message(),
        "missing + 1 should be 2, but student code raised an exception:\n  File \"<check>\", line 1, in <module>\n    missing + 1\nNameError: name 'missing' is not defined"
    );
}

#[test]
fn reference_fault_outside_check_is_a_suite_error() {
    let script = Script::new("t", "g.py", |s| s.check("count").exec("module.fail()"));
    let student = Module::builder("m", "s.py")
        .constant("count", Value::Int(1))
        .function("fail", |_, _| Ok(Value::None))
        .build();
    let pair = ModulePair::new(counting("m.py", 1), student);
    let err = run_procedure(&script, &pair).unwrap_err();
    let SuiteError::ReferenceImplementation { procedure, exception } = err else {
        panic!("expected a reference implementation error");
    };
    assert_eq!(procedure, "t");
    assert_eq!(exception.kind, "ValueError");
}

#[test]
fn check_namespace_is_captured_at_yield() {
    let script = Script::new("t", "g.py", |s| {
        s.assign("x", "count").check("x * 10").assign("x", "0")
    });
    let pair = ModulePair::new(counting("m.py", 2), counting("s.py", 3));
    let entries = run_procedure(&script, &pair).unwrap();
    let Entry::Check(outcome) = &entries[0] else {
        panic!("expected a check");
    };
    assert_eq!(outcome.message(), "x * 10 should be 20, but it is 30");
}
