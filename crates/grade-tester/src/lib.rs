//! Comparative grading.
//!
//! Runs the same test procedures against a reference ("master") and a
//! student implementation in lockstep, compares what each check produces,
//! and re-runs failing procedures with helpers already known to be broken
//! replaced by the reference versions (error-carried-forward).
//!
//! ```ignore
//! let suite = Suite::new()
//!     .test(Script::new("test_add_one", "grade_foo.py", |s| s.check("add_one(1)")))
//!     .test_with_ecf(
//!         Script::new("test_add_two", "grade_foo.py", |s| s.check("add_two(1)")),
//!         Ecf::new().tests(["add_two"]).depends(["add_one"]),
//!     );
//! let report = Tester::new(master, student).run(&suite)?;
//! print!("{report}");
//! ```

pub mod check;
pub mod config;
pub mod ecf;
pub mod error;
pub mod procedure;
pub mod report;
pub mod runner;
pub mod script;
pub mod suite;
pub mod tester;

pub use check::{Check, CheckOutcome, ExceptionRecord, Observation};
pub use config::{EcfConfig, GradeConfig, ReportConfig};
pub use ecf::{Ecf, EcfCoordinator, FaultRegistry};
pub use error::{ConfigError, SuiteError};
pub use procedure::{Procedure, Resume, TestTask, Yielded};
pub use report::{ProcedureReport, Report, Retry};
pub use runner::{run_procedure, Entry, Fatal, ModulePair};
pub use script::{Script, StepList};
pub use suite::{Suite, SuiteEntry};
pub use tester::Tester;
