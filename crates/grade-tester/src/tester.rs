//! Top-level driver.

use grade_eval::ModuleRef;
use tracing::info;

use crate::config::GradeConfig;
use crate::ecf::EcfCoordinator;
use crate::error::SuiteError;
use crate::report::Report;
use crate::runner::ModulePair;
use crate::suite::Suite;

/// Grades one student implementation against the reference.
#[derive(Debug, Clone)]
pub struct Tester {
    pair: ModulePair,
    config: GradeConfig,
}

impl Tester {
    pub fn new(master: ModuleRef, student: ModuleRef) -> Self {
        Self {
            pair: ModulePair::new(master, student),
            config: GradeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GradeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GradeConfig {
        &self.config
    }

    /// Run every procedure of `suite` in declaration order.
    ///
    /// Each call starts from an empty fault registry.
    pub fn run(&self, suite: &Suite) -> Result<Report, SuiteError> {
        info!(
            master = self.pair.master.origin(),
            student = self.pair.student.origin(),
            procedures = suite.len(),
            "grading"
        );
        let mut coordinator = EcfCoordinator::new(&self.pair, self.config.ecf.enabled);
        let procedures = suite
            .entries()
            .iter()
            .map(|entry| coordinator.run(entry))
            .collect::<Result<Vec<_>, _>>()?;

        let report = Report::new(self.pair.student.origin(), procedures, coordinator.into_registry());
        info!(passed = report.passed, failed = report.failed, faulty = report.faulty.len(), "graded");
        Ok(report)
    }

    /// Run and render with the configured layout.
    pub fn run_to_text(&self, suite: &Suite) -> Result<String, SuiteError> {
        Ok(self.run(suite)?.render(&self.config.report))
    }
}
