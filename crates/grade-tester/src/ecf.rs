//! Error-carried-forward.
//!
//! When a procedure fails, the functions it is declared to test are marked
//! faulty. A later procedure whose declared dependencies include a faulty
//! function is re-run with those functions taken from the reference
//! implementation, whether or not its first run failed, so a broken helper
//! is not charged twice.

use std::collections::BTreeSet;

use grade_eval::HybridModule;
use serde::Serialize;
use tracing::info;

use crate::error::SuiteError;
use crate::report::{ProcedureReport, Retry};
use crate::runner::{has_failures, run_procedure, ModulePair};
use crate::suite::SuiteEntry;

/// Names of functions found faulty so far. Names are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FaultRegistry {
    names: BTreeSet<String>,
}

impl FaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the name was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// What a procedure tests and what it relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ecf {
    /// Marked faulty when the procedure fails.
    pub tests: Vec<String>,
    /// Replaced by master's versions on a retry if already faulty.
    pub depends: Vec<String>,
}

impl Ecf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tests<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tests.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn depends<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Runs suite entries in order, carrying the registry between them.
pub struct EcfCoordinator<'a> {
    pair: &'a ModulePair,
    retries_enabled: bool,
    registry: FaultRegistry,
}

impl<'a> EcfCoordinator<'a> {
    pub fn new(pair: &'a ModulePair, retries_enabled: bool) -> Self {
        Self {
            pair,
            retries_enabled,
            registry: FaultRegistry::new(),
        }
    }

    pub fn into_registry(self) -> FaultRegistry {
        self.registry
    }

    pub fn run(&mut self, entry: &SuiteEntry) -> Result<ProcedureReport, SuiteError> {
        let procedure = entry.procedure();
        let name = procedure.name();
        let known_faulty = self.registry.clone();

        let entries = run_procedure(procedure, self.pair)?;
        let failed = has_failures(&entries);
        let mut report = ProcedureReport::new(name, entries);

        let Some(ecf) = entry.ecf() else {
            return Ok(report);
        };
        if failed {
            for tested in &ecf.tests {
                if self.registry.insert(tested.as_str()) {
                    info!(procedure = name, function = %tested, "marked faulty");
                }
            }
        }
        if !self.retries_enabled {
            return Ok(report);
        }

        let patched: Vec<String> = ecf
            .depends
            .iter()
            .filter(|dep| known_faulty.contains(dep))
            .cloned()
            .collect();
        if patched.is_empty() {
            return Ok(report);
        }

        info!(procedure = name, patched = ?patched, "retrying with master helpers");
        let hybrid = HybridModule::patch(&self.pair.student, &self.pair.master, &patched).map_err(|source| {
            SuiteError::EcfPatch {
                procedure: name.to_string(),
                source,
            }
        })?;
        let retry_pair = ModulePair::new(self.pair.master.clone(), hybrid);
        let retry_entries = run_procedure(procedure, &retry_pair)?;
        report.retry = Some(Retry::new(patched, retry_entries));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_insert_reports_novelty() {
        let mut registry = FaultRegistry::new();
        assert!(registry.insert("add_one"));
        assert!(!registry.insert("add_one"));
        assert!(registry.insert("add_two"));
        assert_eq!(registry.iter().collect::<Vec<_>>(), ["add_one", "add_two"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_serializes_as_list() {
        let mut registry = FaultRegistry::new();
        registry.insert("b");
        registry.insert("a");
        assert_eq!(serde_json::to_string(&registry).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn ecf_builder() {
        let ecf = Ecf::new().tests(["add_two"]).depends(["add_one", "helper"]);
        assert_eq!(ecf.tests, ["add_two"]);
        assert_eq!(ecf.depends, ["add_one", "helper"]);
    }
}
