//! Suite declaration.

use crate::ecf::Ecf;
use crate::procedure::Procedure;

/// A procedure and its optional error-carried-forward metadata.
pub struct SuiteEntry {
    procedure: Box<dyn Procedure>,
    ecf: Option<Ecf>,
}

impl SuiteEntry {
    pub fn procedure(&self) -> &dyn Procedure {
        self.procedure.as_ref()
    }

    pub fn ecf(&self) -> Option<&Ecf> {
        self.ecf.as_ref()
    }
}

/// Procedures in the order they run and are reported.
#[derive(Default)]
pub struct Suite {
    entries: Vec<SuiteEntry>,
}

impl Suite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn test(mut self, procedure: impl Procedure + 'static) -> Self {
        self.entries.push(SuiteEntry {
            procedure: Box::new(procedure),
            ecf: None,
        });
        self
    }

    pub fn test_with_ecf(mut self, procedure: impl Procedure + 'static, ecf: Ecf) -> Self {
        self.entries.push(SuiteEntry {
            procedure: Box::new(procedure),
            ecf: Some(ecf),
        });
        self
    }

    pub fn entries(&self) -> &[SuiteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
