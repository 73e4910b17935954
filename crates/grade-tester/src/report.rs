//! Report building and rendering.

use std::fmt;

use serde::Serialize;

use crate::config::ReportConfig;
use crate::ecf::FaultRegistry;
use crate::runner::{has_failures, Entry};

pub const RETRY_BANNER: &str = "Trying again with helper functions corrected.";
pub const RETRY_SOLVED: &str = "Problem solved!";

/// A re-run against the hybrid module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Retry {
    /// Functions taken from the reference implementation.
    pub patched: Vec<String>,
    pub entries: Vec<Entry>,
    pub solved: bool,
}

impl Retry {
    pub fn new(patched: Vec<String>, entries: Vec<Entry>) -> Self {
        let solved = !has_failures(&entries);
        Self {
            patched,
            entries,
            solved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureReport {
    pub name: String,
    /// Entries of the run against the unmodified student module.
    pub entries: Vec<Entry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<Retry>,
}

impl ProcedureReport {
    pub fn new(name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            entries,
            retry: None,
        }
    }

    /// The entries that count: the retry's if there was one.
    pub fn final_entries(&self) -> &[Entry] {
        match &self.retry {
            Some(retry) => &retry.entries,
            None => &self.entries,
        }
    }

    pub fn passed(&self) -> bool {
        !has_failures(self.final_entries())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Display path of the student implementation.
    pub subject: String,
    pub procedures: Vec<ProcedureReport>,
    /// Registry after the last procedure.
    pub faulty: FaultRegistry,
    /// Matched checks, counted over final entries.
    pub passed: usize,
    /// Mismatched checks and fatals, counted over final entries.
    pub failed: usize,
}

impl Report {
    pub fn new(subject: impl Into<String>, procedures: Vec<ProcedureReport>, faulty: FaultRegistry) -> Self {
        let (failed, passed) = procedures
            .iter()
            .flat_map(ProcedureReport::final_entries)
            .fold((0, 0), |(failed, passed), entry| {
                if entry.is_failure() {
                    (failed + 1, passed)
                } else {
                    (failed, passed + 1)
                }
            });
        Self {
            subject: subject.into(),
            procedures,
            faulty,
            passed,
            failed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn render(&self, config: &ReportConfig) -> String {
        let rule = "=".repeat(config.banner_width);
        let mut out = format!("{rule}\nAutomated testing for {}\n{rule}\n\n", self.subject);

        for procedure in &self.procedures {
            let title = format!(" {} ", procedure.name);
            out.push_str(&format!("{title:-^width$}\n\n", width = config.section_width));

            match &procedure.retry {
                Some(retry) => {
                    if config.include_first_run {
                        render_entries(&mut out, &procedure.entries, config);
                    }
                    out.push_str(RETRY_BANNER);
                    out.push('\n');
                    if retry.solved {
                        out.push_str(RETRY_SOLVED);
                        out.push_str("\n\n");
                    } else {
                        out.push('\n');
                        render_entries(&mut out, &retry.entries, config);
                    }
                }
                None => render_entries(&mut out, &procedure.entries, config),
            }
        }
        out
    }
}

fn render_entries(out: &mut String, entries: &[Entry], config: &ReportConfig) {
    for entry in entries {
        let block = match entry {
            Entry::Check(outcome) if outcome.matched => {
                if !config.show_passing {
                    continue;
                }
                outcome.passing_message()
            }
            Entry::Check(outcome) => outcome.message(),
            Entry::Fatal(fatal) => fatal.render(),
        };
        out.push_str(&block);
        out.push_str("\n\n");
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&ReportConfig::default()))
    }
}
