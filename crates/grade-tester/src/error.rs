//! Errors that abort a suite run.

use std::path::PathBuf;

use grade_eval::PatchError;
use thiserror::Error;

use crate::check::ExceptionRecord;

/// A fault in the suite itself, as opposed to a fault in student code.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// The reference implementation raised outside a check.
    #[error("reference implementation raised in {procedure}:\n{}", .exception.traceback)]
    ReferenceImplementation {
        procedure: String,
        exception: ExceptionRecord,
    },

    #[error("cannot re-run {procedure} with corrected helpers")]
    EcfPatch {
        procedure: String,
        #[source]
        source: PatchError,
    },
}

impl SuiteError {
    pub fn procedure(&self) -> &str {
        match self {
            Self::ReferenceImplementation { procedure, .. } | Self::EcfPatch { procedure, .. } => {
                procedure
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
