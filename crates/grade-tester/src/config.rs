//! Grading configuration, read from TOML.
//!
//! ```toml
//! [report]
//! show_passing = true
//!
//! [ecf]
//! enabled = false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GradeConfig {
    pub report: ReportConfig,
    pub ecf: EcfConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Width of the `=` rules around the banner.
    pub banner_width: usize,
    /// Width the section names are centred in.
    pub section_width: usize,
    /// Render matched checks too.
    pub show_passing: bool,
    /// Keep the first run's entries above a retry.
    pub include_first_run: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            banner_width: 70,
            section_width: 30,
            show_passing: false,
            include_first_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EcfConfig {
    /// Re-run failing procedures with known-faulty helpers replaced.
    pub enabled: bool,
}

impl Default for EcfConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl GradeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. A missing file is an error; callers that treat
    /// the file as optional check for it first.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report.banner_width == 0 {
            return Err(ConfigError::Invalid("report.banner_width must be > 0".into()));
        }
        if self.report.section_width == 0 {
            return Err(ConfigError::Invalid("report.section_width must be > 0".into()));
        }
        Ok(())
    }
}
