//! `causa.toml`: analysis and output defaults for the CLI.
//!
//! ```toml
//! [analysis]
//! counterfactuals = true
//!
//! [output]
//! format = "text"   # text | json
//!
//! [log]
//! filter = "warn"
//! ```
//!
//! Flags always win over file values. Axioms and thresholds are fixed and
//! have no configuration surface.

use crate::error::{CliError, display_path};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "causa.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub counterfactuals: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            counterfactuals: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub filter: Option<String>,
}

impl Config {
    pub fn parse(raw: &str, path: &Path) -> Result<Self, CliError> {
        toml::from_str(raw).map_err(|source| CliError::Config {
            path: display_path(path),
            source,
        })
    }

    /// Load an explicit config, or `./causa.toml` if it exists.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| CliError::Io {
            path: display_path(&path),
            source,
        })?;
        Self::parse(&raw, &path)
    }

    pub fn wants_json(&self, json_flag: bool) -> bool {
        json_flag || self.output.format == OutputFormat::Json
    }
}
