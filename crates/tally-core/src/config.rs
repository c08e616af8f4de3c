//! Configuration for the tally command-line front end.
//!
//! Loaded from `~/.tally/config.yaml` unless an explicit path is given.
//! Every field has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TallyError};
use crate::logging::tally_home;

/// Default per-line ceiling for transcript decoding (1 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Smallest accepted per-line ceiling.
pub const MIN_MAX_LINE_BYTES: usize = 1024;

/// Largest accepted per-line ceiling.
pub const MAX_MAX_LINE_BYTES: usize = 64 * 1024 * 1024;

/// Top-level tally configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Lines longer than this many bytes are skipped without being buffered
    pub max_line_bytes: usize,

    /// Override for the log directory (defaults to `~/.tally/logs`)
    pub log_dir: Option<PathBuf>,

    /// Report format printed by the CLI
    pub output: OutputFormat,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            log_dir: None,
            output: OutputFormat::Text,
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Pretty-printed JSON report
    Json,
}

impl TallyConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TallyError::config_not_found_with_source(path, e)
            } else {
                TallyError::io("reading config", path, e)
            }
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| TallyError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path, or from the default location.
    ///
    /// A missing default file yields [`TallyConfig::default`]; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_yaml(path);
        }

        let default_path = default_config_path()?;
        if !default_path.exists() {
            debug!(path = %default_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_yaml(&default_path)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MAX_LINE_BYTES..=MAX_MAX_LINE_BYTES).contains(&self.max_line_bytes) {
            return Err(TallyError::ConfigValidation {
                message: format!(
                    "max_line_bytes must be between {} and {}, got {}",
                    MIN_MAX_LINE_BYTES, MAX_MAX_LINE_BYTES, self.max_line_bytes
                ),
            });
        }
        Ok(())
    }
}

/// Get the default configuration file path.
///
/// Returns `~/.tally/config.yaml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(tally_home()?.join("config.yaml"))
}
