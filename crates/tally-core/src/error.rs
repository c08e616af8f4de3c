//! Error types for tally's ambient concerns.
//!
//! [`TallyError`] covers configuration loading and filesystem setup. Transcript
//! parsing has its own error type in `tally-stats`; this enum never describes
//! a malformed transcript line, because those are skipped rather than raised.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`TallyError`].
pub type Result<T> = std::result::Result<T, TallyError>;

/// Errors raised while configuring and bootstrapping tally.
#[derive(Debug, Error)]
pub enum TallyError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in tally or broken environment)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TallyError {
    /// Create a ConfigNotFound error with source
    pub fn config_not_found_with_source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: Some(source),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Create ~/.tally/config.yaml or pass --config with an existing file")
            }
            Self::ConfigInvalid { .. } => Some("Check YAML syntax in the configuration file"),
            Self::ConfigValidation { .. } => {
                Some("max_line_bytes must be between 1 KiB and 64 MiB")
            }
            Self::DirectoryCreation { .. } => Some("Check permissions on the log directory"),
            _ => None,
        }
    }
}
