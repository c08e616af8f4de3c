//! Error types for transcript parsing.
//!
//! Only failures of the input source itself are errors. A line that cannot
//! be decoded is skipped inside the parser and never reaches this type.

use std::path::PathBuf;
use thiserror::Error;

/// Transcript parsing errors.
#[derive(Error, Debug)]
pub enum StatsError {
    /// The transcript could not be opened
    #[error("failed to open transcript {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the transcript failed part way through
    #[error("failed to read transcript {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StatsError {
    /// Path of the transcript involved, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            StatsError::Open { path, .. } | StatsError::Read { path, .. } => Some(path),
        }
    }

    /// Create a user-friendly message for this error.
    pub fn friendly_message(&self) -> String {
        match self {
            StatsError::Open { path, source } => match source.kind() {
                std::io::ErrorKind::NotFound => {
                    format!("Transcript not found: {}", path.display())
                }
                std::io::ErrorKind::PermissionDenied => {
                    format!("Permission denied reading {}", path.display())
                }
                _ => format!("Could not open {}: {}", path.display(), source),
            },
            _ => self.to_string(),
        }
    }
}

/// Result type for transcript parsing operations.
pub type Result<T> = std::result::Result<T, StatsError>;
