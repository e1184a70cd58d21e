//! Error types for the brain configuration library.
//!
//! Most of this crate fails open: missing or malformed documents become empty
//! views. These errors cover the operations where a caller needs to know what
//! went wrong (writing state, compiling a pattern, unexpected IO failures).

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing brain documents and state.
#[derive(Error, Debug)]
pub enum BrainError {
    /// Failed to read a file for a reason other than absence.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a parent directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDirError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize JSON.
    #[error("failed to serialize state: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// A pattern could not be compiled into a matcher.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl BrainError {
    /// Return a short suggestion for fixing this error, if there is one.
    pub fn help(&self) -> Option<String> {
        match self {
            BrainError::InvalidPattern { .. } => Some(
                "patterns support `*`, `**` and `?`; other characters match literally".into(),
            ),
            BrainError::CreateDirError { path, .. } | BrainError::WriteError { path, .. } => {
                Some(format!("check that {} is writable", path.display()))
            }
            _ => None,
        }
    }
}

/// Result type alias for brain configuration operations.
pub type Result<T> = std::result::Result<T, BrainError>;
