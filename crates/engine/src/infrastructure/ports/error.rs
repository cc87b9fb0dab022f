//! Persistence error types.

use std::path::{Path, PathBuf};

use talegraph_domain::DomainError;
use thiserror::Error;

/// Errors from loading or saving dialogue documents.
#[derive(Debug, Error)]
pub enum CodecError {
    /// File or directory could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not a valid dialogue (or characters) document.
    #[error("Parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Document exceeds the configured size limit.
    #[error("{} is {size} bytes, over the {limit} byte limit", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Dialogue has never been given a file path.
    #[error("Dialogue {0} has no file path")]
    MissingFilePath(String),

    /// Value could not be rendered as YAML.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Loaded content broke a registry invariant (e.g. two files, one dialogue id).
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl CodecError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(path: &Path, message: impl ToString) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}
