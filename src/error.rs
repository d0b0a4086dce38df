use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unified error type for monorepo-helper operations
#[derive(Error, Debug)]
pub enum MonorepoHelperError {
    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Process execution failed: {0}")]
    Process(String),

    #[error("Failed to parse manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in monorepo-helper
pub type Result<T> = std::result::Result<T, MonorepoHelperError>;

impl MonorepoHelperError {
    /// Create a version parsing error with context
    pub fn version(msg: impl Into<String>) -> Self {
        MonorepoHelperError::Version(msg.into())
    }

    /// Create a process execution error with context
    pub fn process(msg: impl Into<String>) -> Self {
        MonorepoHelperError::Process(msg.into())
    }

    /// Create a manifest error for the given file
    pub fn manifest(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        MonorepoHelperError::Manifest {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        MonorepoHelperError::Config(msg.into())
    }

    /// The offending manifest path, if this error identifies one
    pub fn manifest_path(&self) -> Option<&Path> {
        match self {
            MonorepoHelperError::Manifest { path, .. } => Some(path),
            _ => None,
        }
    }
}
