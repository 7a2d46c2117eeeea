//! Error types and handling infrastructure for tailcast.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! the library error type. The binary layers `anyhow` on top for context.
//!
//! ## Recovery model
//!
//! - **Startup**: every error is surfaced to the caller; no snapshot, no engine
//! - **Polling**: errors fail a single tick and the next tick retries
//! - **Missing file**: reported through [`TailError::is_file_missing`] so the
//!   poll loop can keep waiting for the file to come back

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for tailcast operations.
#[derive(Error, Debug)]
pub enum TailError {
    /// File system related errors (open, stat, read failures)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found at the watched path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Path exists but is not a regular file
    #[error("Path is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// Permission denied accessing file
    #[error("Permission denied accessing file: {path}")]
    PermissionDenied { path: PathBuf },

    /// Requested byte range lies beyond the file's current end
    #[error("Range {offset}+{length} exceeds file size {file_size}")]
    MalformedRange {
        offset: u64,
        length: u64,
        file_size: u64,
    },

    /// A single read did not finish in time
    #[error("Read of {path} timed out after {timeout:?}")]
    ReadTimeout { path: PathBuf, timeout: Duration },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid command line arguments
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for tailcast operations.
pub type Result<T> = std::result::Result<T, TailError>;

impl TailError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Classify an io::Error raised while touching `path`
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path: path.into() },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: path.into() },
            _ => {
                let path = path.into();
                Self::FileError {
                    message: format!("IO operation on {} failed", path.display()),
                    source,
                }
            }
        }
    }

    pub fn malformed_range(offset: u64, length: u64, file_size: u64) -> Self {
        Self::MalformedRange {
            offset,
            length,
            file_size,
        }
    }

    /// Create an InvalidArgument error with a descriptive message
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// True when the watched file is gone (deleted or mid-rotation)
    pub fn is_file_missing(&self) -> bool {
        match self {
            Self::FileNotFound { .. } => true,
            Self::FileError { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

// Automatic conversion from io::Error to TailError
impl From<std::io::Error> for TailError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileError {
                message: "File not found".to_string(),
                source: err,
            },
            std::io::ErrorKind::PermissionDenied => Self::FileError {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::FileError {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}
