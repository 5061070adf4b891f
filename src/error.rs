//! Error types for caller-level contract violations.
//!
//! Malformed wikitext is never an error; it is recovered locally and
//! reported through `Diagnostic`s. These errors are raised before any
//! parsing begins.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wiki2doc operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The markup is not a UTF-8 string.
    #[error("markup is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    /// I/O error while reading markup from disk.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A path given by the caller does not exist.
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8 {
            valid_up_to: err.valid_up_to(),
        }
    }
}
