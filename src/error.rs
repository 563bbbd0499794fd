//! Global error handling for treedump
//!
//! This module provides the crate-wide error type. Per-entry scan problems are
//! not errors: they are collected as [`ScanWarning`](crate::types::ScanWarning)
//! values and the scan keeps going.

use std::io;
use thiserror::Error;

use crate::cancel::Cancelled;

/// Global error type for treedump operations
#[derive(Error, Debug)]
pub enum TreeDumpError {
    /// Invalid root path or unusable filter input, raised before any scan
    #[error("Validation error: {0}")]
    Validation(String),

    /// Output-level file system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No free output file name could be found
    #[error("Output path error: {0}")]
    OutputPath(String),

    /// Configuration errors (defaults file, language map)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stop request was observed
    #[error("{0}")]
    Cancelled(#[from] Cancelled),
}

impl TreeDumpError {
    /// Whether this error only reports a stop request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Specialized Result type for treedump operations
pub type Result<T> = std::result::Result<T, TreeDumpError>;

/// Creates a TreeDumpError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::TreeDumpError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding context to I/O errors
pub trait ResultExt<T> {
    /// Wrap the error into an `io::Error` that carries additional context
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T> ResultExt<T> for std::result::Result<T, io::Error> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            TreeDumpError::Io(io::Error::new(e.kind(), format!("{}: {}", context, e)))
        })
    }
}
