//! Error types for the Lumen app engine
//!
//! This module defines the error types used throughout the engine, covering
//! native library loading, native calls, payload extraction and application
//! construction.

use std::fmt;

/// Result type for Lumen engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// The native graphics library could not be loaded or its entry points bound
    NativeLoadFailed(String),

    /// A native call failed; carries the failing call or bring-up step name
    /// and the raw native result code
    NativeCallFailed { call: &'static str, code: i32 },

    /// Payload lookup or temp-file creation/copy failed
    FilesystemFailed(String),

    /// The application type could not be constructed
    InstantiationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NativeLoadFailed(msg) => write!(f, "Native load failed: {}", msg),
            Error::NativeCallFailed { call, code } => {
                write!(f, "Native call '{}' failed: native result {}", call, code)
            }
            Error::FilesystemFailed(msg) => write!(f, "Filesystem failure: {}", msg),
            Error::InstantiationFailed(msg) => write!(f, "Instantiation failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
