//! Unified error handling for hwid
//!
//! A single error type shared by the core library and the CLI.
//! None of these errors are fatal to identity derivation: the lifecycle
//! logs and swallows them, the CLI surfaces the configuration ones.

use std::io;
use std::path::PathBuf;

/// Result type alias using HwidError
pub type Result<T> = std::result::Result<T, HwidError>;

/// Unified error type for all hwid operations
#[derive(thiserror::Error, Debug)]
pub enum HwidError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("File too large: {path} ({size} bytes, max {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    // ============================================================================
    // Stored Record Errors
    // ============================================================================
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Identifier Source Errors
    // ============================================================================
    #[error("Identifier source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        source: io::Error,
    },

    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl HwidError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid record error
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    /// Create a source unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a file read error for a path
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Create a file write error for a path
    pub fn file_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }
}
