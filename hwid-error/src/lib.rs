//! Unified error handling for hwid
//!
//! This crate provides the single error type used by the fingerprint core and
//! the command-line front end. It uses thiserror for Display and Error impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using HwidError
pub type Result<T> = std::result::Result<T, HwidError>;

/// Unified error type for all hwid operations
#[derive(thiserror::Error, Debug)]
pub enum HwidError {
    // ============================================================================
    // Fingerprint Errors
    // ============================================================================
    #[error("Malformed fingerprint: {len} bytes (must be non-empty and a multiple of 4)")]
    MalformedFingerprint {
        len: usize,
    },

    #[error("Invalid component type tag: {0} (must be 0-3)")]
    InvalidComponentType(u32),

    #[error("Invalid fingerprint encoding: {0}")]
    InvalidEncoding(String),

    #[error("No fingerprint enrolled")]
    NotEnrolled,

    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
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
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

impl HwidError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid config error for a named field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed fingerprint error for a buffer of `len` bytes
    pub fn malformed(len: usize) -> Self {
        Self::MalformedFingerprint { len }
    }

    /// True for errors caused by the fingerprint bytes themselves
    pub fn is_fingerprint_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedFingerprint { .. } | Self::InvalidEncoding(_) | Self::InvalidComponentType(_)
        )
    }
}
