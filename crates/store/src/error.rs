//! Error types for the store crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for store operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during store operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(memoir::store::io),
        help("Check file permissions, free space, and that the store root exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "create_dir_all")
        operation: String,
    },

    /// No record exists for the key
    #[error("Store record not found: {key}")]
    #[diagnostic(
        code(memoir::store::not_found),
        help("Check `exists` before `read`; the record may never have been written under this root")
    )]
    NotFound {
        /// The key that was not found
        key: String,
    },

    /// A record exists but cannot be decompressed or decoded
    #[error("Corrupt store record {key} at {}: {message}", path.display())]
    #[diagnostic(
        code(memoir::store::corrupt_record),
        help("The record was left in place; remove it by hand to force recomputation")
    )]
    CorruptRecord {
        /// The key of the damaged record
        key: String,
        /// Location of the record
        path: Box<Path>,
        /// Decoder message
        message: String,
    },

    /// A value could not be serialized
    #[error("Serialization error: {message}")]
    #[diagnostic(code(memoir::store::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },

    /// A key would resolve outside the store root
    #[error("Invalid store key {key:?}: {reason}")]
    #[diagnostic(
        code(memoir::store::invalid_key),
        help("Keys are relative paths made of plain names; `..` and drive prefixes are not allowed")
    )]
    InvalidKey {
        /// The rejected key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration or validation error
    #[error("Store configuration error: {message}")]
    #[diagnostic(code(memoir::store::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a not found error
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a corrupt record error
    #[must_use]
    pub fn corrupt_record(
        key: impl Into<String>,
        path: impl AsRef<Path>,
        message: impl Into<String>,
    ) -> Self {
        Self::CorruptRecord {
            key: key.into(),
            path: path.as_ref().into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Create an invalid key error
    #[must_use]
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;
