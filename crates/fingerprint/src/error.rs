//! Error types for the fingerprint crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Error type for fingerprint operations
///
/// Fingerprinting itself is total. These errors arise while building the
/// inputs to a fingerprint (rendering a value) or while reading typed
/// arguments back out of an [`Arguments`](crate::Arguments) set.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A value could not be rendered into its canonical form
    #[error("Cannot render {what} canonically: {message}")]
    #[diagnostic(
        code(memoir::fingerprint::canonicalization),
        help("Arguments and captures must serialize to JSON-compatible data (maps need string or integer keys)")
    )]
    Canonicalization {
        /// What was being rendered (e.g. "positional argument 0")
        what: String,
        /// Serializer message
        message: String,
    },

    /// A requested argument is not present
    #[error("Argument {name} was not supplied")]
    #[diagnostic(code(memoir::fingerprint::argument_missing))]
    ArgumentMissing {
        /// Positional index or keyword name
        name: String,
    },

    /// An argument is present but does not decode as the requested type
    #[error("Argument {name} does not decode as {expected}: {message}")]
    #[diagnostic(code(memoir::fingerprint::argument_type))]
    ArgumentType {
        /// Positional index or keyword name
        name: String,
        /// Requested Rust type
        expected: &'static str,
        /// Decoder message
        message: String,
    },

    /// A string is not a valid 64-character hex digest
    #[error("Invalid digest: {message}")]
    #[diagnostic(code(memoir::fingerprint::invalid_digest))]
    InvalidDigest {
        /// What is wrong with the input
        message: String,
    },
}

impl Error {
    /// Create a canonicalization error
    #[must_use]
    pub fn canonicalization(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Canonicalization {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create a missing-argument error
    #[must_use]
    pub fn argument_missing(name: impl Into<String>) -> Self {
        Self::ArgumentMissing { name: name.into() }
    }

    /// Create an argument type error
    #[must_use]
    pub fn argument_type(
        name: impl Into<String>,
        expected: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::ArgumentType {
            name: name.into(),
            expected,
            message: message.into(),
        }
    }

    /// Create an invalid digest error
    #[must_use]
    pub fn invalid_digest(message: impl Into<String>) -> Self {
        Self::InvalidDigest {
            message: message.into(),
        }
    }
}

/// Result type for fingerprint operations
pub type Result<T> = std::result::Result<T, Error>;
