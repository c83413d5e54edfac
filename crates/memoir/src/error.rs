//! Error types for memoized calls

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Error type for memoized calls
///
/// Store failures are passed through unchanged. A memoized call never
/// falls back to recomputing when the store fails.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Building the call fingerprint failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fingerprint(#[from] memoir_fingerprint::Error),

    /// The result store failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] memoir_store::Error),

    /// The wrapped computation failed
    #[error("Computation failed: {source}")]
    #[diagnostic(code(memoir::computation))]
    Computation {
        /// Error raised by the computation
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(memoir::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl Error {
    /// Wrap an error raised inside a computation
    #[must_use]
    pub fn computation(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Computation {
            source: source.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Result type for memoized calls
pub type Result<T> = std::result::Result<T, Error>;
