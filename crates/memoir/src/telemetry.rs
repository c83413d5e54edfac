//! Tracing setup for programs that use memoized computations
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them call [`init_tracing`] once at startup.

use crate::{Error, Result};
use std::io;
pub use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding a filter directive for memoir's events
pub const LOG_ENV: &str = "MEMOIR_LOG";

/// Tracing output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
    /// Structured JSON format
    Json,
}

impl std::str::FromStr for TracingFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(Error::configuration(format!("Unknown tracing format: {s}"))),
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format
    pub format: TracingFormat,
    /// Level applied to the memoir crates when no filter is given
    pub level: Level,
    /// Explicit filter directive, taking precedence over the environment
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::Compact,
            level: Level::WARN,
            filter: None,
        }
    }
}

fn level_str(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

/// The filter directive `config` resolves to
///
/// Precedence: `config.filter`, then `MEMOIR_LOG`, then `RUST_LOG`, then
/// `config.level` applied to the memoir crates.
#[must_use]
pub fn filter_directive(config: &TracingConfig) -> String {
    if let Some(filter) = &config.filter {
        return filter.clone();
    }
    for var in [LOG_ENV, EnvFilter::DEFAULT_ENV] {
        if let Ok(value) = std::env::var(var)
            && !value.trim().is_empty()
        {
            return value;
        }
    }
    let level = level_str(config.level);
    format!("memoir={level},memoir_store={level},memoir_fingerprint={level}")
}

/// Initialize tracing with the given configuration
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the filter directive is invalid or a
/// global subscriber is already installed
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let directive = filter_directive(config);
    let env_filter = EnvFilter::try_new(&directive)
        .map_err(|e| Error::configuration(format!("Failed to create tracing filter: {e}")))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.format {
        TracingFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true);
            registry.with(layer).try_init()
        }
        TracingFormat::Compact => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false);
            registry.with(layer).try_init()
        }
        TracingFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(true);
            registry.with(layer).try_init()
        }
    };
    installed.map_err(|e| {
        Error::configuration(format!("Failed to install tracing subscriber: {e}"))
    })?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        filter = %directive,
        "Tracing initialized for memoir"
    );
    Ok(())
}
