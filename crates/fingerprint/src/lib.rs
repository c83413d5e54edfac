//! Stable fingerprints of memoizable computations
//!
//! A call is identified by three parts, hashed in one SHA-256 pass:
//! - Code: source text with blank lines removed, an explicit version tag,
//!   or the qualified name when no source is available
//! - Arguments: positional values in order, keyword values sorted by name
//! - Environment: captured non-locals and referenced globals, sorted by name
//!
//! The resulting [`Digest`] is the content-addressed key under which a
//! result store keeps the call's output.
//!
//! # Canonical rendering
//!
//! Arguments and captures are rendered through serde into JSON with sorted
//! object keys. Values whose serialization depends on address or iteration
//! state (e.g. interior-mutable handles) fingerprint by whatever their
//! `Serialize` impl emits.

mod canonical;
mod code;
mod digest;
mod engine;
mod error;

pub use canonical::{Arguments, Environment, canonical_text, render};
pub use code::{Code, CodeBody};
pub use digest::{DIGEST_HEX_LEN, Digest};
pub use engine::{
    Fingerprinter, arg_fingerprint, call_fingerprint, code_fingerprint, env_fingerprint,
};
pub use error::{Error, Result};
