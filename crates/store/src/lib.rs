//! Filesystem result store for memoized computations
//!
//! Records are keyed by a content-addressed key (normally a call
//! fingerprint) and stored as:
//! - `root/<key>`: one file per record, nested key segments become directories
//! - a zstd frame wrapping the value in the store's [`Format`]
//!
//! There is no index or manifest; a record exists if its file exists.
//! Records are never deleted by the store.
//!
//! # Root management
//!
//! The root can be swapped permanently with [`FsStore::set_root`] or for the
//! duration of an action with [`FsStore::with_root`], which restores the
//! previous root even if the action fails or panics.

mod config;
mod error;
mod format;
mod root;
mod store;

pub use config::{COMPRESSION_LEVEL_ENV, DEFAULT_COMPRESSION_LEVEL, StoreConfig};
pub use error::{Error, Result};
pub use format::{Format, Json, MessagePack};
pub use root::{CACHE_DIR_ENV, RootGuard, StoreRoot, default_root};
pub use store::{FsStore, ResultStore};
