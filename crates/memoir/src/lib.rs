//! Disk-backed memoization of deterministic computations
//!
//! A memoized computation is keyed by a single SHA-256 over three parts:
//! - its code identity ([`Code`])
//! - the call's [`Arguments`], rendered canonically
//! - the values it captures from its surroundings ([`Environment`])
//!
//! The first call with a key computes the result and writes it to a
//! [`ResultStore`]; later calls with the same key read it back, in this
//! process or a later one. Changing any of the three parts changes the key,
//! so stale results are never returned.
//!
//! ```no_run
//! use memoir::{Arguments, Code, FsStore, args, memoize, suspended};
//!
//! let store = FsStore::new("/tmp/memo");
//! let rolx = memoize(
//!     Code::versioned("rolx", "1"),
//!     &store,
//!     |args: &Arguments| -> memoir::Result<Vec<f64>> {
//!         let dims: u32 = args.keyword_or("dims", 16)?;
//!         Ok(vec![0.0_f64; dims as usize])
//!     },
//! );
//!
//! let first: Vec<f64> = rolx.call(&args![; dims = 8]?)?;
//! let again: Vec<f64> = rolx.call(&args![; dims = 8]?)?;
//! assert_eq!(first, again);
//!
//! // Runs the computation without touching the store
//! let fresh: Vec<f64> = suspended(|| rolx.call(&args![; dims = 8]?))?;
//! # let _ = fresh;
//! # Ok::<(), memoir::Error>(())
//! ```

mod error;
pub mod locks;
mod memoize;
pub mod suspension;
pub mod telemetry;

pub use error::{Error, Result};
pub use memoize::{LockMode, MemoStats, Memoized, memoize};
pub use suspension::{SuspendGuard, is_suspended, suspend, suspended};

pub use memoir_fingerprint::{
    Arguments, Code, CodeBody, Digest, Environment, arg_fingerprint, args, call_fingerprint,
    code_fingerprint, env_fingerprint,
};
pub use memoir_store::{
    Error as StoreError, FsStore, Json, MessagePack, Result as StoreResult, ResultStore,
    StoreConfig, default_root,
};
