//! Memoized computations
//!
//! [`memoize`] wraps a computation so that each call is keyed by its
//! call fingerprint (code, arguments, captured environment). The first call
//! with a given key computes and stores the result; later calls read it
//! back from the store.

use crate::locks::KeyLocks;
use crate::suspension;
use crate::{Error, Result};
use memoir_fingerprint::{Arguments, Code, Digest, Environment, call_fingerprint};
use memoir_store::ResultStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

type EnvironmentProvider =
    dyn Fn() -> memoir_fingerprint::Result<Environment> + Send + Sync + 'static;

/// How concurrent calls with the same key are coordinated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockMode {
    /// No coordination: concurrent misses may both compute and both write,
    /// and the last write wins
    #[default]
    Shared,
    /// Callers with the same key run one at a time within this process, so
    /// each key is computed once
    PerKey,
}

/// Counters of how calls were served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    /// Calls answered from the store
    pub hits: u64,
    /// Calls that computed and stored a result
    pub misses: u64,
    /// Calls that ran while memoization was suspended
    pub bypassed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
}

/// A computation wrapped with disk-backed memoization
pub struct Memoized<S, F> {
    code: Code,
    store: S,
    computation: F,
    environment: Option<Box<EnvironmentProvider>>,
    lock_mode: LockMode,
    counters: Counters,
}

/// Wrap `computation` so its results are memoized in `store`
///
/// The computation receives the call's [`Arguments`] and must be a pure
/// function of its code, its arguments, and whatever the environment
/// provider captures.
///
/// ```no_run
/// use memoir::{Code, FsStore, args, memoize};
///
/// let square = memoize(
///     Code::source("square", "fn square(x: i64) -> i64 { x * x }"),
///     FsStore::new("/tmp/memo"),
///     |args: &memoir::Arguments| -> memoir::Result<i64> {
///         let x: i64 = args.positional(0)?;
///         Ok(x * x)
///     },
/// );
/// let value: i64 = square.call(&args![4]?)?;
/// assert_eq!(value, 16);
/// # Ok::<(), memoir::Error>(())
/// ```
pub fn memoize<S, F>(code: Code, store: S, computation: F) -> Memoized<S, F>
where
    S: ResultStore,
{
    Memoized {
        code,
        store,
        computation,
        environment: None,
        lock_mode: LockMode::default(),
        counters: Counters::default(),
    }
}

impl<S, F> Memoized<S, F>
where
    S: ResultStore,
{
    /// Capture the computation's environment at each call
    ///
    /// The provider runs once per non-suspended call, so the fingerprint
    /// reflects the captured values at call time.
    #[must_use]
    pub fn environment(
        mut self,
        provider: impl Fn() -> memoir_fingerprint::Result<Environment> + Send + Sync + 'static,
    ) -> Self {
        self.environment = Some(Box::new(provider));
        self
    }

    /// Choose how concurrent calls with the same key are coordinated
    #[must_use]
    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.lock_mode = mode;
        self
    }

    /// Code identity of the computation
    #[must_use]
    pub fn code(&self) -> &Code {
        &self.code
    }

    /// The backing store
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// How calls have been served so far
    #[must_use]
    pub fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            bypassed: self.counters.bypassed.load(Ordering::Relaxed),
        }
    }

    /// The store key a call with `args` would use right now
    ///
    /// # Errors
    ///
    /// Returns an error if the environment provider fails
    pub fn key(&self, args: &Arguments) -> Result<Digest> {
        let environment = match &self.environment {
            Some(provider) => provider()?,
            None => Environment::new(),
        };
        Ok(call_fingerprint(&self.code, args, &environment))
    }

    /// Call the computation, answering from the store when possible
    ///
    /// # Errors
    ///
    /// Returns the computation's error, or a fingerprint or store error.
    /// Store errors are not retried and do not trigger recomputation.
    pub fn call<T>(&self, args: &Arguments) -> Result<T>
    where
        F: Fn(&Arguments) -> Result<T>,
        T: Serialize + DeserializeOwned,
    {
        if suspension::is_suspended() {
            self.counters.bypassed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                name = self.code.name(),
                "Memoization suspended; computing directly"
            );
            return (self.computation)(args);
        }

        let key = self.key(args)?;
        let key = key.as_hex();
        let _guard = match self.lock_mode {
            LockMode::PerKey => Some(KeyLocks::global().acquire(key)),
            LockMode::Shared => None,
        };

        if self.store.exists(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(name = self.code.name(), key, "Memo hit");
            return self.store.read(key).map_err(Error::from);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(name = self.code.name(), key, "Memo miss; computing");
        let result = (self.computation)(args)?;
        Ok(self.store.write(key, result)?)
    }
}

impl<S: fmt::Debug, F> fmt::Debug for Memoized<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("code", &self.code)
            .field("store", &self.store)
            .field("lock_mode", &self.lock_mode)
            .field("captures_environment", &self.environment.is_some())
            .finish_non_exhaustive()
    }
}
