//! Store root handle and default root resolution

use crate::{Error, Result};
use dirs::{cache_dir, home_dir};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable overriding the default store root
pub const CACHE_DIR_ENV: &str = "MEMOIR_CACHE_DIR";

/// Shared, swappable store root
///
/// Clones share the same root, so swapping it through one handle is seen
/// by every store built from that handle. Each store operation resolves
/// the root once when it starts.
#[derive(Debug, Clone)]
pub struct StoreRoot {
    path: Arc<RwLock<PathBuf>>,
}

impl StoreRoot {
    /// Create a root handle
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(RwLock::new(path.into())),
        }
    }

    /// The current root directory
    #[must_use]
    pub fn get(&self) -> PathBuf {
        self.path.read().clone()
    }

    /// Replace the root directory, returning the previous one
    pub fn set(&self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        tracing::debug!(root = %path.display(), "Store root changed");
        std::mem::replace(&mut *self.path.write(), path)
    }

    /// Replace the root until the returned guard is dropped
    #[must_use = "the previous root is restored when the guard is dropped"]
    pub fn scoped(&self, path: impl Into<PathBuf>) -> RootGuard<'_> {
        let previous = self.set(path);
        RootGuard {
            root: self,
            previous: Some(previous),
        }
    }
}

/// Restores a store root on drop, including during unwinding
#[derive(Debug)]
pub struct RootGuard<'a> {
    root: &'a StoreRoot,
    previous: Option<PathBuf>,
}

impl Drop for RootGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.root.set(previous);
        }
    }
}

/// Inputs for determining the default store root
#[derive(Debug, Clone)]
struct RootInputs {
    memoir_cache_dir: Option<PathBuf>,
    xdg_cache_home: Option<PathBuf>,
    os_cache_dir: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    temp_dir: PathBuf,
}

fn root_from_inputs(inputs: RootInputs) -> Result<PathBuf> {
    // Resolution order (first writable wins):
    // 1) MEMOIR_CACHE_DIR (explicit override)
    // 2) XDG_CACHE_HOME/memoir
    // 3) OS cache dir/memoir
    // 4) ~/.memoir/cache
    // 5) TMPDIR/memoir/cache (fallback)
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(dir) = inputs.memoir_cache_dir.filter(|p| !p.as_os_str().is_empty()) {
        candidates.push(dir);
    }
    if let Some(xdg) = inputs.xdg_cache_home {
        candidates.push(xdg.join("memoir"));
    }
    if let Some(os_cache) = inputs.os_cache_dir {
        candidates.push(os_cache.join("memoir"));
    }
    if let Some(home) = inputs.home_dir {
        candidates.push(home.join(".memoir/cache"));
    }
    candidates.push(inputs.temp_dir.join("memoir/cache"));

    for path in candidates {
        // Nix build sandboxes point HOME here; it is never writable
        if path.starts_with("/homeless-shelter") {
            continue;
        }
        if is_writable_dir(&path) || std::fs::create_dir_all(&path).is_ok() {
            return Ok(path);
        }
    }
    Err(Error::configuration(
        "Failed to determine a writable store directory",
    ))
}

fn is_writable_dir(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    // Some CI environments provide read-only cache directories under $HOME
    tempfile::tempfile_in(path).is_ok()
}

/// Resolve the default store root from the environment
///
/// # Errors
///
/// Returns a configuration error if no candidate directory is writable
pub fn default_root() -> Result<PathBuf> {
    let non_empty = |key: &str| {
        std::env::var(key)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    };
    root_from_inputs(RootInputs {
        memoir_cache_dir: non_empty(CACHE_DIR_ENV),
        xdg_cache_home: non_empty("XDG_CACHE_HOME"),
        os_cache_dir: cache_dir(),
        home_dir: home_dir(),
        temp_dir: std::env::temp_dir(),
    })
}
