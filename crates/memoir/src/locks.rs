//! In-process mutual exclusion per store key
//!
//! Without locking, two callers that miss on the same key at the same time
//! both compute and both write; the last write wins. [`KeyLocks`] lets a
//! caller hold a key for the whole exists/compute/write sequence so the
//! second caller waits and then reads the first caller's record.

use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::LazyLock;

static GLOBAL_LOCKS: LazyLock<KeyLocks> = LazyLock::new(KeyLocks::new);

/// Registry of keys currently held by a caller
#[derive(Debug, Default)]
pub struct KeyLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl KeyLocks {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_LOCKS
    }

    /// Block until `key` is free, then hold it until the guard is dropped
    ///
    /// Not reentrant: acquiring a key already held by the same thread
    /// deadlocks.
    pub fn acquire(&self, key: &str) -> KeyGuard<'_> {
        let mut held = self.held.lock();
        while held.contains(key) {
            tracing::trace!(key, "Waiting for in-flight key");
            self.released.wait(&mut held);
        }
        held.insert(key.to_owned());
        KeyGuard {
            locks: self,
            key: key.to_owned(),
        }
    }

    /// Whether `key` is currently held
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.held.lock().contains(key)
    }
}

/// Releases a key on drop
#[derive(Debug)]
pub struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: String,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.locks.held.lock().remove(&self.key);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_and_release() {
        let locks = KeyLocks::new();
        {
            let _guard = locks.acquire("a");
            assert!(locks.is_held("a"));
            assert!(!locks.is_held("b"));
        }
        assert!(!locks.is_held("a"));
    }

    #[test]
    fn test_distinct_keys_do_not_block() {
        let locks = KeyLocks::new();
        let _a = locks.acquire("a");
        let _b = locks.acquire("b");
        assert!(locks.is_held("a") && locks.is_held("b"));
    }

    #[test]
    fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _guard = locks.acquire("shared");
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(!locks.is_held("shared"));
    }
}
