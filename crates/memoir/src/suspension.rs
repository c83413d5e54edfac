//! Scoped suspension of memoization
//!
//! While suspended, memoized calls run their computation directly and do
//! not touch the store at all. Suspension is tracked per thread as a depth
//! counter: every [`suspend`] or [`suspended`] scope adds one level, and
//! leaving the scope (normally or by unwinding) removes it. Memoization is
//! active again once the depth returns to zero.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Whether memoization is suspended on the current thread
#[must_use]
pub fn is_suspended() -> bool {
    depth() > 0
}

/// Current suspension nesting depth on this thread
#[must_use]
pub fn depth() -> usize {
    DEPTH.with(Cell::get)
}

/// Suspend memoization on this thread until the guard is dropped
#[must_use = "memoization resumes as soon as the guard is dropped"]
pub fn suspend() -> SuspendGuard {
    let depth = DEPTH.with(|d| {
        let next = d.get() + 1;
        d.set(next);
        next
    });
    tracing::debug!(depth, "Memoization suspended");
    SuspendGuard {
        _thread_bound: PhantomData,
    }
}

/// Run `action` with memoization suspended on this thread
pub fn suspended<R>(action: impl FnOnce() -> R) -> R {
    let _guard = suspend();
    action()
}

/// Keeps memoization suspended while alive
///
/// Not `Send`: the guard must be dropped on the thread it suspended.
#[derive(Debug)]
pub struct SuspendGuard {
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        let depth = DEPTH.with(|d| {
            let next = d.get().saturating_sub(1);
            d.set(next);
            next
        });
        if depth == 0 {
            tracing::debug!("Memoization resumed");
        }
    }
}
