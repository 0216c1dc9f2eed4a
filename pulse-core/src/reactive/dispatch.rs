//! Dispatch Context
//!
//! Notification is plain recursion: an observer that calls `set` on another
//! signal starts a nested pass before the outer one returns. A long chain of
//! computed values therefore nests as deep as the chain is long.
//!
//! To keep that from exhausting the call stack, every pass enters a
//! `DispatchGuard`. The guard bumps a thread-local depth counter and refuses
//! to enter once the per-thread limit is reached. The counter is restored when
//! the guard drops, including while unwinding from a panicking observer.
//!
//! This module also holds the unwind helpers used by isolated observers and
//! by `Signal::try_set`.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{panic_message, Result, SignalError};

use super::id::SubscriptionId;

/// Depth limit in force on threads that never call `set_max_depth`.
pub const DEFAULT_MAX_DEPTH: usize = 256;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static MAX_DEPTH: Cell<usize> = const { Cell::new(DEFAULT_MAX_DEPTH) };
}

/// Set the nesting limit for notification passes on the current thread.
///
/// A limit of zero is raised to one so that top-level writes always work.
pub fn set_max_depth(limit: usize) {
    MAX_DEPTH.with(|max| max.set(limit.max(1)));
}

/// The nesting limit on the current thread.
pub fn max_depth() -> usize {
    MAX_DEPTH.with(Cell::get)
}

/// How many passes are currently running on this thread.
pub fn current_depth() -> usize {
    DEPTH.with(Cell::get)
}

/// Marks one running notification pass. Dropping it leaves the pass.
#[derive(Debug)]
pub struct DispatchGuard {
    depth: usize,
}

impl DispatchGuard {
    /// Enter a pass, or fail if that would exceed the thread's limit.
    pub fn enter() -> Result<Self> {
        let depth = current_depth() + 1;
        let limit = max_depth();
        if depth > limit {
            return Err(SignalError::DepthExceeded { depth, limit });
        }

        DEPTH.with(|current| current.set(depth));
        Ok(Self { depth })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DEPTH.with(|current| {
            debug_assert_eq!(
                current.get(),
                self.depth,
                "DispatchGuard mismatch: expected depth {}, got {}",
                self.depth,
                current.get()
            );
            current.set(self.depth - 1);
        });
    }
}

/// Run one observer, logging a panic instead of unwinding.
pub(crate) fn run_isolated<F: FnOnce()>(signal: u64, subscription: SubscriptionId, f: F) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        tracing::error!(
            signal,
            subscription = %subscription,
            panic = %panic_message(&*payload),
            "observer panicked; continuing notification"
        );
    }
}

/// Run `f`, turning an escaping panic into a `SignalError`.
pub(crate) fn catching<R, F: FnOnce() -> R>(f: F) -> Result<R> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(SignalError::from_panic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::id::{IdGenerator, Sequence};

    #[test]
    fn guard_tracks_depth() {
        assert_eq!(current_depth(), 0);

        {
            let outer = DispatchGuard::enter().unwrap();
            assert_eq!(outer.depth(), 1);

            {
                let inner = DispatchGuard::enter().unwrap();
                assert_eq!(inner.depth(), 2);
                assert_eq!(current_depth(), 2);
            }

            assert_eq!(current_depth(), 1);
        }

        assert_eq!(current_depth(), 0);
    }

    #[test]
    fn guard_refuses_past_limit() {
        set_max_depth(2);

        let _a = DispatchGuard::enter().unwrap();
        let _b = DispatchGuard::enter().unwrap();
        let err = DispatchGuard::enter().unwrap_err();

        assert_eq!(err, SignalError::DepthExceeded { depth: 3, limit: 2 });
        assert_eq!(current_depth(), 2);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        set_max_depth(0);
        assert_eq!(max_depth(), 1);
        assert!(DispatchGuard::enter().is_ok());
    }

    #[test]
    fn depth_is_restored_after_panic() {
        let result = catching(|| {
            let _guard = DispatchGuard::enter().unwrap();
            panic!("observer failed");
        });

        assert_eq!(
            result,
            Err(SignalError::ObserverPanicked { message: "observer failed".to_string() })
        );
        assert_eq!(current_depth(), 0);
    }

    #[test]
    fn run_isolated_swallows_panics() {
        let id = Sequence::new().next_id();
        run_isolated(0, id, || panic!("ignored"));
        assert_eq!(current_depth(), 0);
    }
}
