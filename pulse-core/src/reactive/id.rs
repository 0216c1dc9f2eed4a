//! Subscription identifiers.
//!
//! Every observer registration gets a `SubscriptionId`. The only contract is
//! uniqueness within the generator that issued it; the numeric value carries
//! no ordering meaning for consumers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque handle identifying one observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// The raw counter value, for logging and diagnostics.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Source of fresh subscription identifiers.
pub trait IdGenerator: Send + Sync {
    /// Return an id never returned before by this generator.
    fn next_id(&self) -> SubscriptionId;
}

/// Monotonic counter, the default `IdGenerator`.
///
/// Each registry owns its own `Sequence`, so no global state is involved.
/// The counter is 64 bits wide and is never exhausted in practice.
#[derive(Debug, Default)]
pub struct Sequence {
    next: AtomicU64,
}

impl Sequence {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Start issuing ids at `first`.
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl IdGenerator for Sequence {
    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
