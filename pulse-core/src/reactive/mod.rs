//! Reactive Primitives
//!
//! This module implements the reactive system: signals and computed values.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for a single value plus an ordered list of
//! observers. Writing a value that the signal's equality policy considers
//! different replaces the value and calls every observer with it.
//!
//! ## Computed values
//!
//! A Computed is a signal derived from a fixed, ordered list of sources. Any
//! change to any source recomputes it from the current values of *all*
//! sources. A Computed can itself be a source, so derivations chain.
//!
//! ## Subscriptions
//!
//! Observing returns a `Subscription` that removes exactly that observer.
//! Unsubscribing is idempotent.
//!
//! # Implementation Notes
//!
//! Dependencies are declared explicitly when a Computed is built; there is no
//! implicit tracking of reads. Propagation is push-based, eager and
//! synchronous: `set` returns after every dependent has been updated.

mod computed;
mod dispatch;
mod equality;
mod id;
mod observer;
mod registry;
mod signal;
mod source;

pub use computed::{computed, Computed};
pub use dispatch::{current_depth, max_depth, set_max_depth, DispatchGuard, DEFAULT_MAX_DEPTH};
pub use equality::Equality;
pub use id::{IdGenerator, Sequence, SubscriptionId};
pub use observer::Observer;
pub use registry::{Registry, Subscription, SubscriptionGuard};
pub use signal::{ReadSignal, Signal};
pub use source::{OnChange, Readable, Sources};
