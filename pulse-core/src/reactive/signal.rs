//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and an
//! ordered list of observers.
//!
//! # How Signals Work
//!
//! 1. `set` asks the equality policy whether the new value differs from the
//!    current one. Equal writes are dropped entirely.
//!
//! 2. On a change the value is replaced first, then every observer that was
//!    registered when the pass started is called with the new value, in
//!    registration order, on the caller's thread.
//!
//! 3. Observers added during a pass wait for the next pass. Observers removed
//!    during a pass are skipped if they have not run yet.
//!
//! `set` returns only after the whole pass, including nested passes started by
//! downstream computed values, has finished.
//!
//! # Thread Safety
//!
//! The value sits behind a `parking_lot::RwLock` and the observer list behind
//! the registry's mutex. Neither lock is held while user callbacks run, so
//! callbacks may freely read, write, subscribe and unsubscribe.

use std::fmt::Debug;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::config::SignalConfig;
use crate::error::Result;

use super::dispatch::{self, DispatchGuard};
use super::equality::Equality;
use super::id::SubscriptionId;
use super::registry::{Registry, Subscription};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A reactive value of type `T`.
///
/// Cloning a `Signal` produces another handle to the same value and observer
/// list.
///
/// # Example
///
/// ```rust
/// use pulse_core::reactive::Signal;
///
/// let count = Signal::new(0);
/// let subscription = count.observe(|value| println!("count: {value}"));
///
/// count.set(5); // prints "count: 5"
/// count.set(5); // equal, nothing happens
///
/// subscription.unsubscribe();
/// count.set(6); // nobody is listening
/// assert_eq!(count.get(), 6);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this signal.
    id: u64,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// Observers, in registration order.
    observers: Arc<Registry<T>>,

    equality: Equality<T>,

    config: SignalConfig,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + PartialEq + 'static,
{
    /// Create a signal that compares values with `PartialEq`.
    pub fn new(value: T) -> Self {
        Self::with_equality(value, Equality::partial_eq())
    }
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a signal with an explicit equality policy.
    pub fn with_equality(value: T, equality: Equality<T>) -> Self {
        Self::with_config(value, equality, SignalConfig::default())
    }

    /// Create a signal with an explicit equality policy and configuration.
    pub fn with_config(value: T, equality: Equality<T>, config: SignalConfig) -> Self {
        Self {
            id: next_signal_id(),
            value: Arc::new(RwLock::new(value)),
            observers: Arc::new(Registry::new()),
            equality,
            config,
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> SignalConfig {
        self.config
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// The value stays read-locked while `f` runs, so `f` must not write to
    /// this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Set a new value and notify observers.
    ///
    /// Returns `true` if the value changed. A value the equality policy
    /// considers equal to the current one is discarded and nobody is notified.
    ///
    /// # Panics
    ///
    /// Panics raised by observers (or by the combine function of a downstream
    /// computed value) unwind through this call unless the signal isolates its
    /// observers. A changing write made while the thread's dispatch depth
    /// limit is already reached panics with `SignalError::DepthExceeded`;
    /// equal writes never start a pass and so never hit the limit.
    pub fn set(&self, value: T) -> bool {
        if self.is_current(&value) {
            trace!(signal = self.id, "value unchanged; skipping notification");
            return false;
        }

        let guard = match DispatchGuard::enter() {
            Ok(guard) => guard,
            Err(err) => {
                warn!(signal = self.id, %err, "refusing to start notification pass");
                panic::panic_any(err);
            }
        };

        let current = self.commit(value);
        self.notify(&current, &guard);
        true
    }

    /// Like `set`, but a panic escaping the pass is returned as an error.
    ///
    /// The value is committed before any observer runs, so on error it stays
    /// updated and the observers before the failing one have already run.
    pub fn try_set(&self, value: T) -> Result<bool> {
        dispatch::catching(|| self.set(value))
    }

    /// Compute the next value from the current one and `set` it.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.get());
        self.set(next)
    }

    /// Register an observer called with every new value.
    ///
    /// When the signal is configured with `emit_initial`, the observer is
    /// also called once with the current value before this returns.
    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe(callback, self.config.emit_initial)
    }

    /// Register an observer and call it once with the current value right
    /// away, whatever the signal's configuration says.
    pub fn observe_now<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe(callback, true)
    }

    /// Remove an observer by id. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.observers.remove(id);
        if removed {
            trace!(signal = self.id, subscription = %id, "observer removed");
        }
        removed
    }

    /// Get the number of observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// A handle that can read and observe but not write.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal(self.clone())
    }

    pub(crate) fn subscribe<F>(&self, callback: F, emit_initial: bool) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let observer = self.observers.insert(callback);
        trace!(
            signal = self.id,
            subscription = %observer.id(),
            emit_initial,
            "observer registered"
        );

        if emit_initial {
            let current = self.get();
            if self.config.isolate_observers {
                dispatch::run_isolated(self.id, observer.id(), || observer.notify(&current));
            } else {
                observer.notify(&current);
            }
        }

        self.observers.handle(observer.id())
    }

    /// Whether the equality policy considers `value` equal to the current one.
    ///
    /// Compares against a copy, so the predicate may itself read this signal.
    fn is_current(&self, value: &T) -> bool {
        let current = self.get();
        self.equality.is_equal(value, &current)
    }

    /// Replace the value. Returns a copy for the notification pass.
    fn commit(&self, value: T) -> T {
        let mut guard = self.value.write();
        *guard = value;
        guard.clone()
    }

    /// Notify the observers present at the start of the pass.
    fn notify(&self, value: &T, guard: &DispatchGuard) {
        if self.observers.is_empty() {
            return;
        }

        let snapshot = self.observers.snapshot();
        debug!(
            signal = self.id,
            observers = snapshot.len(),
            depth = guard.depth(),
            "value changed; notifying observers"
        );

        for observer in &snapshot {
            // Removed by an earlier observer in this pass.
            if !self.observers.contains(observer.id()) {
                continue;
            }

            if self.config.isolate_observers {
                dispatch::run_isolated(self.id, observer.id(), || observer.notify(value));
            } else {
                observer.notify(value);
            }
        }
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            observers: Arc::clone(&self.observers),
            equality: self.equality.clone(),
            config: self.config,
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &*self.value.read())
            .field("observer_count", &self.observer_count())
            .finish()
    }
}

/// Read-only view of a signal.
///
/// Derived values hand these out so that callers cannot write to them.
pub struct ReadSignal<T>(Signal<T>)
where
    T: Clone + Send + Sync + 'static;

impl<T> ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn id(&self) -> u64 {
        self.0.id()
    }

    pub fn get(&self) -> T {
        self.0.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(f)
    }

    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.0.observe(callback)
    }

    pub fn observe_now<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.0.observe_now(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.0.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.0.observer_count()
    }

    pub(crate) fn subscribe<F>(&self, callback: F, emit_initial: bool) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.0.subscribe(callback, emit_initial)
    }
}

impl<T> Clone for ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Debug for ReadSignal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReadSignal").field(&self.0).finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
