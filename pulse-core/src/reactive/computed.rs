//! Computed Implementation
//!
//! A Computed is a signal whose value is derived from an ordered list of
//! sources.
//!
//! # How Computed Values Work
//!
//! 1. At construction the combine function runs once over the sources'
//!    current values and seeds an internal signal. (`Computed::deferred`
//!    seeds with a placeholder instead and waits for the first change.)
//!
//! 2. One observer is registered on each source, in source order.
//!
//! 3. Whichever source fires, the observer re-reads *every* source, runs the
//!    combine function over that fresh snapshot, and writes the result into
//!    the internal signal. The internal signal's own equality policy decides
//!    whether its observers hear about it.
//!
//! Recomputation is eager and synchronous. Two sequential writes to sources
//! cause two recomputations; nothing is batched.
//!
//! # Ownership
//!
//! A Computed holds its sources by (shared) handle. Sources see the computed
//! value only through a weak reference captured in their observer, so there
//! is no reference cycle: dropping the last handle to a Computed releases it
//! and detaches its observers from every source.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::SignalConfig;

use super::equality::Equality;
use super::id::SubscriptionId;
use super::registry::Subscription;
use super::signal::{ReadSignal, Signal};
use super::source::{OnChange, Readable, Sources};

/// Type-erased recomputation node, so `Computed` is generic over its output
/// only.
trait Derive: Send + Sync {
    fn recompute(&self);

    fn recompute_count(&self) -> u64;

    fn source_count(&self) -> usize;
}

struct Node<S, R>
where
    S: Sources,
    R: Clone + Send + Sync + 'static,
{
    sources: S,
    combine: Box<dyn Fn(S::Values) -> R + Send + Sync>,
    output: Signal<R>,

    /// Observers registered on the sources, in source order.
    upstream: Mutex<Vec<Subscription>>,

    /// Number of times `combine` has run.
    recomputes: AtomicU64,
}

impl<S, R> Derive for Node<S, R>
where
    S: Sources,
    R: Clone + Send + Sync + 'static,
{
    fn recompute(&self) {
        let next = (self.combine)(self.sources.snapshot());
        let runs = self.recomputes.fetch_add(1, Ordering::Relaxed) + 1;
        let changed = self.output.set(next);
        debug!(computed = self.output.id(), runs, changed, "recomputed");
    }

    fn recompute_count(&self) -> u64 {
        self.recomputes.load(Ordering::Relaxed)
    }

    fn source_count(&self) -> usize {
        self.sources.count()
    }
}

impl<S, R> Drop for Node<S, R>
where
    S: Sources,
    R: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        for subscription in self.upstream.get_mut().drain(..) {
            subscription.unsubscribe();
        }
    }
}

/// A value derived from one or more sources.
///
/// # Example
///
/// ```rust
/// use pulse_core::reactive::{Computed, Signal};
///
/// let first = Signal::new("Ada".to_string());
/// let last = Signal::new("Lovelace".to_string());
///
/// let full = Computed::new((first.clone(), last.clone()), |(first, last)| {
///     format!("{first} {last}")
/// });
/// assert_eq!(full.get(), "Ada Lovelace");
///
/// last.set("Byron".to_string());
/// assert_eq!(full.get(), "Ada Byron");
/// ```
pub struct Computed<R>
where
    R: Clone + Send + Sync + 'static,
{
    output: Signal<R>,
    node: Arc<dyn Derive>,
}

impl<R> Computed<R>
where
    R: Clone + Send + Sync + PartialEq + 'static,
{
    /// Derive a value, computing it immediately. Downstream observers are
    /// only notified when the result changes by `PartialEq`.
    pub fn new<S, F>(sources: S, combine: F) -> Self
    where
        S: Sources,
        F: Fn(S::Values) -> R + Send + Sync + 'static,
    {
        Self::with_equality(sources, combine, Equality::partial_eq())
    }

    /// Derive a value without computing it yet.
    ///
    /// The computed value reads as `placeholder` until a source changes for
    /// the first time. If that first result equals the placeholder, observers
    /// are not notified.
    pub fn deferred<S, F>(sources: S, combine: F, placeholder: R) -> Self
    where
        S: Sources,
        F: Fn(S::Values) -> R + Send + Sync + 'static,
    {
        let output = Signal::with_equality(placeholder, Equality::partial_eq());
        Self::attach(sources, Box::new(combine), output, 0)
    }
}

impl<R> Computed<R>
where
    R: Clone + Send + Sync + 'static,
{
    /// Derive a value with an explicit equality policy for the result.
    pub fn with_equality<S, F>(sources: S, combine: F, equality: Equality<R>) -> Self
    where
        S: Sources,
        F: Fn(S::Values) -> R + Send + Sync + 'static,
    {
        Self::with_config(sources, combine, equality, SignalConfig::default())
    }

    /// Derive a value with an explicit equality policy and configuration for
    /// the internal signal.
    pub fn with_config<S, F>(
        sources: S,
        combine: F,
        equality: Equality<R>,
        config: SignalConfig,
    ) -> Self
    where
        S: Sources,
        F: Fn(S::Values) -> R + Send + Sync + 'static,
    {
        let initial = combine(sources.snapshot());
        let output = Signal::with_config(initial, equality, config);
        Self::attach(sources, Box::new(combine), output, 1)
    }

    fn attach<S>(
        sources: S,
        combine: Box<dyn Fn(S::Values) -> R + Send + Sync>,
        output: Signal<R>,
        recomputes: u64,
    ) -> Self
    where
        S: Sources,
    {
        let node = Arc::new(Node {
            sources,
            combine,
            output: output.clone(),
            upstream: Mutex::new(Vec::new()),
            recomputes: AtomicU64::new(recomputes),
        });

        let weak = Arc::downgrade(&node);
        let on_change: OnChange = Arc::new(move || {
            if let Some(node) = weak.upgrade() {
                node.recompute();
            }
        });
        *node.upstream.lock() = node.sources.watch(&on_change);

        debug!(
            computed = output.id(),
            sources = node.sources.count(),
            seeded = recomputes > 0,
            "computed attached"
        );

        Self { output, node }
    }

    /// The internal signal's ID.
    pub fn id(&self) -> u64 {
        self.output.id()
    }

    /// Get a clone of the current derived value.
    pub fn get(&self) -> R {
        self.output.get()
    }

    /// Borrow the current derived value without cloning it.
    pub fn with<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        self.output.with(f)
    }

    /// Register an observer called with every new derived value.
    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        self.output.observe(callback)
    }

    /// Register an observer and call it once with the current derived value.
    pub fn observe_now<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        self.output.observe_now(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.output.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.output.observer_count()
    }

    /// Number of times the combine function has run, including seeding.
    pub fn recompute_count(&self) -> u64 {
        self.node.recompute_count()
    }

    pub fn source_count(&self) -> usize {
        self.node.source_count()
    }

    /// A read-only view of the derived value.
    ///
    /// The view does not keep the derivation alive: once every `Computed`
    /// handle is dropped, the view keeps its last value but stops updating.
    pub fn read_only(&self) -> ReadSignal<R> {
        self.output.read_only()
    }
}

/// Derive a value from `sources`, computing it immediately.
pub fn computed<S, R, F>(combine: F, sources: S) -> Computed<R>
where
    S: Sources,
    R: Clone + Send + Sync + PartialEq + 'static,
    F: Fn(S::Values) -> R + Send + Sync + 'static,
{
    Computed::new(sources, combine)
}

impl<R> Readable for Computed<R>
where
    R: Clone + Send + Sync + 'static,
{
    type Value = R;

    fn read(&self) -> R {
        self.get()
    }

    fn watch(&self, on_change: OnChange) -> Subscription {
        self.output.subscribe(move |_| on_change(), false)
    }
}

impl<R> Clone for Computed<R>
where
    R: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            output: self.output.clone(),
            node: Arc::clone(&self.node),
        }
    }
}

impl<R> Debug for Computed<R>
where
    R: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id())
            .field("value", &self.get())
            .field("sources", &self.source_count())
            .field("recompute_count", &self.recompute_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
