//! Subscription Registry
//!
//! Each signal owns one registry: an insertion-ordered map from
//! `SubscriptionId` to `Observer`. Removal is by id and keeps the relative
//! order of the remaining entries, so notification order is always
//! registration order.
//!
//! # Handles
//!
//! `observe` hands back a `Subscription`, which holds only a weak reference to
//! the registry. Unsubscribing through a handle whose signal is gone, or
//! unsubscribing twice, does nothing.
//!
//! A `SubscriptionGuard` is the RAII flavour: it unsubscribes when dropped.
//! Plain `Subscription`s never unsubscribe on their own, so an observer
//! registered with `let _ = signal.observe(..)` stays registered.

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;

use super::id::{IdGenerator, Sequence, SubscriptionId};
use super::observer::Observer;

/// Observers copied out of a registry for one notification pass.
pub(crate) type Snapshot<T> = SmallVec<[Observer<T>; 4]>;

/// Type-erased removal, so handles do not carry the value type.
pub(crate) trait Detach: Send + Sync {
    /// Remove the entry. Returns `false` if it was not present.
    fn detach(&self, id: SubscriptionId) -> bool;

    fn is_attached(&self, id: SubscriptionId) -> bool;
}

/// Ordered observer storage for one signal.
pub struct Registry<T> {
    ids: Box<dyn IdGenerator>,
    observers: Mutex<IndexMap<SubscriptionId, Observer<T>>>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::with_ids(Sequence::new())
    }

    /// A registry that takes its subscription ids from `ids`.
    pub fn with_ids(ids: impl IdGenerator + 'static) -> Self {
        Self {
            ids: Box::new(ids),
            observers: Mutex::new(IndexMap::new()),
        }
    }

    /// Append an observer at the end of the notification order.
    pub fn insert<F>(&self, callback: F) -> Observer<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let observer = Observer::new(self.ids.next_id(), callback);
        self.observers.lock().insert(observer.id(), observer.clone());
        observer
    }

    /// Remove the observer with `id`, keeping the order of the rest.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        self.observers.lock().shift_remove(&id).is_some()
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.observers.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.observers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.lock().is_empty()
    }

    /// Copy the current observers, in order. The lock is released before the
    /// caller runs any callback.
    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.observers.lock().values().cloned().collect()
    }
}

impl<T: 'static> Registry<T> {
    /// Build the handle for an observer registered here.
    pub(crate) fn handle(self: &Arc<Self>, id: SubscriptionId) -> Subscription {
        let registry: Weak<Self> = Arc::downgrade(self);
        Subscription { id, registry }
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Detach for Registry<T> {
    fn detach(&self, id: SubscriptionId) -> bool {
        let removed = self.remove(id);
        if removed {
            tracing::trace!(subscription = %id, "observer removed");
        }
        removed
    }

    fn is_attached(&self, id: SubscriptionId) -> bool {
        self.contains(id)
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("observers", &self.len()).finish()
    }
}

/// Capability to remove one observer registration.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the observer. Returns `true` only for the call that actually
    /// removed it; repeat calls and calls after the signal was dropped are
    /// no-ops returning `false`.
    pub fn unsubscribe(&self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.detach(self.id))
            .unwrap_or(false)
    }

    /// Whether the observer is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.is_attached(self.id))
            .unwrap_or(false)
    }

    /// Turn this handle into a guard that unsubscribes on drop.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard { subscription: self }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Unsubscribes its observer when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl SubscriptionGuard {
    pub fn id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<T>(registry: &Registry<T>) -> Vec<SubscriptionId> {
        registry.snapshot().iter().map(Observer::id).collect()
    }

    #[test]
    fn insert_keeps_registration_order() {
        let registry = Registry::<i32>::new();
        let a = registry.insert(|_| {}).id();
        let b = registry.insert(|_| {}).id();
        let c = registry.insert(|_| {}).id();

        assert_eq!(ids(&registry), vec![a, b, c]);
    }

    #[test]
    fn remove_preserves_order_of_the_rest() {
        let registry = Registry::<i32>::new();
        let a = registry.insert(|_| {}).id();
        let b = registry.insert(|_| {}).id();
        let c = registry.insert(|_| {}).id();

        assert!(registry.remove(b));
        assert_eq!(ids(&registry), vec![a, c]);
    }

    #[test]
    fn ids_come_from_the_injected_generator() {
        let registry = Registry::<i32>::with_ids(Sequence::starting_at(100));
        let a = registry.insert(|_| {}).id();
        let b = registry.insert(|_| {}).id();

        assert_eq!(a.as_u64(), 100);
        assert_eq!(b.as_u64(), 101);
    }

    #[test]
    fn removing_unknown_id_is_a_no_op() {
        let registry = Registry::<i32>::new();
        let a = registry.insert(|_| {}).id();

        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        assert!(registry.is_empty());
    }

    #[test]
    fn subscription_unsubscribe_is_idempotent() {
        let registry = Arc::new(Registry::<i32>::new());
        let id = registry.insert(|_| {}).id();
        let subscription = registry.handle(id);

        assert!(subscription.is_active());
        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());
        assert!(!subscription.is_active());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn subscription_outliving_registry() {
        let registry = Arc::new(Registry::<i32>::new());
        let id = registry.insert(|_| {}).id();
        let subscription = registry.handle(id);

        drop(registry);
        assert!(!subscription.is_active());
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn guard_unsubscribes_on_drop() {
        let registry = Arc::new(Registry::<i32>::new());
        let id = registry.insert(|_| {}).id();

        {
            let guard = registry.handle(id).guard();
            assert_eq!(guard.id(), id);
            assert_eq!(registry.len(), 1);
        }

        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let registry = Registry::<i32>::new();
        let a = registry.insert(|_| {}).id();
        let snapshot = registry.snapshot();

        let b = registry.insert(|_| {}).id();
        registry.remove(a);

        assert_eq!(snapshot.iter().map(Observer::id).collect::<Vec<_>>(), vec![a]);
        assert_eq!(ids(&registry), vec![b]);
    }
}
