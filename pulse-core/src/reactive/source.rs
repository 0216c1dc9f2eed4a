//! Upstream sources for computed values.
//!
//! `Readable` is anything a computed value can depend on: a `Signal`, a
//! `ReadSignal` or another `Computed`. `Sources` is the ordered list of
//! dependencies a computed value is built from. It comes in two shapes:
//!
//! - tuples of up to eight readables with different value types; the
//!   combine function receives a tuple of values in the same positions
//! - `Vec<S>` or `[S; N]` of one readable type; the combine function
//!   receives a `Vec` of values in source order

use std::sync::Arc;

use super::registry::Subscription;
use super::signal::{ReadSignal, Signal};

/// Change hook shared by every upstream observer of one computed value.
pub type OnChange = Arc<dyn Fn() + Send + Sync>;

/// A value that can be read and watched for changes.
pub trait Readable: Clone + Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;

    /// The current value.
    fn read(&self) -> Self::Value;

    /// Call `on_change` after every committed change. Never emits the
    /// current value on registration.
    fn watch(&self, on_change: OnChange) -> Subscription;
}

impl<T> Readable for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Value = T;

    fn read(&self) -> T {
        self.get()
    }

    fn watch(&self, on_change: OnChange) -> Subscription {
        self.subscribe(move |_| on_change(), false)
    }
}

impl<T> Readable for ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Value = T;

    fn read(&self) -> T {
        self.get()
    }

    fn watch(&self, on_change: OnChange) -> Subscription {
        self.subscribe(move |_| on_change(), false)
    }
}

/// An ordered, fixed set of dependencies.
pub trait Sources: Send + Sync + 'static {
    /// Snapshot of every source's value, in source order.
    type Values;

    fn snapshot(&self) -> Self::Values;

    /// Register `on_change` with every source, in source order.
    fn watch(&self, on_change: &OnChange) -> Vec<Subscription>;

    /// Number of sources.
    fn count(&self) -> usize;
}

macro_rules! tuple_sources {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Readable),+> Sources for ($($name,)+) {
            type Values = ($($name::Value,)+);

            fn snapshot(&self) -> Self::Values {
                ($(self.$idx.read(),)+)
            }

            fn watch(&self, on_change: &OnChange) -> Vec<Subscription> {
                vec![$(self.$idx.watch(Arc::clone(on_change))),+]
            }

            fn count(&self) -> usize {
                [$($idx),+].len()
            }
        }
    };
}

tuple_sources!(A: 0);
tuple_sources!(A: 0, B: 1);
tuple_sources!(A: 0, B: 1, C: 2);
tuple_sources!(A: 0, B: 1, C: 2, D: 3);
tuple_sources!(A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_sources!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
tuple_sources!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
tuple_sources!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

impl<S: Readable> Sources for Vec<S> {
    type Values = Vec<S::Value>;

    fn snapshot(&self) -> Self::Values {
        self.iter().map(Readable::read).collect()
    }

    fn watch(&self, on_change: &OnChange) -> Vec<Subscription> {
        self.iter()
            .map(|source| source.watch(Arc::clone(on_change)))
            .collect()
    }

    fn count(&self) -> usize {
        self.len()
    }
}

impl<S: Readable, const N: usize> Sources for [S; N] {
    type Values = Vec<S::Value>;

    fn snapshot(&self) -> Self::Values {
        self.iter().map(Readable::read).collect()
    }

    fn watch(&self, on_change: &OnChange) -> Vec<Subscription> {
        self.iter()
            .map(|source| source.watch(Arc::clone(on_change)))
            .collect()
    }

    fn count(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn counter() -> (Arc<AtomicI32>, OnChange) {
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        let on_change: OnChange = Arc::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, on_change)
    }

    #[test]
    fn tuple_snapshot_keeps_positions_and_types() {
        let sources = (Signal::new(1), Signal::new("two".to_string()), Signal::new(3.0));
        assert_eq!(sources.snapshot(), (1, "two".to_string(), 3.0));
        assert_eq!(sources.count(), 3);
    }

    #[test]
    fn vec_and_array_snapshots() {
        let a = Signal::new(1);
        let b = Signal::new(2);

        assert_eq!(vec![a.clone(), b.clone()].snapshot(), vec![1, 2]);
        assert_eq!([a, b].snapshot(), vec![1, 2]);
    }

    #[test]
    fn watch_registers_one_observer_per_source() {
        let a = Signal::new(1);
        let b = Signal::new(2);
        let (count, on_change) = counter();

        let subscriptions = (a.clone(), b.read_only()).watch(&on_change);
        assert_eq!(subscriptions.len(), 2);
        assert_eq!(a.observer_count(), 1);
        assert_eq!(b.observer_count(), 1);

        a.set(10);
        b.set(20);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        for subscription in &subscriptions {
            subscription.unsubscribe();
        }
        a.set(11);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn watch_ignores_emit_initial() {
        use crate::config::SignalConfig;
        use crate::reactive::Equality;

        let signal = Signal::with_config(
            1,
            Equality::partial_eq(),
            SignalConfig::new().with_emit_initial(true),
        );
        let (count, on_change) = counter();

        let _subscriptions = vec![signal].watch(&on_change);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
