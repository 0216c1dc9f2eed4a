//! Equality policies.
//!
//! A signal asks its policy whether `(new, current)` are equal before it
//! commits a write. Equal writes are dropped: no mutation and no
//! notifications.
//!
//! | Policy | Change when |
//! |---|---|
//! | `partial_eq` (default) | `new != current` |
//! | `identity` | the two `Arc`s point at different allocations |
//! | `never` | always |
//! | `by(f)` | `!f(new, current)` |
//!
//! `identity` has the usual limitation of reference equality: two `Arc`s with
//! equal contents but separate allocations count as a change.

use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a write is a change.
pub struct Equality<T>(Arc<dyn Fn(&T, &T) -> bool + Send + Sync>);

impl<T: 'static> Equality<T> {
    /// Use a custom predicate. `f(new, current)` returns `true` when the
    /// values should be treated as equal.
    pub fn by<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Treat every write as a change.
    pub fn never() -> Self {
        Self::by(|_, _| false)
    }
}

impl<T: PartialEq + 'static> Equality<T> {
    /// Compare with `PartialEq`.
    pub fn partial_eq() -> Self {
        Self::by(|new, current| new == current)
    }
}

impl<U: ?Sized + 'static> Equality<Arc<U>> {
    /// Compare by allocation rather than contents.
    pub fn identity() -> Self {
        Self::by(|new, current| Arc::ptr_eq(new, current))
    }
}

impl<T> Equality<T> {
    pub fn is_equal(&self, new: &T, current: &T) -> bool {
        (self.0)(new, current)
    }
}

impl<T> Clone for Equality<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: PartialEq + 'static> Default for Equality<T> {
    fn default() -> Self {
        Self::partial_eq()
    }
}

impl<T> fmt::Debug for Equality<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Equality(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_eq_compares_values() {
        let eq = Equality::<i32>::partial_eq();
        assert!(eq.is_equal(&1, &1));
        assert!(!eq.is_equal(&1, &2));
    }

    #[test]
    fn identity_compares_allocations() {
        let eq = Equality::<Vec<i32>>::default();
        assert!(eq.is_equal(&vec![1, 2], &vec![1, 2]));

        let eq = Equality::<Arc<Vec<i32>>>::identity();
        let a = Arc::new(vec![1, 2]);
        let b = Arc::new(vec![1, 2]);
        assert!(eq.is_equal(&a, &a.clone()));
        assert!(!eq.is_equal(&a, &b));
    }

    #[test]
    fn never_reports_equal() {
        let eq = Equality::<i32>::never();
        assert!(!eq.is_equal(&1, &1));
    }

    #[test]
    fn custom_predicate() {
        let eq = Equality::<String>::by(|a, b| a.eq_ignore_ascii_case(b));
        assert!(eq.is_equal(&"Hello".to_string(), &"hello".to_string()));
        assert!(!eq.is_equal(&"Hello".to_string(), &"world".to_string()));
    }
}
