//! Observer records.
//!
//! An observer is the `{id, callback}` pair a registry stores for each
//! subscription. Registering the same closure twice produces two observers
//! with different ids; they are tracked and removed independently.

use std::fmt;
use std::sync::Arc;

use super::id::SubscriptionId;

/// Shared callback invoked with the new value.
pub(crate) type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// One registered observer.
pub struct Observer<T> {
    id: SubscriptionId,
    callback: Callback<T>,
}

impl<T> Observer<T> {
    /// Wrap `callback` under the given id.
    pub fn new<F>(id: SubscriptionId, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            id,
            callback: Arc::new(callback),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Invoke the callback with `value`.
    pub fn notify(&self, value: &T) {
        (self.callback)(value);
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").field("id", &self.id).finish_non_exhaustive()
    }
}
