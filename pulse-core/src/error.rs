//! Error types for signal propagation.
//!
//! Notification passes are infallible by default: an observer that panics
//! unwinds straight through `Signal::set`. The variants here are produced by
//! the fallible entry points (`Signal::try_set`) and by the depth guard.

use std::any::Any;

use thiserror::Error;

/// Errors surfaced while propagating a change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// An observer or combine function panicked during a notification pass.
    ///
    /// Observers after the failing one did not run for that pass.
    #[error("observer panicked during notification: {message}")]
    ObserverPanicked {
        /// The panic payload, rendered as text.
        message: String,
    },

    /// Propagation nested deeper than the per-thread limit.
    #[error("propagation depth {depth} exceeds the limit of {limit}")]
    DepthExceeded {
        /// Depth the rejected pass would have run at.
        depth: usize,
        /// Limit in force on the current thread.
        limit: usize,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SignalError>;

impl SignalError {
    /// Convert a payload caught by `catch_unwind` into an error.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        match payload.downcast::<SignalError>() {
            Ok(err) => *err,
            Err(payload) => Self::ObserverPanicked {
                message: panic_message(&*payload),
            },
        }
    }
}

/// Render a panic payload for logs and error messages.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(err) = payload.downcast_ref::<SignalError>() {
        err.to_string()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
