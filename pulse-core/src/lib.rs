//! Pulse Core
//!
//! This crate provides a small, synchronous reactive-state engine:
//!
//! - Signals: a single value plus an ordered list of observers
//! - Computed values: signals derived from one or more upstream sources
//! - Pluggable equality policies that decide what counts as a change
//!
//! Everything runs on the caller's thread. `Signal::set` returns only after
//! every transitively dependent observer (including chains of computed
//! values) has run.
//!
//! # Architecture
//!
//! - `reactive`: signals, computed values, the subscription registry and the
//!   per-thread dispatch guard
//! - `config`: per-signal configuration
//! - `error`: the error type surfaced by fallible propagation
//!
//! # Example
//!
//! ```rust
//! use pulse_core::reactive::{Computed, Signal};
//!
//! let a = Signal::new(1);
//! let b = Signal::new(2);
//!
//! let sum = Computed::new((a.clone(), b.clone()), |(a, b)| a + b);
//! assert_eq!(sum.get(), 3);
//!
//! sum.observe(|value| println!("sum is now {value}"));
//!
//! a.set(5);
//! // Prints: "sum is now 7"
//! assert_eq!(sum.get(), 7);
//! ```

pub mod config;
pub mod error;
pub mod reactive;

pub use config::SignalConfig;
pub use error::{Result, SignalError};
