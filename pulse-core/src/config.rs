//! Per-signal configuration.
//!
//! `SignalConfig` is plain data. It derives serde traits so a host can keep
//! signal settings in its own configuration files; every field is optional
//! when deserializing and falls back to the default.

use serde::{Deserialize, Serialize};

/// Options fixed when a signal (or computed value) is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Call every new observer once with the current value as soon as it is
    /// registered. The initial call ignores the equality policy and is not a
    /// change for anyone else.
    pub emit_initial: bool,

    /// Run each observer under `catch_unwind`. A panicking observer is logged
    /// and the pass continues with the next observer instead of unwinding
    /// into the caller of `set`.
    pub isolate_observers: bool,
}

impl SignalConfig {
    /// The default configuration: no initial emit, panics propagate.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emit_initial(mut self, emit_initial: bool) -> Self {
        self.emit_initial = emit_initial;
        self
    }

    pub fn with_isolated_observers(mut self, isolate: bool) -> Self {
        self.isolate_observers = isolate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_quiet_and_propagating() {
        let config = SignalConfig::default();
        assert!(!config.emit_initial);
        assert!(!config.isolate_observers);
    }

    #[test]
    fn builder_sets_fields() {
        let config = SignalConfig::new()
            .with_emit_initial(true)
            .with_isolated_observers(true);
        assert!(config.emit_initial);
        assert!(config.isolate_observers);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let config: SignalConfig = serde_json::from_str(r#"{ "emit_initial": true }"#).unwrap();
        assert_eq!(config, SignalConfig::new().with_emit_initial(true));

        let config: SignalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SignalConfig::default());
    }

    #[test]
    fn serializes_all_fields() {
        let json = serde_json::to_value(SignalConfig::new().with_isolated_observers(true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "emit_initial": false, "isolate_observers": true })
        );
    }
}
