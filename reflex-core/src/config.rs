//! Observation Policies
//!
//! A handful of behaviors of the reactive core are choices rather than
//! facts: what happens when the same subscriber registers twice, whether a
//! failing subscriber stops the rest of a notification pass, and how cyclic
//! or very deep data is treated. [`ReactiveConfig`] gathers those choices.
//!
//! The config can be built in code or loaded from JSON:
//!
//! ```rust
//! use reflex_core::config::{ReactiveConfig, FailurePolicy};
//!
//! let config = ReactiveConfig::from_json(r#"{ "failures": "continue" }"#).unwrap();
//! assert_eq!(config.failures, FailurePolicy::Continue);
//! assert_eq!(config.max_depth, 256);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default nesting limit for observed values.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// What a dependency does when a subscriber it already holds is added again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep every registration. A subscriber added twice is updated twice.
    #[default]
    Allow,
    /// Drop a registration whose subscriber is already present.
    Ignore,
}

/// What a dependency does when a subscriber's update fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Propagate the first failure. Later subscribers are not updated.
    #[default]
    Abort,
    /// Update every subscriber, then report all failures together.
    Continue,
}

/// How observation treats a composite value that reaches itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Fail with `CyclicStructure` before anything is instrumented.
    #[default]
    Reject,
    /// Instrument each object once; back-edges share the existing observer.
    Share,
}

/// Policies applied by [`observe_with`](crate::observer::observe_with) and
/// inherited by every dependency it creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveConfig {
    /// Maximum nesting depth of a value being observed.
    pub max_depth: usize,
    pub duplicates: DuplicatePolicy,
    pub failures: FailurePolicy,
    pub cycles: CyclePolicy,
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            duplicates: DuplicatePolicy::default(),
            failures: FailurePolicy::default(),
            cycles: CyclePolicy::default(),
        }
    }
}

impl ReactiveConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_failures(mut self, policy: FailurePolicy) -> Self {
        self.failures = policy;
        self
    }

    pub fn with_cycles(mut self, policy: CyclePolicy) -> Self {
        self.cycles = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;

    #[test]
    fn defaults_are_faithful() {
        let config = ReactiveConfig::default();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.duplicates, DuplicatePolicy::Allow);
        assert_eq!(config.failures, FailurePolicy::Abort);
        assert_eq!(config.cycles, CyclePolicy::Reject);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ReactiveConfig::from_json(r#"{"duplicates": "ignore", "max_depth": 8}"#)
            .unwrap();
        assert_eq!(config.duplicates, DuplicatePolicy::Ignore);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.cycles, CyclePolicy::Reject);
    }

    #[test]
    fn json_round_trip() {
        let config = ReactiveConfig::default()
            .with_cycles(CyclePolicy::Share)
            .with_failures(FailurePolicy::Continue);
        let json = config.to_json().unwrap();
        assert_eq!(ReactiveConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = ReactiveConfig::from_json(r#"{"cycles": "explode"}"#).unwrap_err();
        assert!(matches!(err, ReactiveError::Config(_)));
    }
}
