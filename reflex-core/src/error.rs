//! Error types for the reactive core.
//!
//! Plain reads outside an evaluation and writes of an unchanged value are
//! not errors. Everything else that can go wrong while instrumenting data or
//! replaying subscribers is reported through [`ReactiveError`].

use thiserror::Error;

use crate::reactive::DepId;

/// Errors produced by observation, property writes, and notification.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// The key already carries an installed property cell.
    ///
    /// Overwriting it would orphan the subscribers of the existing dependency.
    #[error("property `{key}` is already reactive")]
    AlreadyReactive { key: String },

    /// A composite value reaches itself while being observed.
    #[error("cyclic structure detected at property `{key}`")]
    CyclicStructure { key: String },

    /// A composite value nests deeper than the configured limit.
    #[error("nesting exceeds the maximum observation depth of {limit}")]
    DepthExceeded { limit: usize },

    /// A subscriber's update callback failed.
    #[error("subscriber update failed: {reason}")]
    UpdateFailed { reason: String },

    /// One or more subscribers failed while a dependency was notifying.
    ///
    /// Only produced under [`FailurePolicy::Continue`](crate::config::FailurePolicy).
    #[error("{} subscriber(s) failed while notifying dependency {dep}", failures.len())]
    NotifyFailed {
        dep: DepId,
        failures: Vec<ReactiveError>,
    },

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ReactiveError {
    /// Build a [`ReactiveError::UpdateFailed`] from any displayable reason.
    pub fn update_failed(reason: impl Into<String>) -> Self {
        Self::UpdateFailed {
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_property() {
        let err = ReactiveError::AlreadyReactive { key: "count".into() };
        assert_eq!(err.to_string(), "property `count` is already reactive");

        let err = ReactiveError::CyclicStructure { key: "parent".into() };
        assert!(err.to_string().contains("`parent`"));
    }

    #[test]
    fn notify_failure_counts_failures() {
        let err = ReactiveError::NotifyFailed {
            dep: DepId::from(7),
            failures: vec![
                ReactiveError::update_failed("a"),
                ReactiveError::update_failed("b"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 subscriber(s) failed while notifying dependency dep#7"
        );
    }

    #[test]
    fn config_errors_convert() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ReactiveError = parse.into();
        assert!(matches!(err, ReactiveError::Config(_)));
    }
}
