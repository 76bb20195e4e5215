//! Subscriber types for the reactive system.
//!
//! A Subscriber is any evaluation that reads reactive properties and must be
//! replayed when those properties change: a watcher, a view binding, a
//! derived computation owned by some other layer.

use std::sync::atomic::{AtomicU64, Ordering};

use super::Dep;
use crate::error::Result;

/// Unique identifier for a subscriber.
///
/// Subscribers are free to use this for bookkeeping and log output. The core
/// itself compares subscribers by pointer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// The contract an evaluation must implement to be tracked by the core.
///
/// Dependencies only hold weak references to subscribers; keeping a
/// subscriber alive is the implementor's job.
pub trait Subscriber {
    /// React to a change in one of the properties this subscriber read.
    ///
    /// Called synchronously from [`Dep::notify`]. It may write reactive
    /// properties, which re-enters `notify` on other dependencies.
    fn update(&self) -> Result<()>;

    /// Record that this subscriber depends on `dep`.
    ///
    /// Called from [`Dep::depend`] while this subscriber is the active one.
    /// Implementations are expected to call `dep.add_sub(..)` with
    /// themselves; the core never does that on their behalf.
    fn add_dep(&self, dep: &Dep);
}
