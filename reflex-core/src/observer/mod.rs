//! Observation
//!
//! This module turns plain [`Object`]s into reactive ones. [`observe`] is
//! the entry point: given any value, it instruments every field of every
//! object reachable from it, nested objects first.
//!
//! # What Observation Does
//!
//! For each own key of an object, in enumeration order, a property cell is
//! installed (see [`define_reactive`]). From then on:
//!
//! - [`Object::get`] on that key hands the key's dependency to the active
//!   subscriber, if any.
//! - [`Object::set`] on that key with a new value observes the new value and
//!   notifies every subscriber collected so far.
//!
//! # Idempotency
//!
//! Every observed object carries a mark. Observing it again returns the
//! existing [`ReactiveObject`] instead of installing a second set of cells,
//! so data shared between several parents is instrumented exactly once.
//!
//! # Failure
//!
//! The whole value is planned before the first cell is installed. Cycles
//! (under [`CyclePolicy::Reject`](crate::config::CyclePolicy)), excessive
//! depth, and keys that already have a cell are reported without touching
//! the data.

mod cell;
mod plan;

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::config::ReactiveConfig;
use crate::error::Result;
use crate::reactive::Dep;
use crate::value::{Object, Value};

pub use cell::define_reactive;
pub(crate) use cell::{write, Slot};

/// Unique identifier for an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ob#{}", self.0)
    }
}

/// The mark an observed object carries.
///
/// It holds no reference back to the object, so marking does not create an
/// ownership cycle.
#[derive(Clone)]
pub(crate) struct ObserverMark {
    id: ObserverId,
    config: Rc<ReactiveConfig>,
}

/// Handle to an observed object.
#[derive(Clone)]
pub struct ReactiveObject {
    id: ObserverId,
    object: Object,
    config: Rc<ReactiveConfig>,
}

impl ReactiveObject {
    pub(crate) fn from_mark(object: Object, mark: ObserverMark) -> Self {
        Self {
            id: mark.id,
            object,
            config: mark.config,
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// The instrumented object.
    pub fn object(&self) -> &Object {
        &self.object
    }

    /// The policies this object was observed with.
    pub fn config(&self) -> &ReactiveConfig {
        &self.config
    }

    pub(crate) fn shared_config(&self) -> Rc<ReactiveConfig> {
        Rc::clone(&self.config)
    }

    /// The dependency behind `key`, if that key is reactive.
    pub fn dep(&self, key: &str) -> Option<Dep> {
        self.object.dep(key)
    }

    /// Observer of the composite value currently stored under `key`.
    pub fn child(&self, key: &str) -> Option<ReactiveObject> {
        match self.object.data().slots.get(key)? {
            Slot::Reactive(cell) => cell.child().cloned(),
            Slot::Plain(_) => None,
        }
    }

    /// Number of reactive fields.
    pub fn cell_count(&self) -> usize {
        self.object
            .data()
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Reactive(_)))
            .count()
    }
}

impl PartialEq for ReactiveObject {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveObject")
            .field("id", &self.id)
            .field("object", &self.object)
            .finish()
    }
}

/// Observe `value` with the default policies.
///
/// Returns `Ok(None)` for primitives and null, which stay plain.
///
/// Observing an object that is already observed is deliberately not an
/// error: the existing [`ReactiveObject`] is returned and no cell is
/// reinstalled. Only [`define_reactive`] on an instrumented key fails.
pub fn observe(value: &Value) -> Result<Option<ReactiveObject>> {
    observe_with(value, &ReactiveConfig::default())
}

/// Observe `value` with the given policies.
///
/// Nested objects observed along the way inherit `config`; objects that
/// were already observed keep the policies they were observed with.
pub fn observe_with(value: &Value, config: &ReactiveConfig) -> Result<Option<ReactiveObject>> {
    observe_shared(value, &Rc::new(config.clone()))
}

pub(crate) fn observe_shared(
    value: &Value,
    config: &Rc<ReactiveConfig>,
) -> Result<Option<ReactiveObject>> {
    let Value::Object(root) = value else {
        return Ok(None);
    };
    if let Some(existing) = root.observer() {
        return Ok(Some(existing));
    }

    let plan = plan::plan(root, config)?;

    // Mark everything first so back-edges resolve to the mark instead of
    // starting a second observation.
    for object in &plan {
        object.data_mut().observer = Some(ObserverMark {
            id: ObserverId::next(),
            config: Rc::clone(config),
        });
    }

    for object in &plan {
        walk(object, config)?;
    }

    debug!(objects = plan.len(), "value observed");
    Ok(root.observer())
}

/// Install a cell for every own key of `object`.
fn walk(object: &Object, config: &Rc<ReactiveConfig>) -> Result<()> {
    for (key, value) in object.entries_untracked() {
        cell::install(object, &key, value, config)?;
    }
    Ok(())
}
