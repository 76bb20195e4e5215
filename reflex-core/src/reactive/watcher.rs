//! Watcher Implementation
//!
//! A Watcher is a ready-made [`Subscriber`]: it evaluates a getter, records
//! every dependency the getter read, and calls back when the getter's
//! result changes.
//!
//! # How Watchers Work
//!
//! 1. When created, the watcher runs its getter inside its own reactive
//!    context to collect initial dependencies and remember the result.
//!
//! 2. When any collected dependency notifies, the watcher re-runs the getter
//!    (collecting any new dependencies along the way).
//!
//! 3. If the new result is not the same as the old one, or is an object
//!    (whose fields may have changed in place), the callback receives
//!    `(new, old)`.
//!
//! # Deduplication
//!
//! A getter that reads the same property twice still registers once: the
//! watcher remembers the IDs of the dependencies it has joined.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::context::ReactiveContext;
use super::{Dep, DepId, Subscriber, SubscriberId};
use crate::error::Result;
use crate::value::{Object, Value};

type Getter = Box<dyn Fn() -> Value>;
type Callback = Box<dyn Fn(&Value, &Value) -> Result<()>>;

/// A subscriber that re-evaluates a getter and reports changes.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use reflex_core::{observe, Object, Watcher};
///
/// let data = Object::new().with("count", 1);
/// observe(&data.clone().into()).unwrap();
///
/// let seen = Rc::new(Cell::new(0.0));
/// let sink = seen.clone();
/// let _watcher = Watcher::path(&data, "count", move |new, _old| {
///     sink.set(new.as_f64().unwrap_or_default());
///     Ok(())
/// });
///
/// data.set("count", 5).unwrap();
/// assert_eq!(seen.get(), 5.0);
/// ```
pub struct Watcher {
    id: SubscriberId,
    this: Weak<Watcher>,
    getter: Getter,
    callback: Callback,
    value: RefCell<Value>,
    deps: RefCell<Vec<Dep>>,
    dep_ids: RefCell<HashSet<DepId>>,
    active: Cell<bool>,
    run_count: Cell<usize>,
}

impl Watcher {
    /// Create a watcher and run its getter once.
    pub fn new<G, C>(getter: G, callback: C) -> Rc<Self>
    where
        G: Fn() -> Value + 'static,
        C: Fn(&Value, &Value) -> Result<()> + 'static,
    {
        let watcher = Rc::new_cyclic(|this| Self {
            id: SubscriberId::new(),
            this: this.clone(),
            getter: Box::new(getter),
            callback: Box::new(callback),
            value: RefCell::new(Value::Null),
            deps: RefCell::new(Vec::new()),
            dep_ids: RefCell::new(HashSet::new()),
            active: Cell::new(true),
            run_count: Cell::new(0),
        });

        let initial = watcher.evaluate();
        *watcher.value.borrow_mut() = initial;
        watcher
    }

    /// Watch a dotted path such as `"user.name"` on `object`.
    ///
    /// A missing path evaluates to [`Value::Null`].
    pub fn path<C>(object: &Object, path: &str, callback: C) -> Rc<Self>
    where
        C: Fn(&Value, &Value) -> Result<()> + 'static,
    {
        let object = object.clone();
        let path = path.to_owned();
        Self::new(move || object.get_path(&path).unwrap_or_default(), callback)
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// The getter's most recent result.
    pub fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    /// How many times the getter has been evaluated.
    pub fn run_count(&self) -> usize {
        self.run_count.get()
    }

    /// Number of distinct dependencies joined so far.
    pub fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Re-evaluate the getter and call back if the result changed.
    pub fn run(&self) -> Result<()> {
        if !self.active.get() {
            return Ok(());
        }

        let new = self.evaluate();
        let old = self.value.replace(new.clone());
        if !new.is_same(&old) || new.is_composite() {
            trace!(watcher = %self.id, "value changed");
            (self.callback)(&new, &old)?;
        }
        Ok(())
    }

    /// Leave every dependency and stop reacting.
    pub fn teardown(&self) {
        self.active.set(false);
        let deps = self.deps.take();
        self.dep_ids.borrow_mut().clear();

        if let Some(this) = self.as_subscriber() {
            for dep in &deps {
                dep.remove_sub(&this);
            }
        }
    }

    fn evaluate(&self) -> Value {
        self.run_count.set(self.run_count.get() + 1);
        match self.as_subscriber() {
            Some(this) => {
                let _ctx = ReactiveContext::enter(this);
                (self.getter)()
            }
            None => (self.getter)(),
        }
    }

    fn as_subscriber(&self) -> Option<Rc<dyn Subscriber>> {
        self.this.upgrade().map(|this| this as Rc<dyn Subscriber>)
    }
}

impl Subscriber for Watcher {
    fn update(&self) -> Result<()> {
        self.run()
    }

    fn add_dep(&self, dep: &Dep) {
        if !self.active.get() || !self.dep_ids.borrow_mut().insert(dep.id()) {
            return;
        }
        if let Some(this) = self.as_subscriber() {
            dep.add_sub(&this);
        }
        self.deps.borrow_mut().push(dep.clone());
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("run_count", &self.run_count())
            .field("dep_count", &self.dep_count())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;
    use crate::observer::observe;

    fn observed(object: Object) -> Object {
        observe(&object.clone().into()).unwrap();
        object
    }

    fn counter() -> (Rc<Cell<usize>>, impl Fn(&Value, &Value) -> Result<()>) {
        let calls = Rc::new(Cell::new(0));
        let sink = calls.clone();
        (calls, move |_: &Value, _: &Value| {
            sink.set(sink.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn watcher_runs_on_creation() {
        let data = observed(Object::new().with("a", 1));
        let (calls, callback) = counter();
        let watcher = Watcher::path(&data, "a", callback);

        assert_eq!(watcher.run_count(), 1);
        assert_eq!(watcher.value(), Value::from(1));
        assert_eq!(watcher.dep_count(), 1);
        // The callback only fires on changes
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn watcher_reacts_to_writes() {
        let data = observed(Object::new().with("a", 1));
        let old_seen = Rc::new(RefCell::new(Value::Null));
        let sink = old_seen.clone();
        let watcher = Watcher::path(&data, "a", move |_, old| {
            *sink.borrow_mut() = old.clone();
            Ok(())
        });

        data.set("a", 2).unwrap();
        assert_eq!(watcher.value(), Value::from(2));
        assert_eq!(*old_seen.borrow(), Value::from(1));
    }

    #[test]
    fn repeated_reads_register_once() {
        let data = observed(Object::new().with("a", 1));
        let getter_data = data.clone();
        let (calls, callback) = counter();
        let watcher = Watcher::new(
            move || {
                let first = getter_data.get("a").unwrap_or_default();
                let _second = getter_data.get("a");
                first
            },
            callback,
        );

        assert_eq!(watcher.dep_count(), 1);
        assert_eq!(data.dep("a").unwrap().subscriber_count(), 1);

        data.set("a", 2).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unchanged_result_skips_callback() {
        let data = observed(Object::new().with("a", 1).with("b", 1));
        let getter_data = data.clone();
        let (calls, callback) = counter();
        let watcher = Watcher::new(
            move || {
                let a = getter_data.get("a").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let b = getter_data.get("b").and_then(|v| v.as_f64()).unwrap_or(0.0);
                Value::from(a.min(b))
            },
            callback,
        );

        // min(5, 1) is still 1
        data.set("a", 5).unwrap();
        assert_eq!(watcher.run_count(), 2);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn teardown_leaves_every_dep() {
        let data = observed(Object::new().with("a", 1));
        let (calls, callback) = counter();
        let watcher = Watcher::path(&data, "a", callback);

        watcher.teardown();
        assert!(!watcher.is_active());
        assert_eq!(data.dep("a").unwrap().subscriber_count(), 0);

        data.set("a", 2).unwrap();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn dropped_watcher_stops_reacting() {
        let data = observed(Object::new().with("a", 1));
        let (calls, callback) = counter();
        let watcher = Watcher::path(&data, "a", callback);
        drop(watcher);

        data.set("a", 2).unwrap();
        assert_eq!(calls.get(), 0);
        assert_eq!(data.dep("a").unwrap().subscriber_count(), 0);
    }

    #[test]
    fn callback_failure_propagates_from_write() {
        let data = observed(Object::new().with("a", 1));
        let _watcher = Watcher::path(&data, "a", |_, _| {
            Err(ReactiveError::update_failed("render failed"))
        });

        let err = data.set("a", 2).unwrap_err();
        assert!(matches!(err, ReactiveError::UpdateFailed { reason } if reason == "render failed"));
        // The write itself was committed before notification
        assert_eq!(data.get_untracked("a"), Some(Value::from(2)));
    }

    #[test]
    fn nested_watchers_register_against_their_own_context() {
        let data = observed(Object::new().with("outer", 1).with("inner", 1));

        let inner_data = data.clone();
        let inner_holder: Rc<RefCell<Option<Rc<Watcher>>>> = Rc::new(RefCell::new(None));
        let holder = inner_holder.clone();
        let outer_data = data.clone();

        let outer = Watcher::new(
            move || {
                if holder.borrow().is_none() {
                    let watcher = Watcher::path(&inner_data, "inner", |_, _| Ok(()));
                    *holder.borrow_mut() = Some(watcher);
                }
                outer_data.get("outer").unwrap_or_default()
            },
            |_, _| Ok(()),
        );

        // The outer read happened after the inner watcher finished evaluating
        let outer_dep = data.dep("outer").unwrap();
        let inner_dep = data.dep("inner").unwrap();
        assert_eq!(outer.dep_count(), 1);
        assert_eq!(outer_dep.subscriber_count(), 1);
        assert_eq!(inner_dep.subscriber_count(), 1);
        assert_eq!(inner_holder.borrow().as_ref().unwrap().dep_count(), 1);
    }
}
