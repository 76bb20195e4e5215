//! Dependency Registry
//!
//! A [`Dep`] is the per-property list of subscribers. Reading a reactive
//! property calls [`Dep::depend`], writing one calls [`Dep::notify`].
//!
//! # Ownership
//!
//! The property cell owns its `Dep`. The `Dep` holds only weak references to
//! subscribers, so a subscriber dropped by its owner simply stops receiving
//! updates; dead entries are pruned at the end of the next notification
//! pass. [`Dep::remove_sub`] is the explicit way to unsubscribe.
//!
//! # Ordering
//!
//! Subscribers are updated in registration order, synchronously, before
//! `notify` returns. The pass walks the registrations present when it
//! started: a subscriber added by an `update` waits for the next pass, and
//! one removed by an `update` is skipped if its turn has not come yet.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use tracing::{trace, warn};

use super::context::ReactiveContext;
use super::Subscriber;
use crate::config::{DuplicatePolicy, FailurePolicy, ReactiveConfig};
use crate::error::{ReactiveError, Result};

/// Counter for generating dependency IDs.
static DEP_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-unique dependency identifier.
///
/// IDs increase monotonically in creation order across the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepId(u64);

impl DepId {
    fn next() -> Self {
        Self(DEP_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DepId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dep#{}", self.0)
    }
}

/// One entry in the subscriber list. `seq` tells apart repeated
/// registrations of the same subscriber.
#[derive(Clone)]
struct Registration {
    seq: u64,
    subscriber: Weak<dyn Subscriber>,
}

type SubscriberList = SmallVec<[Registration; 4]>;

struct DepInner {
    id: DepId,
    duplicates: DuplicatePolicy,
    failures: FailurePolicy,
    next_seq: Cell<u64>,
    subs: RefCell<SubscriberList>,
}

/// Registry of the subscribers that depend on one reactive property.
///
/// Cloning a `Dep` yields another handle to the same registry.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

impl Dep {
    /// Create a dependency with the default policies.
    pub fn new() -> Self {
        Self::with_config(&ReactiveConfig::default())
    }

    /// Create a dependency that follows the policies in `config`.
    pub fn with_config(config: &ReactiveConfig) -> Self {
        Self {
            inner: Rc::new(DepInner {
                id: DepId::next(),
                duplicates: config.duplicates,
                failures: config.failures,
                next_seq: Cell::new(0),
                subs: RefCell::new(SmallVec::new()),
            }),
        }
    }

    /// Get the dependency's unique ID.
    pub fn id(&self) -> DepId {
        self.inner.id
    }

    /// Append a subscriber to the notification list.
    ///
    /// Under [`DuplicatePolicy::Allow`] no duplicate check is made.
    pub fn add_sub(&self, subscriber: &Rc<dyn Subscriber>) {
        let mut subs = self.inner.subs.borrow_mut();
        if self.inner.duplicates == DuplicatePolicy::Ignore
            && subs.iter().any(|s| is_same(&s.subscriber, subscriber))
        {
            trace!(dep = %self.id(), "duplicate subscriber ignored");
            return;
        }
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        subs.push(Registration {
            seq,
            subscriber: Rc::downgrade(subscriber),
        });
    }

    /// Remove the first registration of `subscriber`, if present.
    pub fn remove_sub(&self, subscriber: &Rc<dyn Subscriber>) {
        let mut subs = self.inner.subs.borrow_mut();
        if let Some(index) = subs
            .iter()
            .position(|s| is_same(&s.subscriber, subscriber))
        {
            subs.remove(index);
        }
    }

    /// Hand this dependency to the active subscriber, if there is one.
    ///
    /// A read outside any evaluation registers nothing.
    pub fn depend(&self) {
        if let Some(subscriber) = ReactiveContext::current() {
            trace!(dep = %self.id(), "dependency collected");
            subscriber.add_dep(self);
        }
    }

    /// Update every registered subscriber in registration order.
    pub fn notify(&self) -> Result<()> {
        let snapshot: SubscriberList = self.inner.subs.borrow().clone();
        trace!(dep = %self.id(), subscribers = snapshot.len(), "notifying");

        let mut failures = Vec::new();
        for entry in &snapshot {
            // Removed by an earlier update in this pass.
            if !self.is_registered(entry.seq) {
                continue;
            }
            let Some(subscriber) = entry.subscriber.upgrade() else {
                continue;
            };
            if let Err(err) = subscriber.update() {
                match self.inner.failures {
                    FailurePolicy::Abort => {
                        self.prune();
                        return Err(err);
                    }
                    FailurePolicy::Continue => failures.push(err),
                }
            }
        }

        self.prune();

        if failures.is_empty() {
            Ok(())
        } else {
            warn!(dep = %self.id(), failed = failures.len(), "subscriber updates failed");
            Err(ReactiveError::NotifyFailed {
                dep: self.id(),
                failures,
            })
        }
    }

    /// Number of registrations, live or not yet pruned.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subs.borrow().len()
    }

    /// Whether `subscriber` is registered at least once.
    pub fn has_sub(&self, subscriber: &Rc<dyn Subscriber>) -> bool {
        self.inner
            .subs
            .borrow()
            .iter()
            .any(|s| is_same(&s.subscriber, subscriber))
    }

    fn is_registered(&self, seq: u64) -> bool {
        self.inner.subs.borrow().iter().any(|s| s.seq == seq)
    }

    fn prune(&self) {
        let mut subs = self.inner.subs.borrow_mut();
        let before = subs.len();
        subs.retain(|s| s.subscriber.strong_count() > 0);
        if subs.len() != before {
            trace!(dep = %self.id(), pruned = before - subs.len(), "dropped dead subscribers");
        }
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.id())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

fn is_same(weak: &Weak<dyn Subscriber>, subscriber: &Rc<dyn Subscriber>) -> bool {
    std::ptr::addr_eq(weak.as_ptr(), Rc::as_ptr(subscriber))
}
