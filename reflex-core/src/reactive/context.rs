//! Reactive Context
//!
//! The reactive context tracks which subscriber is currently evaluating.
//! When a reactive property is read, its dependency asks the context for the
//! active subscriber and hands itself to that subscriber.
//!
//! # Implementation
//!
//! We use a thread-local stack. Entering a context pushes the subscriber,
//! dropping the guard pops it, so the previous subscriber is restored even if
//! the evaluation panics or returns early. Nested evaluations (a watcher whose
//! getter triggers another watcher) therefore keep registering against the
//! right subscriber once the inner one finishes.
//!
//! An entry may also be empty: [`ReactiveContext::untracked`] pushes a
//! blank entry so that reads inside it register nothing.

use std::cell::RefCell;
use std::rc::Rc;

use super::Subscriber;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Option<Rc<dyn Subscriber>>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the context when dropped.
#[must_use = "the context is exited as soon as the guard is dropped"]
pub struct ReactiveContext {
    subscriber: Option<Rc<dyn Subscriber>>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    ///
    /// While the returned guard is alive, reactive reads register against
    /// `subscriber`.
    pub fn enter(subscriber: Rc<dyn Subscriber>) -> Self {
        Self::push(Some(subscriber))
    }

    fn push(entry: Option<Rc<dyn Subscriber>>) -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(entry.clone()));
        Self { subscriber: entry }
    }

    /// Run `f` with tracking suspended.
    pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
        let _ctx = Self::push(None);
        f()
    }

    /// Check if a subscriber is currently collecting dependencies.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// Get the active subscriber, if any.
    pub fn current() -> Option<Rc<dyn Subscriber>> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned().flatten())
    }

    /// Number of entered contexts on this thread, untracked ones included.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Guards must be dropped in reverse order of entry.
            if let Some(entry) = popped {
                debug_assert!(
                    match (&entry, &self.subscriber) {
                        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                        (None, None) => true,
                        _ => false,
                    },
                    "ReactiveContext mismatch: guards dropped out of order"
                );
            }
        });
    }
}
