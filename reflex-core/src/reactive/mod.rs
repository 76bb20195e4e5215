//! Reactive Primitives
//!
//! This module implements the dependency-tracking half of the core:
//! dependencies, the subscriber contract, and the context that connects them
//! during an evaluation.
//!
//! # Concepts
//!
//! ## Dependencies
//!
//! Every reactive property owns one [`Dep`]. Reading the property while a
//! subscriber is evaluating hands the `Dep` to that subscriber; writing the
//! property notifies every subscriber the `Dep` has collected.
//!
//! ## Subscribers
//!
//! A [`Subscriber`] is an evaluation that must be replayed when what it read
//! changes. The core never creates subscribers; [`Watcher`] is a ready-made
//! one for callers that just want a callback.
//!
//! ## Context
//!
//! [`ReactiveContext`] records which subscriber is currently evaluating so
//! that reads can register dependencies without any explicit declaration.

mod context;
mod dep;
mod subscriber;
mod watcher;

pub use context::ReactiveContext;
pub use dep::{Dep, DepId};
pub use subscriber::{Subscriber, SubscriberId};
pub use watcher::Watcher;
