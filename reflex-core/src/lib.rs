//! Reflex Core
//!
//! This crate provides the dependency-tracking core of the Reflex data
//! binding layer. It turns the fields of plain data into reactive properties:
//!
//! - reading a property while a subscriber is evaluating records that the
//!   subscriber depends on it
//! - writing a property replays every subscriber recorded for it
//!
//! No dependency is ever declared by hand. The graph is built from the reads
//! observed during evaluation.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: the plain data model (`Value`, `Object`)
//! - `observer`: observation, property cells, and the traversal planner
//! - `reactive`: dependencies, subscribers, and the evaluation context
//! - `config`: policies for duplicates, failures, cycles, and depth
//! - `error`: the error taxonomy
//!
//! Everything is single-threaded and synchronous. A write returns only after
//! every affected subscriber has run.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use reflex_core::{observe, Object, Value, Watcher};
//!
//! let model = Value::from_json(&serde_json::json!({ "user": { "name": "Ada" } }));
//! observe(&model).unwrap();
//! let model = model.as_object().unwrap().clone();
//!
//! let renders = Rc::new(Cell::new(0));
//! let counter = renders.clone();
//! let _view = Watcher::path(&model, "user.name", move |_, _| {
//!     counter.set(counter.get() + 1);
//!     Ok(())
//! });
//!
//! // Replacing the nested object makes the new one reactive too
//! model.set("user", Object::new().with("name", "Grace")).unwrap();
//! assert_eq!(renders.get(), 1);
//!
//! let user = model.get("user").unwrap().as_object().unwrap().clone();
//! user.set("name", "Linus").unwrap();
//! assert_eq!(renders.get(), 2);
//! ```

pub mod config;
pub mod error;
pub mod observer;
pub mod reactive;
pub mod value;

pub use config::ReactiveConfig;
pub use error::{ReactiveError, Result};
pub use observer::{define_reactive, observe, observe_with, ReactiveObject};
pub use reactive::{Dep, DepId, ReactiveContext, Subscriber, SubscriberId, Watcher};
pub use value::{Object, Value};
