//! Observation Planning
//!
//! Before anything is instrumented we walk the value once to find every
//! object that still needs an observer. The walk uses an explicit stack so
//! deep data cannot exhaust the call stack, and a visited set so shared
//! objects are planned once.
//!
//! # Algorithm
//!
//! Depth-first with enter/exit frames:
//!
//! 1. On enter, skip objects already visited; otherwise mark the object as
//!    on the current path and push its exit frame.
//! 2. Check each field. A field that already has a property cell aborts the
//!    plan. A composite field on the current path is a cycle. Other
//!    unobserved composite fields are pushed as enter frames.
//! 3. On exit, remove the object from the path and append it to the plan.
//!
//! The plan is therefore post-order: nested objects come before the objects
//! that contain them. Nothing is mutated, so a failed plan leaves the data
//! exactly as it was.

use std::collections::HashSet;

use super::Slot;
use crate::config::{CyclePolicy, ReactiveConfig};
use crate::error::{ReactiveError, Result};
use crate::value::{Object, Value};

enum Frame {
    Enter { object: Object, depth: usize },
    Exit(Object),
}

/// Collect the unobserved objects reachable from `root`, nested ones first.
pub(crate) fn plan(root: &Object, config: &ReactiveConfig) -> Result<Vec<Object>> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut on_path = HashSet::new();
    let mut stack = vec![Frame::Enter {
        object: root.clone(),
        depth: 0,
    }];

    while let Some(frame) = stack.pop() {
        let (object, depth) = match frame {
            Frame::Exit(object) => {
                on_path.remove(&object.addr());
                order.push(object);
                continue;
            }
            Frame::Enter { object, depth } => (object, depth),
        };

        if depth > config.max_depth {
            return Err(ReactiveError::DepthExceeded {
                limit: config.max_depth,
            });
        }
        if !visited.insert(object.addr()) {
            continue;
        }
        on_path.insert(object.addr());

        let mut children = Vec::new();
        for (key, slot) in object.data().slots.iter() {
            let value = match slot {
                Slot::Plain(value) => value,
                Slot::Reactive(_) => {
                    return Err(ReactiveError::AlreadyReactive { key: key.clone() });
                }
            };
            let Value::Object(child) = value else {
                continue;
            };
            if child.is_observed() {
                continue;
            }
            if on_path.contains(&child.addr()) {
                match config.cycles {
                    CyclePolicy::Reject => {
                        return Err(ReactiveError::CyclicStructure { key: key.clone() });
                    }
                    CyclePolicy::Share => continue,
                }
            }
            children.push(Frame::Enter {
                object: child.clone(),
                depth: depth + 1,
            });
        }

        stack.push(Frame::Exit(object));
        // Reversed so the first key is explored first.
        stack.extend(children.into_iter().rev());
    }

    Ok(order)
}
