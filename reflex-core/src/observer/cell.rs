//! Property Cells
//!
//! A property cell replaces a plain field once the field becomes reactive.
//! It keeps the current value, the observer of that value when it is
//! composite, and the field's [`Dep`]. The `Dep` is created when the cell is
//! installed and lives as long as the cell; it is never swapped out.

use std::rc::Rc;

use tracing::{debug, trace};

use super::{observe_shared, ReactiveObject};
use crate::config::ReactiveConfig;
use crate::error::{ReactiveError, Result};
use crate::reactive::Dep;
use crate::value::{Object, Value};

/// The installed state behind one reactive field.
pub(crate) struct PropertyCell {
    value: Value,
    child: Option<ReactiveObject>,
    dep: Dep,
    config: Rc<ReactiveConfig>,
}

impl PropertyCell {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn dep(&self) -> &Dep {
        &self.dep
    }

    /// Observer of the current value, when that value is composite.
    pub fn child(&self) -> Option<&ReactiveObject> {
        self.child.as_ref()
    }
}

/// One entry in an object's property table.
pub(crate) enum Slot {
    Plain(Value),
    Reactive(PropertyCell),
}

impl Slot {
    pub(crate) fn value(&self) -> &Value {
        match self {
            Slot::Plain(value) => value,
            Slot::Reactive(cell) => &cell.value,
        }
    }
}

/// Make `container[key]` reactive, starting from `initial`.
///
/// The key is added if the container does not have it yet; an existing plain
/// field keeps its position and is replaced by `initial`. A composite
/// `initial` is observed before the cell becomes visible.
///
/// Fails with [`ReactiveError::AlreadyReactive`] if the key already has a
/// cell.
pub fn define_reactive(container: &Object, key: &str, initial: impl Into<Value>) -> Result<()> {
    let config = container
        .observer()
        .map(|observer| observer.shared_config())
        .unwrap_or_default();
    install(container, key, initial.into(), &config)
}

pub(crate) fn install(
    container: &Object,
    key: &str,
    initial: Value,
    config: &Rc<ReactiveConfig>,
) -> Result<()> {
    if container.is_reactive(key) {
        return Err(ReactiveError::AlreadyReactive { key: key.to_owned() });
    }

    let dep = Dep::with_config(config);
    let child = observe_shared(&initial, config)?;

    debug!(key, dep = %dep.id(), nested = child.is_some(), "property made reactive");
    container.data_mut().slots.insert(
        key.to_owned(),
        Slot::Reactive(PropertyCell {
            value: initial,
            child,
            dep,
            config: Rc::clone(config),
        }),
    );
    Ok(())
}

/// Store `value` into `object[key]`, notifying if the field is reactive.
pub(crate) fn write(object: &Object, key: &str, value: Value) -> Result<()> {
    let config = {
        let mut data = object.data_mut();
        match data.slots.get_mut(key) {
            Some(Slot::Reactive(cell)) => {
                if cell.value.is_same(&value) {
                    trace!(key, "unchanged write ignored");
                    return Ok(());
                }
                Rc::clone(&cell.config)
            }
            Some(Slot::Plain(slot)) => {
                *slot = value;
                return Ok(());
            }
            None => {
                data.slots.insert(key.to_owned(), Slot::Plain(value));
                return Ok(());
            }
        }
    };

    // Observe before committing so a rejected value leaves the field untouched.
    let child = observe_shared(&value, &config)?;

    let dep = {
        let mut data = object.data_mut();
        let Some(Slot::Reactive(cell)) = data.slots.get_mut(key) else {
            return Ok(());
        };
        cell.value = value;
        cell.child = child;
        cell.dep.clone()
    };

    dep.notify()
}
