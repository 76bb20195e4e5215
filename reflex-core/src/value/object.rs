//! Shared composite values.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::warn;

use super::Value;
use crate::error::Result;
use crate::observer::{self, ObserverMark, ReactiveObject, Slot};
use crate::reactive::Dep;

/// How an object enumerates its keys when converted back to plain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    /// String keys in insertion order.
    #[default]
    Map,
    /// Index keys `"0"`, `"1"`, ... in order.
    Array,
}

pub(crate) struct ObjectData {
    pub(crate) shape: Shape,
    pub(crate) slots: IndexMap<String, Slot>,
    pub(crate) observer: Option<ObserverMark>,
}

/// A composite value: an ordered table of named fields.
///
/// `Object` is a handle. Cloning it yields another reference to the same
/// fields, and equality between objects is identity.
#[derive(Clone)]
pub struct Object {
    inner: Rc<RefCell<ObjectData>>,
}

impl Object {
    /// Create an empty map-shaped object.
    pub fn new() -> Self {
        Self::with_shape(Shape::Map)
    }

    fn with_shape(shape: Shape) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObjectData {
                shape,
                slots: IndexMap::new(),
                observer: None,
            })),
        }
    }

    /// Create an array-shaped object whose keys are element indices.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let object = Self::with_shape(Shape::Array);
        {
            let mut data = object.data_mut();
            for (index, item) in items.into_iter().enumerate() {
                data.slots.insert(index.to_string(), Slot::Plain(item.into()));
            }
        }
        object
    }

    /// Builder-style [`set`](Self::set) for constructing data.
    ///
    /// Meant for objects that are not observed yet, where a write is a plain
    /// store and cannot fail. On a reactive field a failed write (a rejected
    /// value or a failing subscriber) is logged and dropped; use
    /// [`set`](Self::set) when the error matters.
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        if let Err(err) = self.set(key, value) {
            warn!(key, %err, "write during construction failed");
        }
        self
    }

    /// Read a field.
    ///
    /// Reading a reactive field while a subscriber is evaluating registers
    /// that subscriber with the field's dependency.
    pub fn get(&self, key: &str) -> Option<Value> {
        let (value, dep) = {
            let data = self.data();
            match data.slots.get(key)? {
                Slot::Plain(value) => return Some(value.clone()),
                Slot::Reactive(cell) => (cell.value().clone(), cell.dep().clone()),
            }
        };
        dep.depend();
        Some(value)
    }

    /// Read a field without registering any dependency.
    pub fn get_untracked(&self, key: &str) -> Option<Value> {
        self.data().slots.get(key).map(|slot| slot.value().clone())
    }

    /// Read a dotted path such as `"user.address.city"`.
    ///
    /// Every hop is an ordinary [`get`](Self::get), so every field along the
    /// path is tracked. Returns `None` if a hop is missing or not an object.
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Write a field.
    ///
    /// Writing a reactive field to a new value observes that value and
    /// notifies the field's subscribers. Writing the same value is a no-op.
    /// Writing a plain or missing field just stores the value.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        observer::write(self, key, value.into())
    }

    /// Append an element to an array-shaped object.
    ///
    /// The new element is a plain field even if the array is observed.
    pub fn push(&self, value: impl Into<Value>) {
        let mut data = self.data_mut();
        let key = data.slots.len().to_string();
        data.slots.insert(key, Slot::Plain(value.into()));
    }

    /// Own keys in enumeration order.
    pub fn keys(&self) -> Vec<String> {
        self.data().slots.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().slots.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data().slots.contains_key(key)
    }

    pub fn shape(&self) -> Shape {
        self.data().shape
    }

    /// Whether `key` is backed by a property cell.
    pub fn is_reactive(&self, key: &str) -> bool {
        matches!(self.data().slots.get(key), Some(Slot::Reactive(_)))
    }

    /// The dependency of a reactive field.
    pub fn dep(&self, key: &str) -> Option<Dep> {
        match self.data().slots.get(key)? {
            Slot::Reactive(cell) => Some(cell.dep().clone()),
            Slot::Plain(_) => None,
        }
    }

    /// Whether this object has been observed.
    pub fn is_observed(&self) -> bool {
        self.data().observer.is_some()
    }

    /// The observer installed on this object, if any.
    pub fn observer(&self) -> Option<ReactiveObject> {
        let mark = self.data().observer.clone()?;
        Some(ReactiveObject::from_mark(self.clone(), mark))
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    /// Field values without tracking, in enumeration order.
    pub(crate) fn entries_untracked(&self) -> Vec<(String, Value)> {
        self.data()
            .slots
            .iter()
            .map(|(key, slot)| (key.clone(), slot.value().clone()))
            .collect()
    }

    pub(crate) fn data(&self) -> Ref<'_, ObjectData> {
        self.inner.borrow()
    }

    pub(crate) fn data_mut(&self) -> RefMut<'_, ObjectData> {
        self.inner.borrow_mut()
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Object::new();
        {
            let mut data = object.data_mut();
            for (key, value) in iter {
                data.slots.insert(key.into(), Slot::Plain(value.into()));
            }
        }
        object
    }
}

// Fields are not printed: observed data may be cyclic.
impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data();
        f.debug_struct("Object")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("shape", &data.shape)
            .field("keys", &data.slots.keys().collect::<Vec<_>>())
            .field("observed", &data.observer.is_some())
            .finish()
    }
}
