//! Property-based invariant tests for observation and notification.
//!
//! 1. Observing an object installs exactly one cell per own key and leaves
//!    every value readable unchanged.
//! 2. Dependency IDs increase in creation order.
//! 3. `notify` updates subscribers in registration order, once each.
//! 4. Writing a field's current value never updates anyone.
//! 5. JSON snapshots survive observation unchanged.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use reflex_core::{observe, Dep, Object, Subscriber, Value};

// ── Strategies ────────────────────────────────────────────────────────────

fn primitive_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-1_000i32..1_000).prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

fn flat_object_strategy() -> impl Strategy<Value = Vec<(String, Value)>> {
    proptest::collection::btree_map("[a-z]{1,6}", primitive_strategy(), 0..12)
        .prop_map(|map| map.into_iter().collect())
}

fn json_strategy() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        (-1_000i64..1_000).prop_map(serde_json::Value::from),
        "[a-z]{0,6}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
            proptest::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|map| serde_json::Value::Object(map.into_iter().collect())),
        ]
    })
}

struct Logger {
    index: usize,
    log: Rc<RefCell<Vec<usize>>>,
}

impl Subscriber for Logger {
    fn update(&self) -> reflex_core::Result<()> {
        self.log.borrow_mut().push(self.index);
        Ok(())
    }

    fn add_dep(&self, _dep: &Dep) {}
}

// ═════════════════════════════════════════════════════════════════════════
// 1. One cell per key, values unchanged
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn observe_installs_one_cell_per_key(entries in flat_object_strategy()) {
        let object: Object = entries.iter().cloned().collect();
        let keys_before = object.keys();

        let observer = observe(&object.clone().into()).unwrap().unwrap();

        prop_assert_eq!(observer.cell_count(), entries.len());
        prop_assert_eq!(object.keys(), keys_before);
        for (key, value) in &entries {
            prop_assert!(object.is_reactive(key));
            prop_assert_eq!(object.get(key), Some(value.clone()));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Dependency IDs follow creation order
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dep_ids_increase(count in 1usize..64) {
        let deps: Vec<Dep> = (0..count).map(|_| Dep::new()).collect();
        for pair in deps.windows(2) {
            prop_assert!(pair[0].id() < pair[1].id());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Notification order is registration order
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn notify_follows_registration_order(count in 0usize..16) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let subscribers: Vec<Rc<dyn Subscriber>> = (0..count)
            .map(|index| Rc::new(Logger { index, log: log.clone() }) as Rc<dyn Subscriber>)
            .collect();

        let dep = Dep::new();
        for subscriber in &subscribers {
            dep.add_sub(subscriber);
        }
        dep.notify().unwrap();

        prop_assert_eq!(log.borrow().clone(), (0..count).collect::<Vec<_>>());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Same-value writes are silent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn same_value_write_is_silent(entries in flat_object_strategy()) {
        let object: Object = entries.iter().cloned().collect();
        observe(&object.clone().into()).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let logger: Rc<dyn Subscriber> = Rc::new(Logger { index: 0, log: log.clone() });
        for (key, _) in &entries {
            object.dep(key).unwrap().add_sub(&logger);
        }

        for (key, value) in &entries {
            object.set(key, value.clone()).unwrap();
        }

        prop_assert!(log.borrow().is_empty());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Observation does not alter data
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn observation_preserves_json(doc in json_strategy()) {
        let value = Value::from_json(&doc);
        observe(&value).unwrap();
        prop_assert_eq!(value.to_json().unwrap(), doc);
    }
}
