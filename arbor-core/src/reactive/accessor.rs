//! Reactive Accessor Bindings
//!
//! This module installs and drives the read/write interception pair for
//! object slots. Installing a binding (`define_reactive`) fixes one
//! dependency subject to the slot for its whole lifetime and caches the
//! slot's value; from then on every read can register the active
//! subscriber and every effective write notifies synchronously.
//!
//! # Reads
//!
//! A tracked read registers the active subscriber on the slot's subject.
//! If the cached value is a container with its own observation record,
//! the record's subject registers the same subscriber too; that is what
//! keeps later shape-level notifications (new or removed keys, sequence
//! mutations) visible to anyone who merely read the parent. If the value
//! is an array, the whole array is walked eagerly, because element reads
//! cannot be intercepted the way property reads can.
//!
//! # Writes
//!
//! Writes compare against the current value with identity equality (NaN
//! counting equal to NaN) and do nothing when the value is unchanged.
//! Effective writes store, re-evaluate whether the new value should
//! itself be observed, and then notify every registered subscriber before
//! returning.
//!
//! # Locking
//!
//! Every path here collects what it needs under the container lock and
//! releases it before running user code: getters, setters, and
//! subscriber updates all execute lock-free, so they may freely re-enter
//! the engine.

use std::sync::Arc;

use crate::value::object::{ReactiveSlot, Slot, SlotKind};
use crate::value::{same_value, ArrayRef, Getter, ObjectRef, Setter, Value};

use super::context::TrackingContext;
use super::dep::Dep;
use super::observer::{observe, Observer};

/// What a key resolved to, extracted under the lock.
enum Lookup {
    Plain(Value),
    Computed(Getter),
    Reactive {
        get: Option<Getter>,
        cached: Value,
        dep: Arc<Dep>,
        child: Option<Arc<Observer>>,
    },
}

fn lookup(obj: &ObjectRef, key: &str) -> Option<Lookup> {
    let data = obj.raw().read();
    let slot = data.slots.get(key)?;
    Some(match &slot.kind {
        SlotKind::Plain(value) => Lookup::Plain(value.clone()),
        SlotKind::Computed { get, .. } => Lookup::Computed(get.clone()),
        SlotKind::Reactive(slot) => Lookup::Reactive {
            get: slot.get.clone(),
            cached: slot.value.clone(),
            dep: slot.dep.clone(),
            child: slot.child.clone(),
        },
    })
}

/// Tracked read of `key`.
pub(crate) fn read(obj: &ObjectRef, key: &str) -> Option<Value> {
    match lookup(obj, key)? {
        Lookup::Plain(value) => Some(value),
        Lookup::Computed(get) => Some(get(obj)),
        Lookup::Reactive {
            get,
            cached,
            dep,
            child,
        } => {
            let value = match get {
                Some(get) => get(obj),
                None => cached,
            };
            if TrackingContext::is_active() {
                Dep::depend(&dep);
                if let Some(child) = &child {
                    Dep::depend(child.dep());
                    if let Value::Array(arr) = &value {
                        depend_array(arr);
                    }
                }
            }
            Some(value)
        }
    }
}

/// Read without registering any dependency.
pub(crate) fn read_untracked(obj: &ObjectRef, key: &str) -> Option<Value> {
    match lookup(obj, key)? {
        Lookup::Plain(value) => Some(value),
        Lookup::Computed(get) => Some(get(obj)),
        Lookup::Reactive { get, cached, .. } => Some(match get {
            Some(get) => get(obj),
            None => cached,
        }),
    }
}

/// Write `key`, routing through the reactive binding when one is
/// installed.
pub(crate) fn write(obj: &ObjectRef, key: &str, new: Value) {
    enum Target {
        Setter(Setter),
        Reactive {
            get: Option<Getter>,
            set: Option<Setter>,
            cached: Value,
            dep: Arc<Dep>,
        },
    }

    let target = {
        let mut data = obj.raw().write();
        if data.frozen {
            return;
        }
        match data.slots.get_mut(key) {
            None => {
                // Plain assignment to a fresh key never becomes reactive
                // on its own; `reactive::set` is the path for that.
                if data.extensible {
                    data.slots.insert(
                        key.to_string(),
                        Slot {
                            kind: SlotKind::Plain(new),
                            configurable: true,
                        },
                    );
                }
                return;
            }
            Some(slot) => match &mut slot.kind {
                SlotKind::Plain(value) => {
                    *value = new;
                    return;
                }
                SlotKind::Computed { set: Some(set), .. } => Target::Setter(set.clone()),
                SlotKind::Computed { set: None, .. } => return,
                SlotKind::Reactive(slot) => Target::Reactive {
                    get: slot.get.clone(),
                    set: slot.set.clone(),
                    cached: slot.value.clone(),
                    dep: slot.dep.clone(),
                },
            },
        }
    };

    match target {
        Target::Setter(set) => set(obj, &new),
        Target::Reactive {
            get,
            set,
            cached,
            dep,
        } => {
            let current = match &get {
                Some(get) => get(obj),
                None => cached,
            };
            if same_value(&new, &current) {
                return;
            }
            // A getter without a setter passes writes through to nowhere.
            if get.is_some() && set.is_none() {
                return;
            }

            match &set {
                Some(set) => set(obj, &new),
                None => {
                    let mut data = obj.raw().write();
                    if let Some(Slot {
                        kind: SlotKind::Reactive(slot),
                        ..
                    }) = data.slots.get_mut(key)
                    {
                        slot.value = new.clone();
                    }
                }
            }

            // The replacement value gets its own eligibility check, so
            // child instrumentation always matches the current value.
            let child = observe(&new);
            {
                let mut data = obj.raw().write();
                if let Some(Slot {
                    kind: SlotKind::Reactive(slot),
                    ..
                }) = data.slots.get_mut(key)
                {
                    slot.child = child;
                }
            }

            dep.notify();
        }
    }
}

/// Install a reactive binding on `key`.
///
/// `initial: None` takes the value from the current slot; `Some` installs
/// a brand-new key with that value. No-ops: frozen containers, keys whose
/// slot is non-configurable, new keys on non-extensible containers, and
/// slots that already carry a binding (the subject is fixed at install
/// time and never replaced).
pub fn define_reactive(obj: &ObjectRef, key: &str, initial: Option<Value>) {
    enum Seed {
        Value(Value),
        /// Evaluate the pre-existing getter, outside the lock.
        Evaluate(Getter),
    }

    let (seed, get, set) = {
        let data = obj.raw().read();
        if data.frozen {
            return;
        }
        match data.slots.get(key) {
            Some(slot) => {
                if !slot.configurable {
                    return;
                }
                match &slot.kind {
                    SlotKind::Reactive(_) => return,
                    SlotKind::Plain(value) => {
                        let value = initial.unwrap_or_else(|| value.clone());
                        (Seed::Value(value), None, None)
                    }
                    SlotKind::Computed { get, set } => match initial {
                        Some(value) => (Seed::Value(value), Some(get.clone()), set.clone()),
                        // A getter-only accessor is passed through
                        // untouched: it is never evaluated at install
                        // time and gets no child record.
                        None if set.is_none() => {
                            (Seed::Value(Value::Null), Some(get.clone()), None)
                        }
                        None => (
                            Seed::Evaluate(get.clone()),
                            Some(get.clone()),
                            set.clone(),
                        ),
                    },
                }
            }
            None => {
                if !data.extensible {
                    return;
                }
                (Seed::Value(initial.unwrap_or(Value::Null)), None, None)
            }
        }
    };

    let value = match seed {
        Seed::Value(value) => value,
        Seed::Evaluate(get) => get(obj),
    };
    let child = observe(&value);
    let dep = Arc::new(Dep::new());

    let mut data = obj.raw().write();
    // The getter evaluation above may have re-entered and won the
    // install; the first binding keeps its subject.
    if let Some(slot) = data.slots.get(key) {
        if matches!(slot.kind, SlotKind::Reactive(_)) {
            return;
        }
    }
    data.slots.insert(
        key.to_string(),
        Slot {
            kind: SlotKind::Reactive(ReactiveSlot {
                value,
                dep,
                child,
                get,
                set,
            }),
            configurable: true,
        },
    );
}

/// Convert every own key of `obj` into a reactive binding.
pub(crate) fn walk(obj: &ObjectRef) {
    for key in obj.keys() {
        define_reactive(obj, &key, None);
    }
}

/// Register the active subscriber on every observed element of an array,
/// recursively into nested arrays. Element reads cannot be intercepted,
/// so dependency on array content is established eagerly on every read of
/// the array itself.
pub(crate) fn depend_array(arr: &ArrayRef) {
    for item in arr.to_vec() {
        match &item {
            Value::Object(obj) => {
                if let Some(observer) = obj.observer() {
                    Dep::depend(observer.dep());
                }
            }
            Value::Array(inner) => {
                if let Some(observer) = inner.observer() {
                    Dep::depend(observer.dep());
                }
                depend_array(inner);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::probe::Probe;
    use serde_json::json;

    fn observed_object(raw: serde_json::Value) -> (Value, ObjectRef) {
        let value = Value::from(raw);
        observe(&value).expect("value should be observable");
        let obj = value.as_object().unwrap().clone();
        (value, obj)
    }

    #[test]
    fn tracked_read_registers_once_per_pass() {
        let (_value, obj) = observed_object(json!({"a": 1}));
        let probe = Probe::new();

        probe.run(|| {
            // Re-reading the same key must not register again.
            obj.get("a");
            obj.get("a");
            obj.get("a");
        });

        assert_eq!(probe.dep_count(), 1);
        obj.set("a", Value::Int(2));
        assert_eq!(probe.updates(), 1);
    }

    #[test]
    fn untracked_read_registers_nothing() {
        let (_value, obj) = observed_object(json!({"a": 1}));
        let probe = Probe::new();

        probe.run(|| {
            obj.get_untracked("a");
        });

        assert_eq!(probe.dep_count(), 0);
        obj.set("a", Value::Int(2));
        assert_eq!(probe.updates(), 0);
    }

    #[test]
    fn write_notifies_in_registration_order_and_only_on_change() {
        let (_value, obj) = observed_object(json!({"a": 1}));
        let probe = Probe::new();
        probe.run(|| {
            obj.get("a");
        });

        obj.set("a", Value::Int(2));
        assert_eq!(probe.updates(), 1);

        // Identity-equal write: no notification.
        obj.set("a", Value::Int(2));
        assert_eq!(probe.updates(), 1);
    }

    #[test]
    fn nan_write_over_nan_is_a_no_op() {
        let (_value, obj) = observed_object(json!({"x": null}));
        obj.set("x", Value::Float(f64::NAN));

        let probe = Probe::new();
        probe.run(|| {
            obj.get("x");
        });

        obj.set("x", Value::Float(f64::NAN));
        assert_eq!(probe.updates(), 0);
    }

    #[test]
    fn reading_a_container_slot_registers_its_record_subject() {
        let (_value, obj) = observed_object(json!({"child": {"n": 1}}));
        let probe = Probe::new();
        probe.run(|| {
            obj.get("child");
        });

        // Slot subject + child record subject.
        assert_eq!(probe.dep_count(), 2);
    }

    #[test]
    fn reading_an_array_slot_depends_on_every_element_record() {
        let (_value, obj) = observed_object(json!({"list": [{"a": 1}, {"b": 2}, [3]]}));
        let probe = Probe::new();
        probe.run(|| {
            obj.get("list");
        });

        // list slot + list record + two element objects + nested array
        // record. The nested array holds no containers of its own.
        assert_eq!(probe.dep_count(), 5);

        // A mutation on a nested element record reaches the probe.
        let list = obj.get_untracked("list").unwrap();
        let first = list.as_array().unwrap().get(0).unwrap();
        crate::reactive::set(&first, "a2", Value::Int(9));
        assert_eq!(probe.updates(), 1);
    }

    #[test]
    fn replacing_a_container_value_reobserves_the_new_value() {
        let (_value, obj) = observed_object(json!({"child": {"n": 1}}));
        let replacement = Value::from(json!({"m": 2}));
        assert!(replacement.as_object().unwrap().observer().is_none());

        obj.set("child", replacement.clone());
        assert!(replacement.as_object().unwrap().observer().is_some());
    }

    #[test]
    fn getter_only_slot_is_tracked_but_ignores_writes() {
        let obj = ObjectRef::new();
        obj.define("plain", Value::Int(1));
        obj.define_getter("derived", |_| Value::Int(42));
        observe(&Value::Object(obj.clone())).unwrap();

        let probe = Probe::new();
        probe.run(|| {
            assert_eq!(obj.get("derived"), Some(Value::Int(42)));
        });
        // The read is still tracked through the slot's subject.
        assert_eq!(probe.dep_count(), 1);

        // Writes are dropped without notification.
        obj.set("derived", Value::Int(0));
        assert_eq!(probe.updates(), 0);
        assert_eq!(obj.get_untracked("derived"), Some(Value::Int(42)));
    }

    #[test]
    fn accessor_with_setter_still_notifies_through_its_subject() {
        let obj = ObjectRef::new();
        obj.define("backing", Value::Int(1));
        obj.define_accessor(
            "wrapped",
            |this| this.get_untracked("backing").unwrap_or(Value::Null),
            |this, incoming| this.set("backing", incoming.clone()),
        );
        observe(&Value::Object(obj.clone())).unwrap();

        let probe = Probe::new();
        probe.run(|| {
            obj.get("wrapped");
        });

        obj.set("wrapped", Value::Int(5));
        assert_eq!(obj.get_untracked("backing"), Some(Value::Int(5)));
        assert!(probe.updates() >= 1);
    }

    #[test]
    fn locked_slots_are_left_uninstrumented() {
        let obj = ObjectRef::new();
        obj.define_locked("pinned", Value::Int(1));
        observe(&Value::Object(obj.clone())).unwrap();

        let probe = Probe::new();
        probe.run(|| {
            obj.get("pinned");
        });
        assert_eq!(probe.dep_count(), 0);
    }

    #[test]
    fn the_subject_survives_value_replacement() {
        let (_value, obj) = observed_object(json!({"a": 1}));
        let probe = Probe::new();
        probe.run(|| {
            obj.get("a");
        });

        // Three distinct values through the same subject.
        obj.set("a", Value::Int(2));
        obj.set("a", Value::from("text"));
        obj.set("a", Value::from(json!({"now": "object"})));
        assert_eq!(probe.updates(), 3);
    }

    #[test]
    fn teardown_stops_notifications() {
        let (_value, obj) = observed_object(json!({"a": 1}));
        let probe = Probe::new();
        probe.run(|| {
            obj.get("a");
        });

        probe.teardown();
        obj.set("a", Value::Int(2));
        assert_eq!(probe.updates(), 0);
    }

    #[test]
    fn reentrant_update_attributes_reads_to_the_inner_subscriber() {
        let (_value, obj) = observed_object(json!({"a": 1, "b": 10}));

        let inner_obj = obj.clone();
        let inner = Probe::new();
        let inner_for_hook = inner.clone();

        // The outer probe's update runs a full inner tracking pass.
        let outer = Probe::with_update(move || {
            inner_for_hook.run(|| {
                inner_obj.get("b");
            });
        });

        outer.run(|| {
            obj.get("a");
        });

        obj.set("a", Value::Int(2));
        assert_eq!(outer.updates(), 1);
        // The inner pass registered only the inner probe on "b".
        assert_eq!(inner.dep_count(), 1);

        obj.set("b", Value::Int(11));
        assert_eq!(inner.updates(), 1);
        assert_eq!(outer.updates(), 1);
    }
}
