//! Programmatic Shape Mutation
//!
//! Accessor interception covers reads and writes of keys that existed
//! when a container was observed. It cannot cover adding a key, removing
//! a key, or writing an array element: those change the container's
//! shape. [`set`] and [`del`] are the controlled API for exactly that:
//! they reuse the accessor installer for new keys, route array element
//! changes through the mutation adapter, and notify the container's own
//! record subject so shape-level readers are invalidated.
//!
//! Failures here never abort anything. Invalid targets and policy
//! violations emit a `tracing` diagnostic and leave the data untouched;
//! structurally impossible requests (deleting a key that is not there)
//! are silent no-ops.

use crate::value::{ObjectRef, Value};

use super::accessor::define_reactive;

/// A key into a container: an index for arrays, a field name for objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Index(usize),
    Field(String),
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&str> for Key {
    fn from(field: &str) -> Self {
        Key::Field(field.to_string())
    }
}

impl From<String> for Key {
    fn from(field: String) -> Self {
        Key::Field(field)
    }
}

/// Set a key on a container, making it reactive when the container is
/// observed.
///
/// - Array + index: extends the sequence if needed, then replaces the
///   element through the splice interception path, which guarantees
///   notification.
/// - Object + existing own key: plain assignment; the installed accessor
///   fires notification.
/// - Object + new key: installs a reactive binding and notifies the
///   container's own record subject, so subscribers that read the
///   container's shape are invalidated even though the key did not exist
///   when they read.
///
/// Adding keys to protected containers (framework instances, or roots
/// held by a higher-level unit) is refused with a diagnostic. Returns the
/// value either way.
pub fn set(target: &Value, key: impl Into<Key>, value: Value) -> Value {
    match (target, key.into()) {
        (Value::Array(arr), Key::Index(index)) => {
            if index >= arr.len() {
                arr.force_len(index);
            }
            arr.splice(index, 1, vec![value.clone()]);
            value
        }
        (Value::Array(_), Key::Field(field)) => {
            tracing::warn!(key = %field, "cannot set a named key on an array");
            value
        }
        (Value::Object(obj), key) => {
            let field = match key {
                Key::Field(field) => field,
                Key::Index(index) => index.to_string(),
            };
            set_object_key(obj, &field, value)
        }
        _ => {
            tracing::warn!("cannot set a reactive key on a primitive or render-node value");
            value
        }
    }
}

fn set_object_key(obj: &ObjectRef, field: &str, value: Value) -> Value {
    // Existing own keys go through the installed accessor.
    if obj.contains_key(field) {
        obj.set(field, value.clone());
        return value;
    }

    let observer = obj.observer();
    let protected =
        obj.is_instance() || observer.as_ref().map_or(false, |ob| ob.root_count() > 0);
    if protected {
        tracing::warn!(
            key = %field,
            "avoid adding keys to a root state container at runtime - declare the key upfront"
        );
        return value;
    }

    let Some(observer) = observer else {
        // Never observed: a plain, non-reactive insert is all that is
        // asked for.
        obj.set(field, value.clone());
        return value;
    };

    define_reactive(obj, field, Some(value.clone()));
    // The new key's own subject has no subscribers yet; shape-level
    // readers are registered on the record's subject.
    observer.dep().notify();
    value
}

/// Delete a key from a container.
///
/// Arrays route through the splice interception path; objects delete the
/// own key and notify the container's record subject when one exists.
/// Deleting from protected containers is refused with a diagnostic;
/// deleting a key that is not an own key is a silent no-op.
pub fn del(target: &Value, key: impl Into<Key>) {
    match (target, key.into()) {
        (Value::Array(arr), Key::Index(index)) => {
            arr.splice(index, 1, Vec::new());
        }
        (Value::Array(_), Key::Field(field)) => {
            tracing::warn!(key = %field, "cannot delete a named key from an array");
        }
        (Value::Object(obj), key) => {
            let field = match key {
                Key::Field(field) => field,
                Key::Index(index) => index.to_string(),
            };
            del_object_key(obj, &field);
        }
        _ => {
            tracing::warn!("cannot delete a reactive key from a primitive or render-node value");
        }
    }
}

fn del_object_key(obj: &ObjectRef, field: &str) {
    let observer = obj.observer();
    let protected =
        obj.is_instance() || observer.as_ref().map_or(false, |ob| ob.root_count() > 0);
    if protected {
        tracing::warn!(
            key = %field,
            "avoid deleting keys from a root state container at runtime - set the value to null instead"
        );
        return;
    }

    if !obj.contains_key(field) {
        return;
    }

    obj.remove_slot(field);
    if let Some(observer) = observer {
        observer.dep().notify();
    }
}
