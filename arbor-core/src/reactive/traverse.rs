//! Deep Traversal
//!
//! A subscriber that wants "deep" sensitivity (re-run when anything
//! under a root changes, not just the keys it happened to read) calls
//! [`traverse`] during its tracking pass. Traversal is nothing more than
//! a forced recursive read: every own key is read through its installed
//! accessor and every visited container's record subject is registered,
//! so the active subscriber ends up on every subject in the reachable
//! graph.
//!
//! A call-scoped set of visited record ids makes shared and cyclic
//! graphs terminate; the set is dropped when the call returns, so
//! repeated traversals cost no persistent memory.

use std::collections::HashSet;

use crate::value::Value;

use super::dep::Dep;

/// Recursively read every reachable key and element of `value`,
/// registering the currently active subscriber at every depth.
///
/// Terminates immediately on primitives, render nodes, and frozen
/// containers.
pub fn traverse(value: &Value) {
    let mut seen = HashSet::new();
    traverse_value(value, &mut seen);
}

fn traverse_value(value: &Value, seen: &mut HashSet<u64>) {
    match value {
        Value::Object(obj) => {
            if obj.is_frozen() {
                return;
            }
            if let Some(observer) = obj.observer() {
                if !seen.insert(observer.dep().id()) {
                    return;
                }
                // Shape changes (set/del of keys) notify the record's own
                // subject; a deep subscriber must hear about those too.
                Dep::depend(observer.dep());
            }
            for key in obj.keys() {
                if let Some(item) = obj.get(&key) {
                    traverse_value(&item, seen);
                }
            }
        }
        Value::Array(arr) => {
            if arr.is_frozen() {
                return;
            }
            if let Some(observer) = arr.observer() {
                if !seen.insert(observer.dep().id()) {
                    return;
                }
                Dep::depend(observer.dep());
            }
            for item in arr.to_vec() {
                traverse_value(&item, seen);
            }
        }
        // Primitives and render nodes terminate the walk.
        _ => {}
    }
}
