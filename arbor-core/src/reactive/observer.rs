//! Observation Records
//!
//! An `Observer` is the per-container bookkeeping the engine attaches the
//! first time a container becomes observed. It owns the container's own
//! dependency subject, "this container as a whole", which is notified
//! on shape changes (keys added or removed) and sequence mutations, and a
//! counter of how many external roots hold the container as their
//! top-level observed data.
//!
//! # How Observation Works
//!
//! 1. `observe` checks eligibility: the value must be an object or array,
//!    extensible and not frozen, not a render node, not flagged as a
//!    framework instance, and observation must not be suspended.
//!
//! 2. For an eligible object, every own configurable key is converted
//!    into a reactive binding. For an eligible array, every current
//!    element is observed recursively; the array handle's mutation
//!    adapter takes care of elements inserted later.
//!
//! 3. Observation is idempotent: a container carries at most one record
//!    for its whole lifetime, and re-observing returns that record.

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::value::{ArrayRef, ObjectRef, Value};

use super::accessor;
use super::dep::Dep;

thread_local! {
    /// Observation can be suspended while external code rebuilds state it
    /// does not want instrumented.
    static SHOULD_OBSERVE: Cell<bool> = const { Cell::new(true) };
}

/// Enable or disable creation of new observation records.
///
/// Already-attached records are unaffected and continue to be returned by
/// [`observe`].
pub fn toggle_observing(enabled: bool) {
    SHOULD_OBSERVE.with(|flag| flag.set(enabled));
}

fn should_observe() -> bool {
    SHOULD_OBSERVE.with(|flag| flag.get())
}

/// Per-container observation record.
pub struct Observer {
    /// The container's own subject. Notified on shape-level changes, not
    /// on writes to individual keys (those have their own subjects).
    dep: Arc<Dep>,

    /// How many external roots hold this container as their top-level
    /// observed data. Advisory: consulted by the shape-mutation guard in
    /// `reactive::mutate`, never a notification mechanism.
    roots: AtomicUsize,
}

impl Observer {
    fn new() -> Self {
        Self {
            dep: Arc::new(Dep::new()),
            roots: AtomicUsize::new(0),
        }
    }

    /// The container's own dependency subject.
    pub fn dep(&self) -> &Arc<Dep> {
        &self.dep
    }

    /// The current root count.
    pub fn root_count(&self) -> usize {
        self.roots.load(Ordering::Relaxed)
    }

    fn bump_roots(&self) {
        self.roots.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("dep_id", &self.dep.id())
            .field("root_count", &self.root_count())
            .finish()
    }
}

/// Attach (or look up) the observation record for a container value.
///
/// Ineligible values (primitives, render nodes, frozen or non-extensible
/// containers, framework instances) silently yield `None`.
pub fn observe(value: &Value) -> Option<Arc<Observer>> {
    match value {
        Value::Object(obj) => attach_object(obj),
        Value::Array(arr) => attach_array(arr),
        _ => None,
    }
}

/// Like [`observe`], additionally designating the container as the root
/// data of a higher-level unit. The root count feeds the guard policy in
/// [`crate::reactive::set`] and [`crate::reactive::del`].
pub fn observe_root(value: &Value) -> Option<Arc<Observer>> {
    let observer = observe(value);
    if let Some(observer) = &observer {
        observer.bump_roots();
    }
    observer
}

fn attach_object(obj: &ObjectRef) -> Option<Arc<Observer>> {
    let created = {
        let mut data = obj.raw().write();
        if let Some(existing) = &data.observer {
            return Some(existing.clone());
        }
        if !should_observe() || data.frozen || !data.extensible || data.instance {
            return None;
        }
        let observer = Arc::new(Observer::new());
        data.observer = Some(observer.clone());
        observer
    };

    tracing::trace!(container = obj.id(), "attached observer to object");

    // Convert every own key into a reactive binding. The record is
    // already attached, so self-references terminate here on re-entry.
    accessor::walk(obj);

    Some(created)
}

fn attach_array(arr: &ArrayRef) -> Option<Arc<Observer>> {
    let (created, items) = {
        let mut data = arr.raw().write();
        if let Some(existing) = &data.observer {
            return Some(existing.clone());
        }
        if !should_observe() || data.frozen {
            return None;
        }
        let observer = Arc::new(Observer::new());
        data.observer = Some(observer.clone());
        (observer, data.items.clone())
    };

    tracing::trace!(container = arr.id(), "attached observer to array");

    for item in &items {
        observe(item);
    }

    Some(created)
}
