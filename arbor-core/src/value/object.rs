//! Object Containers
//!
//! An `ObjectRef` is a shared handle to an ordered key/value container.
//! Slots start out as plain data (or externally defined computed
//! accessors) and are converted into reactive bindings when the container
//! is observed; after conversion, reads and writes of that key flow
//! through the dependency-tracking paths in `reactive::accessor`.
//!
//! # Locking
//!
//! The slot table lives behind a `parking_lot::RwLock`. The engine never
//! holds that lock while running user code (getters, setters, subscriber
//! updates): every access path in `reactive::accessor` collects what it
//! needs under the lock, releases it, and only then calls out.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::reactive::accessor;
use crate::reactive::{Dep, Observer};

use super::Value;

/// A computed-property getter. Receives the owning container.
pub type Getter = Arc<dyn Fn(&ObjectRef) -> Value + Send + Sync>;

/// A computed-property setter. Receives the owning container and the
/// incoming value.
pub type Setter = Arc<dyn Fn(&ObjectRef, &Value) + Send + Sync>;

/// Per-key slot state.
pub(crate) struct Slot {
    pub(crate) kind: SlotKind,
    /// Non-configurable slots are never converted into reactive bindings.
    pub(crate) configurable: bool,
}

pub(crate) enum SlotKind {
    /// Uninstrumented data.
    Plain(Value),
    /// An externally defined accessor pair. The setter is optional; a
    /// getter-only slot silently drops writes.
    Computed { get: Getter, set: Option<Setter> },
    /// An installed reactive binding.
    Reactive(ReactiveSlot),
}

/// The state behind an installed reactive binding: one dependency subject,
/// fixed for the lifetime of the slot, plus the cached value and the
/// child container's observer (when the value is itself a container).
pub(crate) struct ReactiveSlot {
    pub(crate) value: Value,
    pub(crate) dep: Arc<Dep>,
    pub(crate) child: Option<Arc<Observer>>,
    /// Pre-existing getter, still consulted on every read.
    pub(crate) get: Option<Getter>,
    pub(crate) set: Option<Setter>,
}

pub(crate) struct ObjectData {
    pub(crate) slots: IndexMap<String, Slot>,
    pub(crate) extensible: bool,
    pub(crate) frozen: bool,
    /// Framework instances are never observed and their shape is
    /// protected from programmatic mutation.
    pub(crate) instance: bool,
    pub(crate) observer: Option<Arc<Observer>>,
}

/// Shared handle to an object container.
#[derive(Clone)]
pub struct ObjectRef {
    inner: Arc<RwLock<ObjectData>>,
}

impl ObjectRef {
    /// Create an empty, extensible object.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ObjectData {
                slots: IndexMap::new(),
                extensible: true,
                frozen: false,
                instance: false,
                observer: None,
            })),
        }
    }

    /// Define (or replace) a plain data slot.
    ///
    /// Silently does nothing on frozen objects, on non-extensible objects
    /// when the key is new, or when an existing slot is non-configurable.
    pub fn define(&self, key: impl Into<String>, value: Value) {
        self.define_slot(key.into(), SlotKind::Plain(value), true);
    }

    /// Define a plain data slot that can never be reconfigured.
    ///
    /// Observation leaves such slots uninstrumented.
    pub fn define_locked(&self, key: impl Into<String>, value: Value) {
        self.define_slot(key.into(), SlotKind::Plain(value), false);
    }

    /// Define a getter-only computed slot. Writes to it are silently
    /// dropped, before and after observation.
    pub fn define_getter(
        &self,
        key: impl Into<String>,
        get: impl Fn(&ObjectRef) -> Value + Send + Sync + 'static,
    ) {
        self.define_slot(
            key.into(),
            SlotKind::Computed {
                get: Arc::new(get),
                set: None,
            },
            true,
        );
    }

    /// Define a computed slot with both a getter and a setter.
    pub fn define_accessor(
        &self,
        key: impl Into<String>,
        get: impl Fn(&ObjectRef) -> Value + Send + Sync + 'static,
        set: impl Fn(&ObjectRef, &Value) + Send + Sync + 'static,
    ) {
        self.define_slot(
            key.into(),
            SlotKind::Computed {
                get: Arc::new(get),
                set: Some(Arc::new(set)),
            },
            true,
        );
    }

    fn define_slot(&self, key: String, kind: SlotKind, configurable: bool) {
        let mut data = self.inner.write();
        if data.frozen {
            return;
        }
        match data.slots.get(&key) {
            Some(slot) if !slot.configurable => return,
            None if !data.extensible => return,
            _ => {}
        }
        data.slots.insert(key, Slot { kind, configurable });
    }

    /// Read the value at `key`.
    ///
    /// If the slot is a reactive binding and a subscriber is currently
    /// active, the read registers that subscriber on the slot's subject
    /// (and on the child container's subject, when there is one).
    pub fn get(&self, key: &str) -> Option<Value> {
        accessor::read(self, key)
    }

    /// Read the value at `key` without registering any dependency.
    pub fn get_untracked(&self, key: &str) -> Option<Value> {
        accessor::read_untracked(self, key)
    }

    /// Write the value at `key`.
    ///
    /// Reactive slots suppress identity-equal writes and notify their
    /// subscribers otherwise; plain slots just store; getter-only computed
    /// slots drop the write. A missing key is created as a plain,
    /// non-reactive slot (use [`crate::reactive::set`] to add reactive
    /// keys to an observed object).
    pub fn set(&self, key: &str, value: Value) {
        accessor::write(self, key, value);
    }

    /// The container's own keys, in definition order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().slots.keys().cloned().collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().slots.is_empty()
    }

    /// Forbid adding new keys. Existing slots are unaffected.
    pub fn prevent_extensions(&self) {
        self.inner.write().extensible = false;
    }

    pub fn is_extensible(&self) -> bool {
        self.inner.read().extensible
    }

    /// Freeze the object: no new keys, no writes, and observation will
    /// refuse to instrument it.
    pub fn freeze(&self) {
        let mut data = self.inner.write();
        data.frozen = true;
        data.extensible = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.read().frozen
    }

    /// Flag this container as a framework instance. Instances are never
    /// observed, and `set`/`del` refuse to change their shape.
    pub fn mark_instance(&self) {
        self.inner.write().instance = true;
    }

    pub fn is_instance(&self) -> bool {
        self.inner.read().instance
    }

    /// The observer attached to this container, if it has been observed.
    pub fn observer(&self) -> Option<Arc<Observer>> {
        self.inner.read().observer.clone()
    }

    /// Stable identity for this container.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Whether two handles refer to the same container.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Remove an own key without any notification. The reactive removal
    /// path is [`crate::reactive::del`].
    pub(crate) fn remove_slot(&self, key: &str) -> bool {
        let mut data = self.inner.write();
        if data.frozen {
            return false;
        }
        data.slots.shift_remove(key).is_some()
    }

    pub(crate) fn raw(&self) -> &RwLock<ObjectData> {
        &self.inner
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // try_read: Debug must not deadlock when the lock is held.
        match self.inner.try_read() {
            Some(data) => f
                .debug_struct("ObjectRef")
                .field("keys", &data.slots.keys().collect::<Vec<_>>())
                .field("observed", &data.observer.is_some())
                .finish(),
            None => f.write_str("ObjectRef(<locked>)"),
        }
    }
}
