//! Array Containers and the Mutation Adapter
//!
//! An `ArrayRef` is a shared handle to an ordered sequence. Index reads on
//! arrays cannot be intercepted the way object property reads can, so the
//! handle plays a second role: it is the mutation adapter every in-place
//! mutating operation must route through. Each mutator performs the
//! mutation, observes any newly inserted elements, and notifies the
//! container's observer subject, so a sequence mutation invalidates
//! everything that read the array through a reactive accessor.
//!
//! Reads (`get`, `len`, `to_vec`) are plain and untracked; dependency on
//! array *content* is established eagerly by `reactive::accessor` walking
//! the array whenever it is read through an instrumented object slot.

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::reactive::{observe, Observer};

use super::Value;

pub(crate) struct ArrayData {
    pub(crate) items: Vec<Value>,
    pub(crate) frozen: bool,
    pub(crate) observer: Option<Arc<Observer>>,
}

/// Shared handle to an array container. All in-place mutation goes
/// through this adapter so that observation never misses a change.
#[derive(Clone)]
pub struct ArrayRef {
    inner: Arc<RwLock<ArrayData>>,
}

impl ArrayRef {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::from_values(Vec::new())
    }

    pub fn from_values(items: Vec<Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ArrayData {
                items,
                frozen: false,
                observer: None,
            })),
        }
    }

    /// Append an element.
    pub fn push(&self, value: Value) {
        {
            let mut data = self.inner.write();
            if data.frozen {
                return;
            }
            data.items.push(value.clone());
        }
        self.finish_mutation(std::slice::from_ref(&value));
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<Value> {
        let removed = {
            let mut data = self.inner.write();
            if data.frozen {
                return None;
            }
            data.items.pop()
        };
        self.finish_mutation(&[]);
        removed
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Option<Value> {
        let removed = {
            let mut data = self.inner.write();
            if data.frozen {
                return None;
            }
            if data.items.is_empty() {
                None
            } else {
                Some(data.items.remove(0))
            }
        };
        self.finish_mutation(&[]);
        removed
    }

    /// Insert an element at the front.
    pub fn unshift(&self, value: Value) {
        {
            let mut data = self.inner.write();
            if data.frozen {
                return;
            }
            data.items.insert(0, value.clone());
        }
        self.finish_mutation(std::slice::from_ref(&value));
    }

    /// Remove `delete_count` elements starting at `start` and insert
    /// `items` in their place. Out-of-range arguments are clamped.
    /// Returns the removed elements.
    pub fn splice(&self, start: usize, delete_count: usize, items: Vec<Value>) -> Vec<Value> {
        let removed = {
            let mut data = self.inner.write();
            if data.frozen {
                return Vec::new();
            }
            let len = data.items.len();
            let start = start.min(len);
            let end = start + delete_count.min(len - start);
            data.items.splice(start..end, items.iter().cloned()).collect()
        };
        self.finish_mutation(&items);
        removed
    }

    /// Sort in place with the given comparator.
    ///
    /// The elements are taken out of the container while the comparator
    /// runs, so no lock is held across user code.
    pub fn sort_by(&self, mut compare: impl FnMut(&Value, &Value) -> Ordering) {
        let mut taken = {
            let mut data = self.inner.write();
            if data.frozen {
                return;
            }
            std::mem::take(&mut data.items)
        };
        taken.sort_by(&mut compare);
        self.inner.write().items = taken;
        self.finish_mutation(&[]);
    }

    /// Reverse the sequence in place.
    pub fn reverse(&self) {
        {
            let mut data = self.inner.write();
            if data.frozen {
                return;
            }
            data.items.reverse();
        }
        self.finish_mutation(&[]);
    }

    /// Observe inserted elements and notify the container subject.
    /// Every adapter mutation funnels through here.
    fn finish_mutation(&self, inserted: &[Value]) {
        let observer = self.observer();
        if let Some(observer) = observer {
            for value in inserted {
                observe(value);
            }
            observer.dep().notify();
        }
    }

    /// Plain, untracked element read.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.read().items.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }

    /// Snapshot of the current elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.read().items.clone()
    }

    /// Extend the sequence to `len`, filling new slots with `Null`.
    /// Plain length extension: no observation, no notification.
    pub(crate) fn force_len(&self, len: usize) {
        let mut data = self.inner.write();
        if data.frozen {
            return;
        }
        if data.items.len() < len {
            data.items.resize(len, Value::Null);
        }
    }

    /// Freeze the array: mutators become silent no-ops and observation
    /// refuses to instrument it.
    pub fn freeze(&self) {
        self.inner.write().frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.read().frozen
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
    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn raw(&self) -> &RwLock<ArrayData> {
        &self.inner
    }
}

impl Default for ArrayRef {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Some(data) => f
                .debug_struct("ArrayRef")
                .field("len", &data.items.len())
                .field("observed", &data.observer.is_some())
                .finish(),
            None => f.write_str("ArrayRef(<locked>)"),
        }
    }
}

impl FromIterator<Value> for ArrayRef {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().collect())
    }
}
