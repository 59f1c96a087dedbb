//! Watcher-shaped test double.
//!
//! Implements the full subscriber contract: per-pass de-duplication keyed
//! by subject id, raw-append registration through `Dep::add_sub`, and
//! explicit teardown. Unit tests across the engine share it instead of
//! each growing their own.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::context::TrackingContext;
use super::dep::Dep;
use super::subscriber::{Subscriber, SubscriberId};

type UpdateHook = Box<dyn Fn() + Send + Sync>;

pub(crate) struct Probe {
    id: SubscriberId,
    me: Weak<Probe>,
    deps: Mutex<Vec<Arc<Dep>>>,
    seen: Mutex<HashSet<u64>>,
    updates: AtomicUsize,
    on_update: Option<UpdateHook>,
}

impl Probe {
    pub(crate) fn new() -> Arc<Self> {
        Self::build(None)
    }

    /// A probe that runs `hook` on every update, after counting it.
    pub(crate) fn with_update(hook: impl Fn() + Send + Sync + 'static) -> Arc<Self> {
        Self::build(Some(Box::new(hook)))
    }

    fn build(on_update: Option<UpdateHook>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            id: SubscriberId::new(),
            me: me.clone(),
            deps: Mutex::new(Vec::new()),
            seen: Mutex::new(HashSet::new()),
            updates: AtomicUsize::new(0),
            on_update,
        })
    }

    /// Run one tracking pass.
    pub(crate) fn run(self: &Arc<Self>, pass: impl FnOnce()) {
        let _ctx = TrackingContext::enter(self.clone() as Arc<dyn Subscriber>);
        pass();
    }

    pub(crate) fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Distinct subjects this probe has registered on.
    pub(crate) fn dep_count(&self) -> usize {
        self.deps.lock().len()
    }

    /// Remove this probe from every subject it registered on.
    pub(crate) fn teardown(&self) {
        let deps = std::mem::take(&mut *self.deps.lock());
        for dep in deps {
            dep.remove_sub(self.id);
        }
        self.seen.lock().clear();
    }
}

impl Subscriber for Probe {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dependency(&self, dep: &Arc<Dep>) {
        if self.seen.lock().insert(dep.id()) {
            self.deps.lock().push(dep.clone());
            if let Some(me) = self.me.upgrade() {
                dep.add_sub(&(me as Arc<dyn Subscriber>));
            }
        }
    }

    fn update(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_update {
            hook();
        }
    }
}
