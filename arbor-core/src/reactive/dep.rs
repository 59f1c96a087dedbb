//! Dependency Subjects
//!
//! A `Dep` is a change-notification broadcaster bound to one data
//! location: either a single reactive object slot, or a whole container
//! (the observer's own subject, notified on shape changes and sequence
//! mutations).
//!
//! # Registration is double-dispatch
//!
//! `depend` does not append to the subscriber list itself. It hands this
//! subject to the active subscriber's `add_dependency`, and the
//! subscriber decides (using its own per-pass bookkeeping keyed by the
//! subject id) whether to call back into [`Dep::add_sub`]. The subject
//! therefore needs no per-pass state of its own, and each
//! (subscriber, subject) pair is appended at most once per tracking pass.
//!
//! # Notification is snapshot-ordered
//!
//! `notify` clones the current subscriber list before invoking anyone, so
//! a subscriber's synchronous side effects may add or remove
//! subscriptions, on this subject or others, without invalidating the
//! iteration or skipping anyone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::context::TrackingContext;
use super::subscriber::{Subscriber, SubscriberId};

/// Counter for generating unique subject IDs.
static DEP_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique subject ID.
fn next_dep_id() -> u64 {
    DEP_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Subscribers are held weakly: a subject never keeps a computation
/// alive, so there is no cycle between observed data and the things
/// watching it. Most slots have very few subscribers, hence the inline
/// capacity.
type SubscriberList = SmallVec<[(SubscriberId, Weak<dyn Subscriber>); 2]>;

/// A change-notification broadcaster for one data location.
pub struct Dep {
    /// Unique identifier, used for per-pass de-duplication by
    /// subscribers and for cycle guards in deep traversal.
    id: u64,

    /// Registered subscribers, in registration order. Duplicates are
    /// tolerated at this layer; de-duplication is the subscriber's
    /// responsibility per tracking pass.
    subscribers: RwLock<SubscriberList>,
}

impl Dep {
    pub fn new() -> Self {
        Self {
            id: next_dep_id(),
            subscribers: RwLock::new(SmallVec::new()),
        }
    }

    /// The subject's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Register the currently active subscriber, if there is one.
    ///
    /// Delegates to the subscriber's `add_dependency`, which de-duplicates
    /// per pass and calls [`Dep::add_sub`] back for first-time reads.
    pub fn depend(this: &Arc<Dep>) {
        if let Some(subscriber) = TrackingContext::current() {
            subscriber.add_dependency(this);
        }
    }

    /// Raw append. Called by subscribers from `add_dependency`.
    pub fn add_sub(&self, subscriber: &Arc<dyn Subscriber>) {
        self.subscribers
            .write()
            .push((subscriber.id(), Arc::downgrade(subscriber)));
    }

    /// Remove every registration for `id`. Called by subscribers on
    /// teardown.
    pub fn remove_sub(&self, id: SubscriberId) {
        self.subscribers
            .write()
            .retain(|(sub_id, _)| *sub_id != id);
    }

    /// Notify every registered subscriber, in registration order.
    ///
    /// Takes a stable snapshot first: updates run with no lock held and
    /// may freely re-enter the engine.
    pub fn notify(&self) {
        let snapshot: SubscriberList = self.subscribers.read().clone();

        let mut saw_dead = false;
        for (_, weak) in &snapshot {
            match weak.upgrade() {
                Some(subscriber) => subscriber.update(),
                None => saw_dead = true,
            }
        }

        // Dropped-without-teardown subscribers get pruned here rather
        // than accumulating forever.
        if saw_dead {
            self.subscribers
                .write()
                .retain(|(_, weak)| weak.strong_count() > 0);
        }
    }

    /// The number of current registrations (including duplicates).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
