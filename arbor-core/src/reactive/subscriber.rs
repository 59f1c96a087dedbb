//! Subscriber contract for the reactive engine.
//!
//! A Subscriber is any unit of computation that depends on observed data:
//! a watcher, a render computation, anything that wants to be re-run when
//! the data it read changes. The engine never owns subscribers, it only
//! notifies them, so the contract is a trait implemented outside this
//! crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::dep::Dep;

/// Unique identifier for a subscriber.
///
/// Each subscriber gets a unique ID when created. Subjects use it to
/// remove a subscriber on teardown, and subscribers use their own ID for
/// per-pass de-duplication bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation that depends on reactive data.
///
/// The engine talks to subscribers through exactly three entry points:
///
/// - [`Subscriber::id`]: stable identity.
/// - [`Subscriber::add_dependency`]: called by a subject's registration
///   path while this subscriber is the active one. The implementation
///   must append itself to the subject at most once per tracking pass,
///   and must do so by calling [`Dep::add_sub`]; the subject itself
///   keeps no per-pass state.
/// - [`Subscriber::update`]: called synchronously by [`Dep::notify`].
///   May run arbitrary logic, including further reads and writes against
///   observed containers.
///
/// Pushing and popping the active-subscriber slot around an evaluation is
/// the subscriber's own responsibility, via
/// [`TrackingContext::enter`](super::TrackingContext::enter). So is
/// teardown: removing itself from every subject it registered on.
pub trait Subscriber: Send + Sync {
    fn id(&self) -> SubscriberId;

    /// Record that this subscriber read `dep` during the current pass.
    fn add_dependency(&self, dep: &Arc<Dep>);

    /// One of this subscriber's dependencies changed.
    fn update(&self);
}
