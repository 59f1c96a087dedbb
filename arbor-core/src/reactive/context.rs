//! Tracking Context
//!
//! The tracking context records which subscriber is currently evaluating.
//! This is what makes dependency collection transparent: when a reactive
//! slot is read, the slot's subject asks the context for the active
//! subscriber and registers it.
//!
//! # Implementation
//!
//! A thread-local stack of subscriber handles. Entering a context pushes;
//! the returned guard pops on drop. The stack discipline is what makes
//! re-entrant evaluation correct: an update triggered synchronously inside
//! another evaluation attributes its reads to the *inner* subscriber while
//! it runs, then restores the outer one.

use std::cell::RefCell;
use std::sync::Arc;

use super::subscriber::{Subscriber, SubscriberId};

thread_local! {
    static TARGET_STACK: RefCell<Vec<Arc<dyn Subscriber>>> = RefCell::new(Vec::new());
}

/// Guard that marks a subscriber as the active one for the duration of
/// its evaluation pass.
///
/// The guard pops the stack when dropped, so the context stays balanced
/// even if the evaluation panics.
pub struct TrackingContext {
    subscriber_id: SubscriberId,
}

impl TrackingContext {
    /// Enter a tracking pass for the given subscriber.
    ///
    /// While the returned guard is alive, every read of a reactive slot
    /// registers `subscriber` on the slot's subject.
    pub fn enter(subscriber: Arc<dyn Subscriber>) -> Self {
        let subscriber_id = subscriber.id();
        TARGET_STACK.with(|stack| {
            stack.borrow_mut().push(subscriber);
        });
        Self { subscriber_id }
    }

    /// Check whether any subscriber is currently active.
    pub fn is_active() -> bool {
        TARGET_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// The currently active subscriber, if any.
    pub fn current() -> Option<Arc<dyn Subscriber>> {
        TARGET_STACK.with(|stack| stack.borrow().last().cloned())
    }
}

impl Drop for TrackingContext {
    fn drop(&mut self) {
        TARGET_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Verify we're popping the right subscriber. This catches
            // mismatched guard lifetimes early.
            if let Some(subscriber) = popped {
                debug_assert_eq!(
                    subscriber.id(),
                    self.subscriber_id,
                    "TrackingContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id,
                    subscriber.id()
                );
            }
        });
    }
}
