//! Reactive Engine
//!
//! This module implements the dependency-tracking core: observation
//! records, dependency subjects, accessor bindings, programmatic shape
//! mutation, and deep traversal.
//!
//! # Concepts
//!
//! ## Observation
//!
//! [`observe`] attaches a per-container record to an eligible container.
//! Attaching converts object slots into reactive accessor bindings and
//! recursively observes array elements. From then on, reads against the
//! container can be tracked and writes notify.
//!
//! ## Subjects
//!
//! A [`Dep`] is bound to one data location: an object slot, or a whole
//! container. Reading the location while a subscriber is active registers
//! the subscriber; changing the location notifies everyone registered, in
//! registration order, synchronously.
//!
//! ## Subscribers
//!
//! The engine does not define computations. Anything implementing
//! [`Subscriber`] (a watcher, a render pass) can push itself onto the
//! tracking context, evaluate, and be re-run when what it read changes.
//!
//! # Implementation Notes
//!
//! The tracking context is a thread-local stack, so nested evaluations
//! attribute reads to the innermost subscriber and restore the outer one
//! when they finish. Notification is fully synchronous; any batching or
//! scheduling policy belongs to the subscriber layer, not here.

pub(crate) mod accessor;
mod context;
mod dep;
mod mutate;
mod observer;
#[cfg(test)]
pub(crate) mod probe;
mod subscriber;
mod traverse;

pub use accessor::define_reactive;
pub use context::TrackingContext;
pub use dep::Dep;
pub use mutate::{del, set, Key};
pub use observer::{observe, observe_root, toggle_observing, Observer};
pub use subscriber::{Subscriber, SubscriberId};
pub use traverse::traverse;
