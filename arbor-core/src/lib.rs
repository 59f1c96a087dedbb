//! Arbor Core
//!
//! This crate provides the core runtime for the Arbor reactive state
//! tree. It implements:
//!
//! - A dynamic value model for nested state (objects, arrays, primitives)
//! - Transparent dependency tracking: reads register the active
//!   subscriber, writes notify exactly the computations that read them
//! - Controlled shape mutation (`set`/`del`) and deep traversal
//!
//! The crate deliberately stops at the notification boundary: rendering,
//! template compilation, and subscriber scheduling are external
//! collaborators that interoperate through the [`Subscriber`] contract.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `value`: the container types observed trees are built from, the
//!   array mutation adapter, and JSON interchange
//! - `reactive`: observation records, dependency subjects, accessor
//!   bindings, programmatic mutators, and deep traversal
//!
//! # Example
//!
//! ```rust,ignore
//! use arbor_core::{observe, set, traverse, Value};
//! use serde_json::json;
//!
//! // Build a state tree and observe it.
//! let state = Value::from(json!({"count": 0, "items": [1, 2]}));
//! observe(&state);
//!
//! // Inside a subscriber's tracking pass, reads register dependencies:
//! let obj = state.as_object().unwrap();
//! let count = obj.get("count");
//!
//! // Writes notify every registered subscriber synchronously.
//! obj.set("count", Value::Int(1));
//!
//! // Keys that did not exist at observation time go through `set`.
//! set(&state, "fresh", Value::Bool(true));
//! ```

pub mod reactive;
pub mod value;

pub use reactive::{
    define_reactive, del, observe, observe_root, set, toggle_observing, traverse, Dep, Key,
    Observer, Subscriber, SubscriberId, TrackingContext,
};
pub use value::{same_value, ArrayRef, Getter, ObjectRef, RenderNode, Setter, Value, ValueError};
