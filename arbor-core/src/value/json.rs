//! Value ⇄ JSON Interchange
//!
//! Observed state trees are usually seeded from data that arrived as
//! JSON, and snapshots of them leave the same way. This module provides
//! the conversions: infallible construction of a `Value` tree from a
//! `serde_json::Value` (key order preserved), and fallible conversion
//! back. Serde's `Serialize`/`Deserialize` are layered on top of the two
//! conversions so a `Value` drops into any serde-based pipeline.
//!
//! Conversion back can fail in exactly three ways, all structural:
//! render nodes have no JSON form, non-finite floats have no JSON form,
//! and cyclic trees cannot be written out.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use thiserror::Error;

use super::{ArrayRef, ObjectRef, Value};

/// Errors produced when converting a `Value` tree to JSON.
#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    #[error("render nodes have no JSON representation")]
    RenderNode,
    #[error("non-finite number {0} has no JSON representation")]
    NonFiniteNumber(f64),
    #[error("cyclic structure cannot be serialized")]
    Cycle,
}

impl From<serde_json::Value> for Value {
    fn from(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                // u64 overflow and true floats both land here.
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Array(ArrayRef::from_values(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(entries) => {
                let obj = ObjectRef::new();
                for (key, raw) in entries {
                    obj.define(key, Value::from(raw));
                }
                Value::Object(obj)
            }
        }
    }
}

impl TryFrom<&Value> for serde_json::Value {
    type Error = ValueError;

    fn try_from(value: &Value) -> Result<Self, ValueError> {
        let mut path = Vec::new();
        to_json(value, &mut path)
    }
}

/// `path` holds the container ids on the way down; seeing one again means
/// the tree references itself. Shared (acyclic) subtrees are fine and are
/// written out once per occurrence.
fn to_json(value: &Value, path: &mut Vec<usize>) -> Result<serde_json::Value, ValueError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Int(n) => Ok(serde_json::Value::from(*n)),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .ok_or(ValueError::NonFiniteNumber(*n)),
        Value::Str(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Node(_) => Err(ValueError::RenderNode),
        Value::Array(arr) => {
            if path.contains(&arr.id()) {
                return Err(ValueError::Cycle);
            }
            path.push(arr.id());
            let mut out = Vec::with_capacity(arr.len());
            for item in arr.to_vec() {
                out.push(to_json(&item, path)?);
            }
            path.pop();
            Ok(serde_json::Value::Array(out))
        }
        Value::Object(obj) => {
            if path.contains(&obj.id()) {
                return Err(ValueError::Cycle);
            }
            path.push(obj.id());
            let mut out = serde_json::Map::new();
            for key in obj.keys() {
                // Untracked: serialization must not register dependencies.
                if let Some(item) = obj.get_untracked(&key) {
                    out.insert(key, to_json(&item, path)?);
                }
            }
            path.pop();
            Ok(serde_json::Value::Object(out))
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = serde_json::Value::try_from(self).map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from(raw))
    }
}
