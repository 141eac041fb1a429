// models/src/properties.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// f64 does not implement `Eq` or `Hash` directly; compare and hash by bits.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializableFloat(pub f64);

impl PartialEq for SerializableFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}
impl Eq for SerializableFloat {}

impl PartialOrd for SerializableFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for SerializableFloat {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.to_bits().cmp(&other.0.to_bits())
    }
}
impl std::hash::Hash for SerializableFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Represents a generic property value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(SerializableFloat),
    String(String),
    Uuid(crate::identifiers::SerializableUuid),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self { PropertyValue::String(s) }
}
impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self { PropertyValue::String(s.to_string()) }
}
impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self { PropertyValue::Integer(i) }
}
impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self { PropertyValue::Float(SerializableFloat(f)) }
}
impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self { PropertyValue::Boolean(b) }
}
impl From<Uuid> for PropertyValue {
    fn from(u: Uuid) -> Self { PropertyValue::Uuid(u.into()) }
}

/// A map of property names to their values.
pub type PropertyMap = HashMap<String, PropertyValue>;
