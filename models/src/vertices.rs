use std::collections::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    identifiers::{Identifier, SerializableUuid},
    properties::{PropertyMap, PropertyValue},
};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: SerializableUuid,
    pub label: Identifier,
    pub properties: HashMap<String, PropertyValue>,
}

impl Vertex {
    pub fn new(label: Identifier) -> Self {
        use uuid::Uuid;
        Vertex {
            id: SerializableUuid(Uuid::new_v4()),
            label,
            properties: HashMap::new(),
        }
    }

    pub fn new_with_id(id: impl Into<SerializableUuid>, label: Identifier) -> Self {
        Vertex {
            id: id.into(),
            label,
            properties: HashMap::new(),
        }
    }

    pub fn label(&self) -> &Identifier {
        &self.label
    }

    pub fn id(&self) -> &SerializableUuid {
        &self.id
    }

    pub fn add_property(&mut self, key: &str, value: &str) {
        self.properties.insert(key.to_string(), PropertyValue::String(value.to_string()));
    }

    pub fn set_property(&mut self, key: &str, value: PropertyValue) {
        self.properties.insert(key.to_string(), value);
    }

    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
            .and_then(|prop_val| {
                match prop_val {
                    PropertyValue::String(s) => Some(s.as_str()),
                    _ => None,
                }
            })
    }

    /// Overlays `props` onto the existing property map.
    pub fn merge_properties(&mut self, props: &PropertyMap) {
        for (key, value) in props {
            self.properties.insert(key.clone(), value.clone());
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Vertex::new(Identifier::new("Vertex".to_string()).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get_string_property() {
        let mut v = Vertex::new(Identifier::new("SnomedConcept".to_string()).unwrap());
        v.add_property("conceptId", "138875005");
        assert_eq!(v.get_property("conceptId"), Some("138875005"));
        assert_eq!(v.get_property("missing"), None);
    }

    #[test]
    fn merge_overwrites_existing_slots() {
        let mut v = Vertex::new(Identifier::new("SnomedConcept".to_string()).unwrap());
        v.add_property("fsn", "Old name (disorder)");

        let mut props = PropertyMap::new();
        props.insert("fsn".to_string(), PropertyValue::from("New name (disorder)"));
        props.insert("preferredTerm".to_string(), PropertyValue::from("New name"));
        v.merge_properties(&props);

        assert_eq!(v.get_property("fsn"), Some("New name (disorder)"));
        assert_eq!(v.get_property("preferredTerm"), Some("New name"));
    }
}
