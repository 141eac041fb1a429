// models/src/lib.rs

pub mod edges;
pub mod errors;
pub mod graph;
pub mod identifiers;
pub mod properties;
pub mod vertices;

pub use edges::Edge;
pub use errors::{GraphError, GraphResult, ValidationError, ValidationResult};
pub use graph::Graph;
pub use identifiers::{Identifier, SerializableUuid};
pub use properties::{PropertyMap, PropertyValue, SerializableFloat};
pub use vertices::Vertex;
