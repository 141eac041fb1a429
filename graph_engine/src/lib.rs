// graph_engine/src/lib.rs

pub mod graph_service;
pub mod repository;

pub use graph_service::{GraphService, GRAPH_SERVICE};
pub use repository::{GraphRepository, PropertyFilter};
