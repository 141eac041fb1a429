// server/src/routes/mod.rs

pub mod snomed_routes;

pub use snomed_routes::snomed_routes;
