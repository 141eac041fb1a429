// seeding_service/src/lib.rs

pub mod checkpoint;
pub mod config;
pub mod errors;
pub mod rf2;
pub mod seeding;

pub use checkpoint::*;
pub use config::SnomedConfig;
pub use errors::SeedError;
pub use rf2::*;
pub use seeding::*;
