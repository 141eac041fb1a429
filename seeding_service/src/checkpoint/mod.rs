// seeding_service/src/checkpoint/mod.rs

pub mod checkpoint;
pub mod checkpoint_store;

pub use checkpoint::{SeedOptions, SeedPhase, SnomedSeedCheckpoint, SnomedSeedStatus, CHECKPOINT_FILE_NAME};
pub use checkpoint_store::CheckpointStore;
