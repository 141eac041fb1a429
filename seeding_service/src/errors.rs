// seeding_service/src/errors.rs

use models::errors::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Graph call failed: {0}")]
    Graph(#[from] GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the process shutdown flag interrupts a stream; the
    /// pipeline rewrites it to the paused result path.
    #[error("Operation cancelled")]
    Cancelled,
}
