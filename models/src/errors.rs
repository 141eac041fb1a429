use std::io;
pub use thiserror::Error;
use serde::{Serialize, Deserialize};
use serde_json::Error as SerdeJsonError;
use uuid::Error as UuidError;

use crate::identifiers::Identifier;

#[derive(Debug, Serialize, Deserialize, Error, Clone)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Invalid data provided: {0}")]
    InvalidData(String),
    #[error("An internal error occurred: {0}")]
    InternalError(String),
    #[error("entity with identifier {0} was not found")]
    NotFound(Identifier),
    #[error("Validation error: {0}")]
    Validation(ValidationError),
    #[error("UUID parsing or generation error: {0}")]
    Uuid(String),
}

impl From<&str> for GraphError {
    fn from(error: &str) -> Self {
        GraphError::InvalidData(error.to_string())
    }
}

impl From<io::Error> for GraphError {
    fn from(err: io::Error) -> Self {
        GraphError::Io(format!("IO error: {}", err))
    }
}

impl From<SerdeJsonError> for GraphError {
    fn from(err: SerdeJsonError) -> Self {
        GraphError::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<UuidError> for GraphError {
    fn from(err: UuidError) -> Self {
        GraphError::Uuid(format!("UUID error: {}", err))
    }
}

impl From<ValidationError> for GraphError {
    fn from(err: ValidationError) -> Self {
        GraphError::Validation(err)
    }
}

#[derive(Debug, Serialize, Deserialize, Error, PartialEq, Clone)]
pub enum ValidationError {
    #[error("invalid value provided")]
    InvalidValue,
    #[error("identifier '{0}' is invalid")]
    InvalidIdentifier(String),
    #[error("identifier has invalid length")]
    InvalidIdentifierLength,
    #[error("property with name {0} not found")]
    PropertyNotFound(Identifier),
    #[error("property has unexpected type, expected {0}, found {1}")]
    PropertyTypeMismatch(String, String),
}

/// A type alias for a `Result` that returns a `GraphError` on failure.
pub type GraphResult<T> = Result<T, GraphError>;

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
