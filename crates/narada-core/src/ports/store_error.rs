//! Errors shared by the JSON-backed stores.

use thiserror::Error;

use crate::domain::PresetError;

/// Storage failure, independent of the file format behind it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entity with the same identifier already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Reading or writing the backing file failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The backing document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The document decoded but its values are not acceptable.
    #[error("Invalid document: {0}")]
    Invalid(String),

    #[error(transparent)]
    Preset(#[from] PresetError),
}
