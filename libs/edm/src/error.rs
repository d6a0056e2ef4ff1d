//! Error types for EDM model construction

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("Invalid base type: {0}")]
    InvalidBaseType(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid property: {0}")]
    InvalidProperty(String),

    #[error("Invalid bag property: {0}")]
    InvalidBag(String),

    #[error("Invalid entity container item: {0}")]
    InvalidContainerItem(String),

    #[error("Invalid association set: {0}")]
    InvalidAssociation(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
