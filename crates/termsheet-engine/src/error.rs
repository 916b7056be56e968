//! Engine error types.
//!
//! Invalid input and failed calculations are reported through the edit
//! cycle's outcomes, never as errors. These types cover API misuse and
//! collaborator setup failures only.

use thiserror::Error;

use termsheet_model::ModelError;
use termsheet_persistence::PersistenceError;

use crate::collab::FieldHandle;

/// Field store misuse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("field {0} is already registered")]
    DuplicateField(String),
    #[error("field {0} is not registered")]
    UnknownField(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("field {0} is calculated and cannot be edited")]
    ReadOnlyField(String),

    #[error("no field is bound to view handle {0}")]
    UnknownHandle(FieldHandle),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("failed to parse engine config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("document generation failed: {0}")]
    Document(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
