use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid field key: {0:?}")]
    InvalidFieldKey(String),
    #[error("field {0} is declared more than once")]
    DuplicateField(String),
    #[error("failed to parse form schema: {0}")]
    SchemaParse(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
