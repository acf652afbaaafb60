use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("duplicate value for unique field {field}: {value}")]
    UniqueViolation { field: &'static str, value: String },

    #[error("candidate {id} already resolved as {resolution}")]
    AlreadyResolved { id: Uuid, resolution: String },

    #[error("record is missing an id")]
    MissingId,

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;
