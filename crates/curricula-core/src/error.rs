use thiserror::Error;

#[derive(Error, Debug)]
pub enum CurriculaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Regeneration error: {0}")]
    Regeneration(String),

    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, CurriculaError>;
