use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FindingsError {
    #[error("Enhanced extraction failed: {0}")]
    Enhancement(String),

    #[error("Enhanced extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Device database error: {0}")]
    DeviceDatabase(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FindingsError>;
