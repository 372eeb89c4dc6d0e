//! Error types for paramsync

use thiserror::Error;

/// Result type alias for paramsync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for paramsync
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("File store error: {0}")]
    File(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
