//! Management plane error types

use thiserror::Error;

/// Errors returned by a management plane client
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("More than one entity matches: {0}")]
    Ambiguous(String),

    #[error("Entity is still in use: {0}")]
    Conflict(String),

    #[error("Task {task} failed: {message}")]
    TaskFailed { task: String, message: String },

    #[error("Invalid API version: {0}")]
    InvalidVersion(String),

    #[error("Inventory error: {0}")]
    InventoryError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
