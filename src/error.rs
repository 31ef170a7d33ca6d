//! Error types for taskmate
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (validation failure, bad args, bad config)
//! - 4: Operation failed (storage, serialization, locking)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskmate CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskmate operations
#[derive(Error, Debug)]
pub enum Error {
    // Validation failures (exit code 2)
    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Category key cannot be empty")]
    EmptyCategoryKey,

    #[error("Category already exists: {0}")]
    DuplicateCategory(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Stored tasks in {key} cannot be read: {reason}")]
    UnreadableSlot { key: String, reason: String },

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::EmptyTitle
            | Error::EmptyCategoryKey
            | Error::DuplicateCategory(_)
            | Error::TaskNotFound(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::UnreadableSlot { .. }
            | Error::LockFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Whether this is a validation failure raised by a lifecycle operation.
    ///
    /// Validation failures abort the operation before any state change.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyTitle | Error::EmptyCategoryKey | Error::DuplicateCategory(_)
        )
    }

    /// Structured context for machine-readable output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::DuplicateCategory(key) => Some(serde_json::json!({ "key": key })),
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::UnreadableSlot { key, .. } => Some(serde_json::json!({ "key": key })),
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            _ => None,
        }
    }
}

/// Result type alias for taskmate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
