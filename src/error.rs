//! Error types for tasknest
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (unknown category/task, name collision, bad limits or config)
//! - 4: Operation failed (I/O, serialization)
//!
//! Every error leaves the stores unmutated, so callers can surface it and
//! carry on.

use thiserror::Error;

/// Exit codes for the tasknest CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tasknest operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Category already exists: {0}")]
    DuplicateName(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Nothing scheduled: {0}")]
    NothingScheduled(String),

    #[error("Sample data already generated")]
    AlreadyGenerated,

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DuplicateName(_)
            | Error::CategoryNotFound(_)
            | Error::TaskNotFound(_)
            | Error::InvalidLimit(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::NothingScheduled(_)
            | Error::AlreadyGenerated => exit_codes::USER_ERROR,

            Error::Io(_) | Error::Json(_) | Error::TomlParse(_) | Error::TomlSerialize(_) => {
                exit_codes::OPERATION_FAILED
            }
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DuplicateName(_) => "duplicate_name",
            Error::CategoryNotFound(_) => "category_not_found",
            Error::TaskNotFound(_) => "task_not_found",
            Error::InvalidLimit(_) => "invalid_limit",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::InvalidConfig(_) => "invalid_config",
            Error::NothingScheduled(_) => "nothing_scheduled",
            Error::AlreadyGenerated => "already_generated",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::TomlParse(_) | Error::TomlSerialize(_) => "toml",
        }
    }

    /// Structured details for JSON output, when the error carries a subject.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::DuplicateName(name) | Error::CategoryNotFound(name) => {
                Some(serde_json::json!({ "category": name }))
            }
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task_id": id })),
            Error::InvalidLimit(message)
            | Error::InvalidArgument(message)
            | Error::InvalidConfig(message)
            | Error::NothingScheduled(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            _ => None,
        }
    }
}

/// Result type alias for tasknest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
