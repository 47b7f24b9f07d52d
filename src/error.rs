//! Structured error types for store operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,
    GroupNotFound,

    // Data errors
    InvalidRow,

    // Backend errors
    DatabaseError,
}

/// Structured error returned by the task store.
///
/// Not-found targets are reported as `Ok(false)` / `Ok(None)` by the store
/// itself; this type carries the failures a caller has to react to.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl StoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn task_not_found(id: i64) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {}", id))
    }

    pub fn group_not_found(id: i64) -> Self {
        Self::new(ErrorCode::GroupNotFound, format!("Group not found: {}", id))
    }

    pub fn invalid_row(column: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRow,
            format!("Invalid value in column {}: {}", column, reason),
        )
        .with_field(column)
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    /// True when the backend rejected a statement.
    pub fn is_persistence(&self) -> bool {
        self.code == ErrorCode::DatabaseError
    }
}

/// Backend failures surface as persistence errors. The `{:#}` form keeps the
/// anyhow context chain in the message.
impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StoreError>() {
            Ok(store_err) => store_err,
            Err(err) => StoreError::database(format!("{:#}", err)),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
