use thiserror::Error;

use crate::query::executor::result::QueryError;

/// Validation errors that can occur while checking values against a schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Type mismatch for column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },
    #[error("NULL value not allowed for non-nullable column {0}")]
    NullValueNotAllowed(String),
    #[error("Value too long for column {column}: {actual} > {max}")]
    ValueTooLong {
        column: String,
        max: usize,
        actual: usize,
    },
    #[error("Row has {actual} values but table has {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },
}

/// Type validation result
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for QueryError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NullValueNotAllowed(column) => QueryError::NotNullViolation(column),
            ValidationError::ValueTooLong { column, max, actual } => QueryError::ValueTooLong { column, max, actual },
            ValidationError::TypeMismatch { .. } => QueryError::TypeError(err.to_string()),
            ValidationError::ArityMismatch { .. } => QueryError::ValidationError(err.to_string()),
        }
    }
}
