//! Error types for value operations

use thiserror::Error;

/// Error type for value operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Type mismatch error
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError {
        expected: &'static str,
        actual: &'static str,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for list of length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    /// Key or field not found
    #[error("No property '{key}' on {owner}")]
    KeyNotFound { key: String, owner: String },

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,
}

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;
