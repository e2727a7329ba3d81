//! Error types for expression evaluation

use covenant_core::ValueError;
use covenant_parser::ParseError;
use thiserror::Error;

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating a test expression
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// The expression text did not parse
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Symbol not bound in the evaluation scope
    #[error("Undefined symbol: {0}")]
    UndefinedSymbol(String),

    /// Operand of the wrong type
    #[error("Type error: {0}")]
    TypeError(String),

    /// No such method for the receiver type
    #[error("Unknown method '{method}' on {receiver}")]
    UnknownMethod {
        method: String,
        receiver: &'static str,
    },

    /// Wrong number of method arguments
    #[error("Method '{method}' expects {expected} argument(s), got {actual}")]
    ArityError {
        method: String,
        expected: usize,
        actual: usize,
    },

    /// Integer arithmetic overflowed
    #[error("Integer overflow in '{0}'")]
    Overflow(&'static str),

    /// Value-level failure (missing property, bad index, division by zero)
    #[error(transparent)]
    Value(#[from] ValueError),

    /// The expression produced something other than a boolean
    #[error("Expression returned {actual}, not a boolean")]
    NonBoolean { actual: &'static str },

    /// Failure reported by a custom backend
    #[error("{0}")]
    Backend(String),
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::TypeError(message.into())
    }
}
