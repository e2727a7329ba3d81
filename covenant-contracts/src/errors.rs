//! Contract-related error types

use covenant_interpreter::FailureCause;
use thiserror::Error;

use crate::contract::CheckKind;

/// Main contract error type
#[derive(Error, Debug)]
pub enum ContractError {
    /// A contract test failed and the enforcer raises failures
    #[error("Contract violation: {0}")]
    Violation(#[from] ContractViolation),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] crate::configurator::ConfigError),
}

/// A failed contract test.
///
/// `message` is the fully composed report text; the remaining fields carry
/// the same information in structured form. When the test expression could
/// not be evaluated, the evaluation error is available through
/// [`std::error::Error::source`].
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ContractViolation {
    pub kind: CheckKind,
    pub item_name: String,
    pub file_name: String,
    pub line_number: u32,
    pub expression: String,
    pub message: String,
    /// Backtrace captured when the violation was raised, if enabled
    pub stack_trace: Option<String>,
    #[source]
    pub cause: Option<FailureCause>,
}

/// Result type for contract operations
pub type ContractResult<T> = Result<T, ContractError>;

impl ContractError {
    pub fn as_violation(&self) -> Option<&ContractViolation> {
        match self {
            ContractError::Violation(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_interpreter::EvalError;
    use std::error::Error as _;
    use std::sync::Arc;

    fn violation(cause: Option<FailureCause>) -> ContractViolation {
        ContractViolation {
            kind: CheckKind::Pre,
            item_name: "f".to_string(),
            file_name: "f.rs".to_string(),
            line_number: 3,
            expression: "x > 0".to_string(),
            message: "Precondition failed".to_string(),
            stack_trace: None,
            cause,
        }
    }

    #[test]
    fn test_display_wraps_message() {
        let err = ContractError::from(violation(None));
        assert_eq!(err.to_string(), "Contract violation: Precondition failed");
        assert_eq!(err.as_violation().map(|v| v.line_number), Some(3));
    }

    #[test]
    fn test_cause_is_chained() {
        let cause: FailureCause = Arc::new(EvalError::UndefinedSymbol("x".to_string()));
        let v = violation(Some(cause));
        assert_eq!(
            v.source().map(|s| s.to_string()).as_deref(),
            Some("Undefined symbol: x")
        );
        assert!(violation(None).source().is_none());
    }
}
