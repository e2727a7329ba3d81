//! Outcome of evaluating one test expression

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Cause attached to a result when evaluation itself failed
pub type FailureCause = Arc<dyn Error + Send + Sync + 'static>;

/// Immutable result of a test evaluation.
///
/// `message` is present whenever the test did not pass; `failure_cause`
/// only when the expression could not be evaluated at all.
#[derive(Clone)]
pub struct TestResult {
    passed: bool,
    message: Option<String>,
    failure_cause: Option<FailureCause>,
}

impl TestResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            message: None,
            failure_cause: None,
        }
    }

    /// The expression evaluated to `false`
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
            failure_cause: None,
        }
    }

    /// The expression evaluated to something other than a boolean
    pub fn non_boolean(actual_type: &str) -> Self {
        Self::fail(format!(
            "Test returned \"{}\", instead of boolean.",
            actual_type
        ))
    }

    /// The expression could not be parsed or evaluated
    pub fn error<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            passed: false,
            message: Some(message.into()),
            failure_cause: Some(Arc::new(cause)),
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn failure_cause(&self) -> Option<&FailureCause> {
        self.failure_cause.as_ref()
    }
}

impl fmt::Debug for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResult")
            .field("passed", &self.passed)
            .field("message", &self.message)
            .field(
                "failure_cause",
                &self.failure_cause.as_ref().map(|cause| cause.to_string()),
            )
            .finish()
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, self.passed) {
            (_, true) => write!(f, "passed"),
            (Some(message), false) => write!(f, "failed: {}", message),
            (None, false) => write!(f, "failed"),
        }
    }
}
