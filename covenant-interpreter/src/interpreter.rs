//! Policy layer turning backend outcomes into test results

use crate::backend::{ExpressionBackend, ScriptBackend};
use crate::error::EvalError;
use crate::keywords::KeywordSubstitutions;
use crate::test_result::TestResult;
use covenant_core::{TestContext, Value};
use tracing::{debug, trace};

/// Evaluates contract test expressions.
///
/// Implementations never panic and never return errors from `evaluate`:
/// every problem is folded into a failed [`TestResult`].
pub trait ExpressionInterpreter: Send {
    /// Evaluate a test expression within the bound scope
    fn evaluate(&mut self, test_expression: &str, context: &TestContext) -> TestResult;

    /// Evaluate an expression for its value, to be stored as an old value.
    /// The `Err` arm is a failed result carrying the reason.
    fn capture_old_value(
        &mut self,
        expression: &str,
        context: &TestContext,
    ) -> Result<Value, TestResult>;

    fn bind_symbol(&mut self, name: &str, value: Value);

    /// Remove a symbol; unbinding an unbound symbol is a no-op
    fn unbind_symbol(&mut self, name: &str);

    fn lookup_symbol(&self, name: &str) -> Option<Value>;

    fn treat_empty_as_valid(&self) -> bool;

    fn set_treat_empty_as_valid(&mut self, valid: bool);

    fn keyword_substitutions(&self) -> &KeywordSubstitutions;

    /// Add or override keyword substitutions
    fn add_keyword_substitutions(&mut self, substitutions: &KeywordSubstitutions);
}

/// Generic interpreter over any [`ExpressionBackend`]
#[derive(Debug)]
pub struct Interpreter<B> {
    backend: B,
    treat_empty_as_valid: bool,
    keywords: KeywordSubstitutions,
}

/// The interpreter for the built-in expression language
pub type ScriptInterpreter = Interpreter<ScriptBackend>;

impl<B: ExpressionBackend> Interpreter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            treat_empty_as_valid: false,
            keywords: KeywordSubstitutions::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl ScriptInterpreter {
    pub fn script() -> Self {
        Self::new(ScriptBackend::new())
    }
}

impl Default for ScriptInterpreter {
    fn default() -> Self {
        Self::script()
    }
}

impl<B: ExpressionBackend> ExpressionInterpreter for Interpreter<B> {
    fn evaluate(&mut self, test_expression: &str, context: &TestContext) -> TestResult {
        if test_expression.trim().is_empty() {
            return if self.treat_empty_as_valid {
                TestResult::pass()
            } else {
                TestResult::fail(format!(
                    "Empty test expression for \"{}\" is not allowed.",
                    context.item_name
                ))
            };
        }

        let expression = self.keywords.apply(test_expression);
        trace!(item = %context.item_name, expression = %expression, "evaluating test");

        match self.backend.evaluate_boolean(&expression) {
            Ok(true) => TestResult::pass(),
            Ok(false) => TestResult::fail(format!("Test \"{}\" returned false.", test_expression)),
            Err(EvalError::NonBoolean { actual }) => {
                debug!(item = %context.item_name, actual, "test returned a non-boolean value");
                TestResult::non_boolean(actual)
            }
            Err(err) => {
                debug!(item = %context.item_name, error = %err, "test could not be evaluated");
                TestResult::error(
                    format!(
                        "Failed to evaluate test \"{}\": {}",
                        test_expression, err
                    ),
                    err,
                )
            }
        }
    }

    fn capture_old_value(
        &mut self,
        expression: &str,
        context: &TestContext,
    ) -> Result<Value, TestResult> {
        if expression.trim().is_empty() {
            return Err(TestResult::fail(format!(
                "Empty old-value expression for \"{}\".",
                context.item_name
            )));
        }

        let expression_text = self.keywords.apply(expression);
        self.backend
            .evaluate_value(&expression_text)
            .map_err(|err| {
                debug!(item = %context.item_name, error = %err, "old value capture failed");
                TestResult::error(
                    format!(
                        "Failed to capture old value \"{}\": {}",
                        expression, err
                    ),
                    err,
                )
            })
    }

    fn bind_symbol(&mut self, name: &str, value: Value) {
        self.backend.bind_symbol(name, value);
    }

    fn unbind_symbol(&mut self, name: &str) {
        self.backend.unbind_symbol(name);
    }

    fn lookup_symbol(&self, name: &str) -> Option<Value> {
        self.backend.lookup_symbol(name)
    }

    fn treat_empty_as_valid(&self) -> bool {
        self.treat_empty_as_valid
    }

    fn set_treat_empty_as_valid(&mut self, valid: bool) {
        self.treat_empty_as_valid = valid;
    }

    fn keyword_substitutions(&self) -> &KeywordSubstitutions {
        &self.keywords
    }

    fn add_keyword_substitutions(&mut self, substitutions: &KeywordSubstitutions) {
        self.keywords.extend(substitutions);
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
