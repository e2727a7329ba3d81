//! Engine configuration handed to every enforcer

use crate::contract::CheckSwitches;
use crate::reporter::{Reporter, TracingReporter};
use covenant_interpreter::{
    ExpressionCache, ExpressionInterpreter, Interpreter, KeywordSubstitutions, ScriptBackend,
};
use std::fmt;
use std::sync::Arc;

/// Creates a fresh interpreter for each enforcer
pub type InterpreterFactory = Arc<dyn Fn() -> Box<dyn ExpressionInterpreter> + Send + Sync>;

/// What an enforcer does with a failed test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureHandling {
    /// Return a contract violation to the caller
    #[default]
    Raise,
    /// Report the failure at `Error` and carry on
    Report,
}

/// Factory for the built-in script interpreter; all interpreters made by
/// one factory share a parse cache
pub fn script_interpreter_factory() -> InterpreterFactory {
    let cache = ExpressionCache::default();
    Arc::new(move || {
        Box::new(Interpreter::new(ScriptBackend::with_cache(cache.clone())))
            as Box<dyn ExpressionInterpreter>
    })
}

/// Shared engine settings. Cheap to clone.
#[derive(Clone)]
pub struct Configuration {
    pub switches: Arc<CheckSwitches>,
    pub reporter: Arc<dyn Reporter>,
    pub interpreter_factory: InterpreterFactory,
    pub failure_handling: FailureHandling,
    /// Attach a backtrace to raised violations
    pub include_stack_trace: bool,
    pub empty_expressions_valid: bool,
    /// Entries added on top of the interpreter's defaults
    pub keyword_substitutions: KeywordSubstitutions,
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            switches: Arc::new(CheckSwitches::new()),
            reporter: Arc::new(TracingReporter::new()),
            interpreter_factory: script_interpreter_factory(),
            failure_handling: FailureHandling::Raise,
            include_stack_trace: false,
            empty_expressions_valid: false,
            keyword_substitutions: KeywordSubstitutions::empty(),
        }
    }

    pub fn with_switches(mut self, switches: Arc<CheckSwitches>) -> Self {
        self.switches = switches;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_interpreter_factory(mut self, factory: InterpreterFactory) -> Self {
        self.interpreter_factory = factory;
        self
    }

    pub fn with_failure_handling(mut self, failure_handling: FailureHandling) -> Self {
        self.failure_handling = failure_handling;
        self
    }

    pub fn with_stack_trace(mut self, include: bool) -> Self {
        self.include_stack_trace = include;
        self
    }

    pub fn with_empty_expressions_valid(mut self, valid: bool) -> Self {
        self.empty_expressions_valid = valid;
        self
    }

    pub fn with_keyword_substitution(
        mut self,
        keyword: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        self.keyword_substitutions.insert(keyword, symbol);
        self
    }

    /// Build an interpreter with this configuration's policies applied
    pub fn new_interpreter(&self) -> Box<dyn ExpressionInterpreter> {
        let mut interpreter = (self.interpreter_factory)();
        interpreter.set_treat_empty_as_valid(self.empty_expressions_valid);
        if !self.keyword_substitutions.is_empty() {
            interpreter.add_keyword_substitutions(&self.keyword_substitutions);
        }
        interpreter
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("switches", &self.switches)
            .field("reporter_threshold", &self.reporter.threshold())
            .field("failure_handling", &self.failure_handling)
            .field("include_stack_trace", &self.include_stack_trace)
            .field("empty_expressions_valid", &self.empty_expressions_valid)
            .field("keyword_substitutions", &self.keyword_substitutions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::TestContext;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.failure_handling, FailureHandling::Raise);
        assert!(!config.include_stack_trace);
        assert!(!config.empty_expressions_valid);
        assert!(config.keyword_substitutions.is_empty());
    }

    #[test]
    fn test_new_interpreter_applies_policies() {
        let config = Configuration::new()
            .with_empty_expressions_valid(true)
            .with_keyword_substitution("$self", "this");
        let interpreter = config.new_interpreter();
        assert!(interpreter.treat_empty_as_valid());
        assert_eq!(interpreter.keyword_substitutions().get("$self"), Some("this"));
        assert_eq!(interpreter.keyword_substitutions().get("$this"), Some("this"));
    }

    #[test]
    fn test_interpreters_are_independent() {
        let config = Configuration::new();
        let mut a = config.new_interpreter();
        let b = config.new_interpreter();
        a.bind_symbol("x", covenant_core::Value::from(1));
        assert!(b.lookup_symbol("x").is_none());
        assert!(a.evaluate("x == 1", &TestContext::new("f")).passed());
    }
}
