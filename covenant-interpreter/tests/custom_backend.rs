//! The policy layer works over any backend, not only the built-in one

use covenant_core::{TestContext, Value};
use covenant_interpreter::{
    EvalError, EvalResult, ExpressionBackend, ExpressionInterpreter, Interpreter,
};
use std::collections::HashMap;

/// Backend whose only "language" is looking up a single bound symbol
#[derive(Default)]
struct LookupBackend {
    symbols: HashMap<String, Value>,
    evaluations: usize,
}

impl ExpressionBackend for LookupBackend {
    fn evaluate_value(&mut self, expression: &str) -> EvalResult<Value> {
        self.evaluations += 1;
        self.symbols
            .get(expression.trim())
            .cloned()
            .ok_or_else(|| EvalError::Backend(format!("no symbol {}", expression.trim())))
    }

    fn bind_symbol(&mut self, name: &str, value: Value) {
        self.symbols.insert(name.to_string(), value);
    }

    fn unbind_symbol(&mut self, name: &str) {
        self.symbols.remove(name);
    }

    fn lookup_symbol(&self, name: &str) -> Option<Value> {
        self.symbols.get(name).cloned()
    }
}

#[test]
fn keywords_are_substituted_before_the_backend_sees_them() {
    let mut interpreter = Interpreter::new(LookupBackend::default());
    interpreter.bind_symbol("result", Value::from(true));

    let result = interpreter.evaluate("$result", &TestContext::new("f"));
    assert!(result.passed(), "{:?}", result);
}

#[test]
fn backend_errors_become_failed_results() {
    let mut interpreter = Interpreter::new(LookupBackend::default());
    let result = interpreter.evaluate("flag", &TestContext::new("f"));
    assert!(!result.passed());
    assert_eq!(
        result.failure_cause().map(|c| c.to_string()).as_deref(),
        Some("no symbol flag")
    );
}

#[test]
fn empty_expressions_never_reach_the_backend() {
    let mut interpreter = Interpreter::new(LookupBackend::default());
    interpreter.set_treat_empty_as_valid(true);
    assert!(interpreter.evaluate("   ", &TestContext::new("f")).passed());
    assert_eq!(interpreter.backend().evaluations, 0);
}

#[test]
fn non_boolean_values_are_reported_by_type() {
    let mut interpreter = Interpreter::new(LookupBackend::default());
    interpreter.bind_symbol("n", Value::from("text"));
    let result = interpreter.evaluate("n", &TestContext::new("f"));
    assert_eq!(
        result.message(),
        Some("Test returned \"string\", instead of boolean.")
    );
}
