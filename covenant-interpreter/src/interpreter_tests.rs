use super::*;
use covenant_core::ObjectRef;
use pretty_assertions::assert_eq;

fn context() -> TestContext {
    TestContext::new("Account.ctor")
}

fn interpreter() -> ScriptInterpreter {
    let mut interpreter = ScriptInterpreter::script();
    interpreter.bind_symbol(
        "this",
        Value::from(
            ObjectRef::new("Account")
                .with_field("name", "foo")
                .with_field("i", 2),
        ),
    );
    interpreter
}

#[test]
fn test_keyword_expression_passes() {
    let mut interpreter = interpreter();
    let result = interpreter.evaluate("$this.name.length() > 0 && $this.i > 1", &context());
    assert!(result.passed(), "{:?}", result);
}

#[test]
fn test_false_result_has_message() {
    let mut interpreter = interpreter();
    let result = interpreter.evaluate("$this.i > 5", &context());
    assert!(!result.passed());
    assert!(result.failure_cause().is_none());
    assert_eq!(result.message(), Some("Test \"$this.i > 5\" returned false."));
}

#[test]
fn test_empty_expression_policy() {
    let mut interpreter = interpreter();
    assert!(!interpreter.treat_empty_as_valid());
    assert!(!interpreter.evaluate("  ", &context()).passed());

    interpreter.set_treat_empty_as_valid(true);
    assert!(interpreter.evaluate("", &context()).passed());
}

#[test]
fn test_unparsable_expression_has_cause() {
    let mut interpreter = interpreter();
    let result = interpreter.evaluate("$this.i >", &context());
    assert!(!result.passed());
    assert!(result.failure_cause().is_some());
    assert!(result
        .message()
        .unwrap_or_default()
        .starts_with("Failed to evaluate test"));
}

#[test]
fn test_non_boolean_result() {
    let mut interpreter = interpreter();
    let result = interpreter.evaluate("$this.i + 1", &context());
    assert!(!result.passed());
    assert_eq!(
        result.message(),
        Some("Test returned \"integer\", instead of boolean.")
    );
}

#[test]
fn test_undefined_symbol_fails_softly() {
    let mut interpreter = interpreter();
    let result = interpreter.evaluate("missing > 1", &context());
    assert!(!result.passed());
    let cause = result.failure_cause().map(|c| c.to_string());
    assert_eq!(cause.as_deref(), Some("Undefined symbol: missing"));
}

#[test]
fn test_capture_old_value() {
    let mut interpreter = interpreter();
    assert_eq!(
        interpreter.capture_old_value("$this.i", &context()).unwrap(),
        Value::from(2)
    );
    let err = interpreter.capture_old_value("$this.nope", &context()).unwrap_err();
    assert!(!err.passed());
    assert!(err.failure_cause().is_some());
    assert!(interpreter.capture_old_value("", &context()).is_err());
}

#[test]
fn test_custom_keyword_substitutions() {
    let mut interpreter = interpreter();
    let mut extra = KeywordSubstitutions::empty();
    extra.insert("$self", "this");
    interpreter.add_keyword_substitutions(&extra);
    assert!(interpreter.evaluate("$self.i == 2", &context()).passed());
    assert_eq!(interpreter.keyword_substitutions().get("$this"), Some("this"));
}

#[test]
fn test_bind_and_unbind() {
    let mut interpreter = interpreter();
    interpreter.bind_symbol("x", Value::from(1));
    assert_eq!(interpreter.lookup_symbol("x"), Some(Value::from(1)));
    interpreter.unbind_symbol("x");
    interpreter.unbind_symbol("x");
    assert_eq!(interpreter.lookup_symbol("x"), None);
}

#[test]
fn test_oversized_chain_fails_softly() {
    let mut interpreter = ScriptInterpreter::script();
    let expression = vec!["true"; 10_000].join(" && ");
    let result = interpreter.evaluate(&expression, &context());
    assert!(!result.passed());
    let cause = result.failure_cause().map(|c| c.to_string()).unwrap_or_default();
    assert!(cause.contains("Maximum parsing depth exceeded"), "{}", cause);

    let chain = format!("$this{}", ".name".repeat(10_000));
    assert!(interpreter.capture_old_value(&chain, &context()).is_err());
}
