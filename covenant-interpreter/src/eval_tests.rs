use super::*;
use covenant_core::ObjectRef;

fn env() -> Environment {
    let mut env = Environment::new();
    env.define(
        "this",
        Value::from(
            ObjectRef::new("Account")
                .with_field("name", "foo")
                .with_field("i", 2),
        ),
    );
    env.define("name", Value::from("foo"));
    env.define("i", Value::from(2));
    env.define("xs", Value::List(vec![Value::from(1), Value::from(2), Value::from(3)]));
    env.define("nothing", Value::Null);
    env
}

fn eval(source: &str) -> EvalResult<Value> {
    let env = env();
    let expr = covenant_parser::parse(source)?;
    Evaluator::new(&env).eval(&expr)
}

fn truthy(source: &str) -> bool {
    match eval(source) {
        Ok(Value::Boolean(b)) => b,
        other => panic!("{} did not evaluate to a boolean: {:?}", source, other),
    }
}

#[test]
fn test_object_properties_and_methods() {
    assert!(truthy("this.name.length() > 0 && this.i > 1"));
    assert!(truthy("name != null && i > 0"));
    assert!(!truthy("this.i > 2"));
}

#[test]
fn test_short_circuit_skips_undefined_symbols() {
    assert!(!truthy("false && undefined_thing"));
    assert!(truthy("true || undefined_thing"));
    assert!(matches!(
        eval("true && undefined_thing"),
        Err(EvalError::UndefinedSymbol(name)) if name == "undefined_thing"
    ));
}

#[test]
fn test_numeric_equality_across_types() {
    assert!(truthy("1 == 1.0"));
    assert!(truthy("2 eq 2"));
    assert!(truthy("null == nothing"));
    assert!(truthy("'a' ne 'b'"));
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval("7 / 2").unwrap(), Value::Integer(3));
    assert_eq!(eval("7 % 4").unwrap(), Value::Integer(3));
    assert_eq!(eval("1 + 0.5").unwrap(), Value::Float(1.5));
    assert_eq!(eval("-i + 1").unwrap(), Value::Integer(-1));
    assert!(matches!(
        eval("1 / 0"),
        Err(EvalError::Value(ValueError::DivisionByZero))
    ));
    assert!(matches!(
        eval("9223372036854775807 + 1"),
        Err(EvalError::Overflow("+"))
    ));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("name + '-' + i").unwrap(), Value::from("foo-2"));
}

#[test]
fn test_comparisons() {
    assert!(truthy("'abc' < 'abd'"));
    assert!(truthy("1.5 ge 1"));
    assert!(matches!(eval("'a' < 1"), Err(EvalError::TypeError(_))));
}

#[test]
fn test_conditional() {
    assert_eq!(eval("i > 1 ? 'big' : 'small'").unwrap(), Value::from("big"));
    assert!(matches!(eval("i ? 1 : 2"), Err(EvalError::TypeError(_))));
}

#[test]
fn test_string_methods() {
    assert!(truthy("name.startsWith('f') && name.endsWith('o')"));
    assert!(truthy("name.contains('oo')"));
    assert!(truthy("name.toUpperCase() == 'FOO'"));
    assert!(truthy("'  x '.trim().equals('x')"));
    assert!(truthy("''.isEmpty()"));
}

#[test]
fn test_list_methods_and_index() {
    assert!(truthy("xs.size() == 3 && xs.contains(2)"));
    assert_eq!(eval("xs[0]").unwrap(), Value::Integer(1));
    assert_eq!(eval("xs.get(2)").unwrap(), Value::Integer(3));
    assert_eq!(eval("[1, 2] + [3]").unwrap().to_string(), "[1, 2, 3]");
    assert!(matches!(
        eval("xs[7]"),
        Err(EvalError::Value(ValueError::IndexOutOfBounds { index: 7, length: 3 }))
    ));
}

#[test]
fn test_method_errors() {
    assert!(matches!(
        eval("name.frobnicate()"),
        Err(EvalError::UnknownMethod { receiver: "string", .. })
    ));
    assert!(matches!(
        eval("name.contains()"),
        Err(EvalError::ArityError { expected: 1, actual: 0, .. })
    ));
    assert!(matches!(
        eval("nothing.length()"),
        Err(EvalError::Value(ValueError::InvalidOperation(_)))
    ));
}

#[test]
fn test_null_property_access_fails() {
    assert!(eval("nothing.name").is_err());
    assert!(matches!(
        eval("this.missing"),
        Err(EvalError::Value(ValueError::KeyNotFound { .. }))
    ));
}

#[test]
fn test_abs() {
    assert_eq!(eval("(-3).abs()").unwrap(), Value::Integer(3));
    assert_eq!(eval("(0 - 2.5).abs()").unwrap(), Value::Float(2.5));
}
