//! Check command implementation

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use covenant_contracts::{
    CheckKind, CheckState, ContractEnforcer, PropertiesConfigurator, PropertySource,
};
use covenant_core::{Instance, ObjectRef, TestContext, Value};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Pre,
    Post,
    Invariant,
}

impl From<KindArg> for CheckKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Pre => CheckKind::Pre,
            KindArg::Post => CheckKind::Post,
            KindArg::Invariant => CheckKind::Invariant,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub kind: KindArg,
    pub expression: String,
    pub this: Option<String>,
    pub this_type: String,
    pub before: Option<String>,
    pub args: Vec<String>,
    pub result: Option<String>,
    pub item: String,
    pub properties: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct Outcome {
    pub kind: CheckKind,
    pub item: String,
    pub expression: String,
    pub state: CheckState,
    pub passed: bool,
    pub message: Option<String>,
    pub config_errors: Vec<String>,
}

impl Outcome {
    /// Whether the check ended in a raised violation
    pub fn violated(&self) -> bool {
        self.state == CheckState::Raised
    }
}

/// Parse JSON, falling back to a plain string for bare words
pub fn parse_json_value(text: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from_json)
        .unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Parse a `name=<json>` argument
pub fn parse_arg(spec: &str) -> Result<Instance> {
    let (name, json) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("argument \"{}\" must look like name=<json>", spec))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("argument \"{}\" has an empty name", spec));
    }
    Ok(Instance::new(name, parse_json_value(json)))
}

/// JSON objects become live objects so that old values behave as they do
/// for real subjects
pub fn subject(json: &str, type_name: &str) -> Instance {
    match parse_json_value(json) {
        Value::Map(fields) => Instance::new("", ObjectRef::from_fields(type_name, fields)),
        other => Instance::new("", other),
    }
}

/// Environment first, then the properties file, then the TOML file; later
/// definitions win
pub fn load_properties(args: &CheckArgs) -> Result<PropertySource> {
    let mut source = PropertySource::from_env();
    for path in [&args.properties, &args.config].into_iter().flatten() {
        let loaded = PropertySource::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?;
        debug!(path = %path.display(), entries = loaded.len(), "loaded configuration");
        source.merge(loaded);
    }
    Ok(source)
}

pub fn run(args: &CheckArgs) -> Result<Outcome> {
    let source = load_properties(args)?;
    let configured = PropertiesConfigurator::global().configure(&source);
    let mut enforcer = ContractEnforcer::new(configured.configuration);

    let method_args = args
        .args
        .iter()
        .map(|spec| parse_arg(spec))
        .collect::<Result<Vec<_>>>()?;
    let mut context = TestContext::new(args.item.clone()).with_args(method_args);
    context.instance = args.this.as_deref().map(|json| subject(json, &args.this_type));

    let kind = CheckKind::from(args.kind);
    let expression = args.expression.as_str();
    let checked = match kind {
        CheckKind::Pre => enforcer.check_pre(&context, expression),
        CheckKind::Invariant => enforcer.check_invariant(&context, expression),
        CheckKind::Post => {
            match args.before.as_deref() {
                Some(before) => {
                    let current = context.instance.replace(subject(before, &args.this_type));
                    enforcer.capture_old_values_for(&mut context, expression);
                    context.instance = current;
                }
                None => enforcer.capture_old_values_for(&mut context, expression),
            }
            if let Some(result) = args.result.as_deref() {
                context.set_result(Instance::new("result", parse_json_value(result)));
            }
            enforcer.check_post(&context, expression)
        }
    };

    Ok(Outcome {
        kind,
        item: args.item.clone(),
        expression: args.expression.clone(),
        state: enforcer.state(),
        passed: checked.is_ok(),
        message: checked.err().map(|e| e.to_string()),
        config_errors: configured.errors.iter().map(ToString::to_string).collect(),
    })
}

pub fn print(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    let verdict = match outcome.state {
        CheckState::NotStarted => "SKIPPED",
        CheckState::Reported => "REPORTED",
        _ if outcome.passed => "PASSED",
        _ => "FAILED",
    };
    println!("{} {} \"{}\": {}", verdict, outcome.kind, outcome.item, outcome.expression);
    if let Some(message) = &outcome.message {
        println!("  {}", message);
    }
    for error in &outcome.config_errors {
        println!("  config: {}", error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(kind: KindArg, expression: &str) -> CheckArgs {
        CheckArgs {
            kind,
            expression: expression.to_string(),
            this: None,
            this_type: "Object".to_string(),
            before: None,
            args: Vec::new(),
            result: None,
            item: "cli".to_string(),
            properties: None,
            config: None,
        }
    }

    #[test]
    fn test_parse_arg() {
        let arg = parse_arg("n=3").unwrap();
        assert_eq!(arg.name, "n");
        assert_eq!(arg.value, Value::Integer(3));

        assert_eq!(parse_arg("s=hello").unwrap().value, Value::from("hello"));
        assert!(parse_arg("novalue").is_err());
        assert!(parse_arg("=3").is_err());
    }

    #[test]
    fn test_object_subject() {
        let this = subject(r#"{"name": "foo", "i": 2}"#, "Foo");
        assert_eq!(this.type_name, "Foo");
        assert_eq!(this.value.property("i").unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_pre_pass_and_fail() {
        let mut check = args(KindArg::Pre, "n > 0");
        check.args = vec!["n=3".to_string()];
        let outcome = run(&check).unwrap();
        assert!(outcome.passed);
        assert!(!outcome.violated());

        check.args = vec!["n=-3".to_string()];
        let outcome = run(&check).unwrap();
        assert!(outcome.violated());
        assert!(outcome.message.unwrap_or_default().contains("returned false"));
    }

    #[test]
    fn test_post_with_before_subject() {
        let mut check = args(KindArg::Post, "$this.balance == $old($this.balance) + amount");
        check.before = Some(r#"{"balance": 10}"#.to_string());
        check.this = Some(r#"{"balance": 15}"#.to_string());
        check.args = vec!["amount=5".to_string()];
        let outcome = run(&check).unwrap();
        assert!(outcome.passed, "{:?}", outcome.message);
        assert_eq!(outcome.state, CheckState::Passed);
    }

    #[test]
    fn test_invariant_on_subject() {
        let mut check = args(KindArg::Invariant, "$this.name.length() > 0 && $this.i > 1");
        check.this = Some(r#"{"name": "foo", "i": 2}"#.to_string());
        assert!(run(&check).unwrap().passed);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let mut check = args(KindArg::Pre, "true");
        check.config = Some(PathBuf::from("/nonexistent/covenant.toml"));
        assert!(run(&check).is_err());
    }
}
