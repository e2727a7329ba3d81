//! Execution context handed to every contract check

use crate::value::Value;
use indexmap::IndexMap;

/// A named, typed value taking part in a check: the target object, a
/// field, a method argument or a method result.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub name: String,
    pub type_name: String,
    pub value: Value,
}

impl Instance {
    /// Create an instance whose type name is derived from the value
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let type_name = match &value {
            Value::Object(obj) => obj.type_name(),
            other => other.type_name().to_string(),
        };
        Self {
            name: name.into(),
            type_name,
            value,
        }
    }

    /// Create an instance with an explicit type name
    pub fn typed(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            value: value.into(),
        }
    }
}

/// Everything an expression may refer to while one check runs.
///
/// A context is created by the caller per invocation and is not shared
/// between threads while a check is in progress. Old values are recorded
/// between the precondition and the postcondition; recording a name twice
/// keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestContext {
    /// Name of the checked item, e.g. `Account.withdraw`
    pub item_name: String,
    /// Target object; `None` for static or free functions
    pub instance: Option<Instance>,
    /// Field under test, for field invariants
    pub field: Option<Instance>,
    /// Method or constructor arguments, in declaration order
    pub method_args: Vec<Instance>,
    /// Return value; only meaningful for postconditions
    pub method_result: Option<Instance>,
    /// Values captured before the call, keyed by symbol
    pub old_values: IndexMap<String, Value>,
    /// Source file of the checked item
    pub file_name: String,
    /// Source line of the checked item
    pub line_number: u32,
}

impl TestContext {
    pub fn new(item_name: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            ..Default::default()
        }
    }

    pub fn with_instance(mut self, instance: Instance) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn with_field(mut self, field: Instance) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_arg(mut self, arg: Instance) -> Self {
        self.method_args.push(arg);
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = Instance>) -> Self {
        self.method_args.extend(args);
        self
    }

    pub fn with_result(mut self, result: Instance) -> Self {
        self.method_result = Some(result);
        self
    }

    /// Set the source location
    pub fn at(mut self, file_name: impl Into<String>, line_number: u32) -> Self {
        self.file_name = file_name.into();
        self.line_number = line_number;
        self
    }

    /// Set the return value after the call completes
    pub fn set_result(&mut self, result: Instance) {
        self.method_result = Some(result);
    }

    /// Whether this context describes a field invariant rather than a call
    pub fn is_field_check(&self) -> bool {
        self.field.is_some()
    }

    /// Record an old value. A later record under the same name replaces it.
    pub fn record_old_value(&mut self, name: impl Into<String>, value: Value) {
        self.old_values.insert(name.into(), value);
    }

    pub fn old_value(&self, name: &str) -> Option<&Value> {
        self.old_values.get(name)
    }

    /// Argument lookup by name
    pub fn arg(&self, name: &str) -> Option<&Instance> {
        self.method_args.iter().find(|a| a.name == name)
    }

    /// `file:line` for diagnostics; empty when no file was given
    pub fn location(&self) -> String {
        if self.file_name.is_empty() {
            String::new()
        } else {
            format!("{}:{}", self.file_name, self.line_number)
        }
    }
}
