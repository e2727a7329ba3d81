//! Pre/Post/Invariant check orchestration

use crate::config::{Configuration, FailureHandling};
use crate::contract::{CheckKind, CheckState};
use crate::errors::{ContractError, ContractResult, ContractViolation};
use crate::reporter::Severity;
use covenant_core::{TestContext, Value};
use covenant_interpreter::{extract_old_references, ExpressionInterpreter, TestResult};
use indexmap::IndexMap;
use std::backtrace::Backtrace;
use tracing::{debug, trace, trace_span, warn};

const REPORT_SOURCE: &str = "ContractEnforcer";

/// Symbols the enforcer binds itself; named arguments never shadow them
pub const RESERVED_SYMBOLS: [&str; 4] = ["this", "target", "args", "result"];

/// Runs contract checks for one thread of execution.
///
/// Each enforcer owns its interpreter, so the methods take `&mut self`.
/// Create one enforcer per thread from a shared [`Configuration`].
pub struct ContractEnforcer {
    config: Configuration,
    interpreter: Box<dyn ExpressionInterpreter>,
    state: CheckState,
}

impl ContractEnforcer {
    pub fn new(config: Configuration) -> Self {
        let interpreter = config.new_interpreter();
        Self::with_interpreter(config, interpreter)
    }

    /// Use a specific interpreter instead of the configured factory
    pub fn with_interpreter(config: Configuration, interpreter: Box<dyn ExpressionInterpreter>) -> Self {
        Self {
            config,
            interpreter,
            state: CheckState::NotStarted,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn interpreter(&self) -> &dyn ExpressionInterpreter {
        self.interpreter.as_ref()
    }

    pub fn interpreter_mut(&mut self) -> &mut dyn ExpressionInterpreter {
        self.interpreter.as_mut()
    }

    /// State reached by the most recent check
    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn is_enabled(&self, kind: CheckKind) -> bool {
        self.config.switches.is_enabled(kind)
    }

    pub fn check_pre(&mut self, context: &TestContext, expression: &str) -> ContractResult<()> {
        self.check(CheckKind::Pre, context, expression)
    }

    pub fn check_invariant(&mut self, context: &TestContext, expression: &str) -> ContractResult<()> {
        self.check(CheckKind::Invariant, context, expression)
    }

    /// Evaluate each expression before the call and record the values in
    /// `context` under their names. A failed capture is reported as a
    /// warning and leaves its name unrecorded.
    pub fn capture_old_values(
        &mut self,
        context: &mut TestContext,
        expressions: &IndexMap<String, String>,
    ) {
        if !self.is_enabled(CheckKind::Post) || expressions.is_empty() {
            return;
        }
        let _span = trace_span!("capture_old_values", item = %context.item_name).entered();

        let mut captured = Vec::with_capacity(expressions.len());
        {
            let mut scope = Scope::new(self.interpreter.as_mut());
            scope.bind_context(context);
            for (name, expression) in expressions {
                match scope.interpreter.capture_old_value(expression, context) {
                    Ok(value) => {
                        trace!(name = %name, value = %value, "captured old value");
                        captured.push((name.clone(), value));
                    }
                    Err(result) => {
                        let reason = result.message().unwrap_or("capture failed");
                        warn!(name = %name, reason, "old value not captured");
                        self.config.reporter.report(
                            Severity::Warn,
                            REPORT_SOURCE,
                            &format!(
                                "Old value \"{}\" for \"{}\" was not captured: {}",
                                name, context.item_name, reason
                            ),
                        );
                    }
                }
            }
        }

        for (name, value) in captured {
            context.record_old_value(name, value);
        }
        self.transition(CheckState::OldValuesCaptured);
    }

    /// Capture every `$old(...)` reference found in a postcondition.
    ///
    /// Symbols are numbered per expression (`__old0`, `__old1`, ...), so a
    /// context holds the captures of one postcondition at a time: capturing
    /// for a second expression on the same context replaces the first one's
    /// entries. Use one context per postcondition, or name the values
    /// explicitly through [`ContractEnforcer::capture_old_values`].
    pub fn capture_old_values_for(&mut self, context: &mut TestContext, post_expression: &str) {
        let references = extract_old_references(post_expression);
        if !references.is_empty() {
            self.capture_old_values(context, &references.captures);
        }
    }

    /// Evaluate a postcondition. `$old(...)` references are replaced by the
    /// symbols [`ContractEnforcer::capture_old_values_for`] recorded.
    pub fn check_post(&mut self, context: &TestContext, expression: &str) -> ContractResult<()> {
        if !self.is_enabled(CheckKind::Post) {
            return Ok(());
        }
        let references = extract_old_references(expression);
        let _span = trace_span!("check", kind = %CheckKind::Post, item = %context.item_name).entered();

        let result = {
            let mut scope = Scope::new(self.interpreter.as_mut());
            scope.bind_context(context);
            // Captured values take precedence over context symbols of the same name
            for (name, value) in &context.old_values {
                if scope.is_bound(name) {
                    warn!(name = %name, item = %context.item_name, "old value shadows a context symbol");
                }
                scope.bind(name, value.clone());
            }
            scope.interpreter.evaluate(&references.rewritten, context)
        };

        self.conclude(CheckKind::Post, context, expression, result)
    }

    fn check(&mut self, kind: CheckKind, context: &TestContext, expression: &str) -> ContractResult<()> {
        if !self.is_enabled(kind) {
            return Ok(());
        }
        let _span = trace_span!("check", kind = %kind, item = %context.item_name).entered();

        let result = {
            let mut scope = Scope::new(self.interpreter.as_mut());
            scope.bind_context(context);
            scope.interpreter.evaluate(expression, context)
        };

        self.conclude(kind, context, expression, result)
    }

    fn conclude(
        &mut self,
        kind: CheckKind,
        context: &TestContext,
        expression: &str,
        result: TestResult,
    ) -> ContractResult<()> {
        self.transition(CheckState::Evaluated);
        if result.passed() {
            self.transition(CheckState::Passed);
            return Ok(());
        }
        self.handle_failure(kind, context, expression, result)
    }

    fn handle_failure(
        &mut self,
        kind: CheckKind,
        context: &TestContext,
        expression: &str,
        result: TestResult,
    ) -> ContractResult<()> {
        let location = match context.location() {
            loc if loc.is_empty() => "unknown location".to_string(),
            loc => loc,
        };
        let mut message = format!(
            "{} failed for \"{}\" at {}: test \"{}\": {}",
            kind.label(),
            context.item_name,
            location,
            expression,
            result.message().unwrap_or("test did not pass"),
        );

        let stack_trace = self
            .config
            .include_stack_trace
            .then(|| Backtrace::force_capture().to_string());
        if let Some(trace) = &stack_trace {
            message.push_str("\nStack trace:\n");
            message.push_str(trace);
        }

        match self.config.failure_handling {
            FailureHandling::Report => {
                self.config
                    .reporter
                    .report(Severity::Error, REPORT_SOURCE, &message);
                self.transition(CheckState::Reported);
                Ok(())
            }
            FailureHandling::Raise => {
                debug!(kind = %kind, item = %context.item_name, "raising contract violation");
                self.transition(CheckState::Raised);
                Err(ContractError::Violation(ContractViolation {
                    kind,
                    item_name: context.item_name.clone(),
                    file_name: context.file_name.clone(),
                    line_number: context.line_number,
                    expression: expression.to_string(),
                    message,
                    stack_trace,
                    cause: result.failure_cause().cloned(),
                }))
            }
        }
    }

    fn transition(&mut self, state: CheckState) {
        trace!(from = ?self.state, to = ?state, "check state");
        self.state = state;
    }
}

/// Symbols bound for one evaluation; everything bound is unbound on drop
struct Scope<'i> {
    interpreter: &'i mut dyn ExpressionInterpreter,
    bound: Vec<String>,
}

impl<'i> Scope<'i> {
    fn new(interpreter: &'i mut dyn ExpressionInterpreter) -> Self {
        Self {
            interpreter,
            bound: Vec::new(),
        }
    }

    fn is_bound(&self, name: &str) -> bool {
        self.bound.iter().any(|bound| bound == name)
    }

    fn bind(&mut self, name: &str, value: Value) {
        self.interpreter.bind_symbol(name, value);
        self.bound.push(name.to_string());
    }

    /// Bind `this`, `target`, `args`, `arg0..`, named arguments and
    /// `result` from the context
    fn bind_context(&mut self, context: &TestContext) {
        if let Some(instance) = &context.instance {
            self.bind("this", instance.value.clone());
        }
        if let Some(field) = &context.field {
            self.bind("target", field.value.clone());
        }

        let args: Vec<Value> = context.method_args.iter().map(|a| a.value.clone()).collect();
        self.bind("args", Value::List(args));
        for (i, arg) in context.method_args.iter().enumerate() {
            self.bind(&format!("arg{}", i), arg.value.clone());
            if !arg.name.is_empty() && !RESERVED_SYMBOLS.contains(&arg.name.as_str()) {
                self.bind(&arg.name, arg.value.clone());
            }
        }

        if let Some(result) = &context.method_result {
            self.bind("result", result.value.clone());
        }
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        for name in self.bound.drain(..).rev() {
            self.interpreter.unbind_symbol(&name);
        }
    }
}

#[cfg(test)]
#[path = "enforcer_tests.rs"]
mod tests;
