//! Caller-facing helpers for driving checks around an operation

use crate::enforcer::ContractEnforcer;
use crate::errors::ContractResult;
use covenant_core::{Instance, TestContext};
use serde::{Deserialize, Serialize};

/// Where a checked item lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSite {
    pub item_name: String,
    pub file_name: String,
    pub line_number: u32,
}

impl CheckSite {
    pub fn new(item_name: impl Into<String>, file_name: impl Into<String>, line_number: u32) -> Self {
        Self {
            item_name: item_name.into(),
            file_name: file_name.into(),
            line_number,
        }
    }

    /// A fresh context for this site
    pub fn context(&self) -> TestContext {
        TestContext::new(self.item_name.clone()).at(self.file_name.clone(), self.line_number)
    }
}

impl ContractEnforcer {
    /// Build a context for `site` and check a precondition
    pub fn run_pre(
        &mut self,
        site: &CheckSite,
        instance: Option<Instance>,
        args: Vec<Instance>,
        expression: &str,
    ) -> ContractResult<TestContext> {
        let mut context = site.context().with_args(args);
        context.instance = instance;
        self.check_pre(&context, expression)?;
        Ok(context)
    }

    /// Record the values a postcondition's `$old(...)` references need
    pub fn capture_old(&mut self, context: &mut TestContext, post_expression: &str) {
        self.capture_old_values_for(context, post_expression);
    }

    /// Attach the result to `context` and check a postcondition
    pub fn run_post(
        &mut self,
        context: &mut TestContext,
        result: Option<Instance>,
        expression: &str,
    ) -> ContractResult<()> {
        if let Some(result) = result {
            context.set_result(result);
        }
        self.check_post(context, expression)
    }

    pub fn run_invariant(
        &mut self,
        site: &CheckSite,
        instance: Instance,
        expression: &str,
    ) -> ContractResult<()> {
        let context = site.context().with_instance(instance);
        self.check_invariant(&context, expression)
    }
}
