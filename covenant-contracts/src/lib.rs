//! Design-by-contract enforcement
//!
//! This crate runs precondition, postcondition and invariant checks against
//! a [`TestContext`](covenant_core::TestContext), delegating truth to an
//! [`ExpressionInterpreter`](covenant_interpreter::ExpressionInterpreter)
//! and turning failures into reports or [`ContractViolation`]s.

pub mod api;
pub mod config;
pub mod configurator;
pub mod contract;
pub mod enforcer;
pub mod errors;
pub mod properties;
pub mod registry;
pub mod reporter;

pub use api::CheckSite;
pub use config::{script_interpreter_factory, Configuration, FailureHandling, InterpreterFactory};
pub use configurator::{ConfigError, Configured, OutputTarget, PropertiesConfigurator, PropertyKey, PROPERTY_PREFIX};
pub use contract::{CheckKind, CheckState, CheckSwitches};
pub use enforcer::ContractEnforcer;
pub use errors::{ContractError, ContractResult, ContractViolation};
pub use properties::PropertySource;
pub use registry::ComponentRegistry;
pub use reporter::{
    RecordingReporter, ReportEntry, Reporter, Severity, SharedText, TracingReporter, WriterReporter,
};
