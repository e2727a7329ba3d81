//! Configuration from `org.contract4j5.*` properties

use crate::config::{Configuration, FailureHandling, InterpreterFactory};
use crate::contract::CheckKind;
use crate::properties::PropertySource;
use crate::registry::ComponentRegistry;
use crate::reporter::{IoText, Reporter, Severity};
use covenant_interpreter::KeywordSubstitutions;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, LineWriter};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Prefix shared by every recognised property key
pub const PROPERTY_PREFIX: &str = "org.contract4j5.";

const REPORT_SOURCE: &str = "PropertiesConfigurator";

/// A problem found while applying properties. These are collected and
/// reported, never raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Empty value for property \"{key}\" ignored.")]
    EmptyValue { key: String },

    #[error("Invalid value \"{value}\" for property \"{key}\" ignored.")]
    InvalidValue { key: String, value: String },

    #[error("Unrecognized property key \"{key}\" (value = \"{value}\") ignored.")]
    UnknownKey { key: String, value: String },

    #[error("No {component} named \"{name}\" for property \"{key}\"; ignored.")]
    UnknownComponent {
        key: String,
        component: &'static str,
        name: String,
    },

    #[error("Keyword substitution format error in \"{value}\": {reason}. Format should be \"name1=value1, name2=value2, ...\"")]
    KeywordFormat { value: String, reason: String },

    #[error("The global reporter is not a WriterReporter, so the writer or output stream for it is ignored.")]
    NotWriterReporter,

    #[error("Both an output stream and a writer were specified for the global reporter. The output stream will be used.")]
    WriterAndStream,

    #[error("Cannot open output target \"{target}\": {message}")]
    Target { target: String, message: String },

    #[error("Cannot read \"{path}\": {message}")]
    Io { path: String, message: String },

    #[error("Cannot parse configuration: {0}")]
    Parse(String),
}

/// Keys understood after the prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey {
    Contract,
    Pre,
    Post,
    Invar,
    GlobalReporter,
    GlobalReporterThreshold,
    GlobalWriterReporterWriter,
    GlobalWriterReporterOutputStream,
    ContractEnforcer,
    ContractEnforcerIncludeStackTrace,
    ExpressionInterpreter,
    ExpressionInterpreterEmptyTestExpressionsValid,
    ExpressionInterpreterOptionalKeywordSubstitutions,
}

impl PropertyKey {
    pub const ALL: [PropertyKey; 13] = [
        PropertyKey::Contract,
        PropertyKey::Pre,
        PropertyKey::Post,
        PropertyKey::Invar,
        PropertyKey::GlobalReporter,
        PropertyKey::GlobalReporterThreshold,
        PropertyKey::GlobalWriterReporterWriter,
        PropertyKey::GlobalWriterReporterOutputStream,
        PropertyKey::ContractEnforcer,
        PropertyKey::ContractEnforcerIncludeStackTrace,
        PropertyKey::ExpressionInterpreter,
        PropertyKey::ExpressionInterpreterEmptyTestExpressionsValid,
        PropertyKey::ExpressionInterpreterOptionalKeywordSubstitutions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PropertyKey::Contract => "Contract",
            PropertyKey::Pre => "Pre",
            PropertyKey::Post => "Post",
            PropertyKey::Invar => "Invar",
            PropertyKey::GlobalReporter => "GlobalReporter",
            PropertyKey::GlobalReporterThreshold => "GlobalReporterThreshold",
            PropertyKey::GlobalWriterReporterWriter => "GlobalWriterReporterWriter",
            PropertyKey::GlobalWriterReporterOutputStream => "GlobalWriterReporterOutputStream",
            PropertyKey::ContractEnforcer => "ContractEnforcer",
            PropertyKey::ContractEnforcerIncludeStackTrace => "ContractEnforcerIncludeStackTrace",
            PropertyKey::ExpressionInterpreter => "ExpressionInterpreter",
            PropertyKey::ExpressionInterpreterEmptyTestExpressionsValid => {
                "ExpressionInterpreterEmptyTestExpressionsValid"
            }
            PropertyKey::ExpressionInterpreterOptionalKeywordSubstitutions => {
                "ExpressionInterpreterOptionalKeywordSubstitutions"
            }
        }
    }

    /// Full key including the prefix
    pub fn full_name(self) -> String {
        format!("{}{}", PROPERTY_PREFIX, self.name())
    }

    pub fn parse(name: &str) -> Option<PropertyKey> {
        PropertyKey::ALL.iter().copied().find(|k| k.name() == name)
    }

    fn check_kind(self) -> Option<CheckKind> {
        match self {
            PropertyKey::Pre => Some(CheckKind::Pre),
            PropertyKey::Post => Some(CheckKind::Post),
            PropertyKey::Invar => Some(CheckKind::Invariant),
            _ => None,
        }
    }
}

/// Where a writer reporter sends its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    Stderr,
    /// Appended to, created when missing
    File(PathBuf),
}

impl OutputTarget {
    pub fn open(&self) -> io::Result<Box<dyn io::Write + Send>> {
        match self {
            OutputTarget::Stdout => Ok(Box::new(io::stdout())),
            OutputTarget::Stderr => Ok(Box::new(io::stderr())),
            OutputTarget::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(Box::new(LineWriter::new(file)))
            }
        }
    }
}

impl FromStr for OutputTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "stdout" => return Ok(OutputTarget::Stdout),
            "stderr" => return Ok(OutputTarget::Stderr),
            _ => {}
        }
        match s.strip_prefix("file:") {
            Some(path) if !path.trim().is_empty() => Ok(OutputTarget::File(PathBuf::from(path.trim()))),
            _ => Err(format!("expected stdout, stderr or file:<path>, got \"{}\"", s)),
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Stdout => write!(f, "stdout"),
            OutputTarget::Stderr => write!(f, "stderr"),
            OutputTarget::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// Parse the loose boolean forms accepted in properties: anything starting
/// with `t`/`y` is true, `f`/`n` is false, plus `on`/`off`.
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    match value.chars().next()? {
        't' | 'T' | 'y' | 'Y' => Some(true),
        'f' | 'F' | 'n' | 'N' => Some(false),
        _ if value.eq_ignore_ascii_case("on") => Some(true),
        _ if value.eq_ignore_ascii_case("off") => Some(false),
        _ => None,
    }
}

/// Parse `name1=value1, name2=value2` into a keyword table
pub fn parse_keyword_substitutions(value: &str) -> Result<KeywordSubstitutions, ConfigError> {
    let mut table = KeywordSubstitutions::empty();
    let format_error = |reason: &str| ConfigError::KeywordFormat {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, symbol) = pair
            .split_once('=')
            .ok_or_else(|| format_error("missing '=' in a name value pair"))?;
        let (name, symbol) = (name.trim(), symbol.trim());
        if name.is_empty() {
            return Err(format_error("name empty in a name value pair"));
        }
        if symbol.is_empty() {
            return Err(format_error("value empty in a name value pair"));
        }
        table.insert(name, symbol);
    }

    Ok(table)
}

/// Result of applying a property source
#[derive(Debug)]
pub struct Configured {
    pub configuration: Configuration,
    /// Every problem found, in the order found
    pub errors: Vec<ConfigError>,
}

/// Component settings collected while scanning; applied once at the end
#[derive(Default)]
struct Pending {
    reporter: Option<Arc<dyn Reporter>>,
    threshold: Option<Severity>,
    writer: Option<OutputTarget>,
    stream: Option<OutputTarget>,
    failure_handling: Option<FailureHandling>,
    include_stack_trace: Option<bool>,
    interpreter: Option<InterpreterFactory>,
    empty_valid: Option<bool>,
    keywords: Option<KeywordSubstitutions>,
}

/// Applies `org.contract4j5.*` properties to a [`Configuration`].
///
/// Processing never fails: bad entries are skipped, collected, and reported
/// once at `Error` through the resulting configuration's reporter.
pub struct PropertiesConfigurator<'r> {
    registry: &'r ComponentRegistry,
}

impl PropertiesConfigurator<'static> {
    /// Configurator backed by the global registry
    pub fn global() -> Self {
        Self::new(ComponentRegistry::global())
    }
}

impl<'r> PropertiesConfigurator<'r> {
    pub fn new(registry: &'r ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Build a fresh configuration from `source`
    pub fn configure(&self, source: &PropertySource) -> Configured {
        self.configure_onto(Configuration::new(), source)
    }

    /// Apply `source` on top of an existing configuration
    pub fn configure_onto(&self, mut config: Configuration, source: &PropertySource) -> Configured {
        let mut errors = Vec::new();
        let mut pending = Pending::default();
        let mut contract_disabled = false;

        for (key, value) in source.iter() {
            let Some(name) = key.strip_prefix(PROPERTY_PREFIX) else {
                continue;
            };

            if value.trim().is_empty() {
                errors.push(ConfigError::EmptyValue {
                    key: key.to_string(),
                });
                continue;
            }

            let Some(property) = PropertyKey::parse(name) else {
                errors.push(ConfigError::UnknownKey {
                    key: key.to_string(),
                    value: value.to_string(),
                });
                continue;
            };

            let invalid = || ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            };

            match property {
                PropertyKey::Contract => match parse_bool(value) {
                    Some(enabled) => {
                        config.switches.set_contract_enabled(enabled);
                        for kind in CheckKind::ALL {
                            config.switches.set_enabled(kind, enabled);
                        }
                        contract_disabled = !enabled;
                    }
                    None => errors.push(invalid()),
                },
                PropertyKey::Pre | PropertyKey::Post | PropertyKey::Invar => {
                    match (parse_bool(value), property.check_kind()) {
                        (Some(enabled), Some(kind)) => {
                            if contract_disabled {
                                debug!(key, "ignored because contracts are disabled");
                            } else {
                                config.switches.set_enabled(kind, enabled);
                            }
                        }
                        _ => errors.push(invalid()),
                    }
                }
                PropertyKey::GlobalReporter => match self.registry.reporter(value) {
                    Some(reporter) => pending.reporter = Some(reporter),
                    None => errors.push(ConfigError::UnknownComponent {
                        key: key.to_string(),
                        component: "reporter",
                        name: value.trim().to_string(),
                    }),
                },
                PropertyKey::GlobalReporterThreshold => match value.parse::<Severity>() {
                    Ok(severity) => pending.threshold = Some(severity),
                    Err(_) => errors.push(invalid()),
                },
                PropertyKey::GlobalWriterReporterWriter => match value.parse::<OutputTarget>() {
                    Ok(target) => pending.writer = Some(target),
                    Err(_) => errors.push(invalid()),
                },
                PropertyKey::GlobalWriterReporterOutputStream => {
                    match value.parse::<OutputTarget>() {
                        Ok(target) => pending.stream = Some(target),
                        Err(_) => errors.push(invalid()),
                    }
                }
                PropertyKey::ContractEnforcer => match self.registry.enforcer_policy(value) {
                    Some(policy) => pending.failure_handling = Some(policy),
                    None => errors.push(ConfigError::UnknownComponent {
                        key: key.to_string(),
                        component: "contract enforcer",
                        name: value.trim().to_string(),
                    }),
                },
                PropertyKey::ContractEnforcerIncludeStackTrace => match parse_bool(value) {
                    Some(include) => pending.include_stack_trace = Some(include),
                    None => errors.push(invalid()),
                },
                PropertyKey::ExpressionInterpreter => {
                    match self.registry.interpreter_factory(value) {
                        Some(factory) => pending.interpreter = Some(factory),
                        None => errors.push(ConfigError::UnknownComponent {
                            key: key.to_string(),
                            component: "expression interpreter",
                            name: value.trim().to_string(),
                        }),
                    }
                }
                PropertyKey::ExpressionInterpreterEmptyTestExpressionsValid => {
                    match parse_bool(value) {
                        Some(valid) => pending.empty_valid = Some(valid),
                        None => errors.push(invalid()),
                    }
                }
                PropertyKey::ExpressionInterpreterOptionalKeywordSubstitutions => {
                    match parse_keyword_substitutions(value) {
                        Ok(table) => pending.keywords = Some(table),
                        Err(err) => errors.push(err),
                    }
                }
            }
            debug!(key, value, "processed property");
        }

        apply_enforcer_settings(&mut config, &mut pending);
        apply_reporter_settings(&mut config, pending, &mut errors);

        if !errors.is_empty() {
            let report = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            config.reporter.report(Severity::Error, REPORT_SOURCE, &report);
        }

        Configured {
            configuration: config,
            errors,
        }
    }
}

fn apply_enforcer_settings(config: &mut Configuration, pending: &mut Pending) {
    if let Some(policy) = pending.failure_handling {
        config.failure_handling = policy;
    }
    if let Some(include) = pending.include_stack_trace {
        config.include_stack_trace = include;
    }
    if let Some(factory) = pending.interpreter.take() {
        config.interpreter_factory = factory;
    }
    if let Some(valid) = pending.empty_valid {
        config.empty_expressions_valid = valid;
    }
    if let Some(keywords) = pending.keywords.take() {
        config.keyword_substitutions = keywords;
    }
}

fn apply_reporter_settings(config: &mut Configuration, pending: Pending, errors: &mut Vec<ConfigError>) {
    if let Some(reporter) = pending.reporter {
        config.reporter = reporter;
    }
    if let Some(threshold) = pending.threshold {
        config.reporter.set_threshold(threshold);
    }
    if pending.writer.is_none() && pending.stream.is_none() {
        return;
    }

    let Some(writer_reporter) = config.reporter.as_writer_reporter() else {
        errors.push(ConfigError::NotWriterReporter);
        return;
    };

    let open = |target: &OutputTarget, errors: &mut Vec<ConfigError>| match target.open() {
        Ok(stream) => Some(stream),
        Err(e) => {
            errors.push(ConfigError::Target {
                target: target.to_string(),
                message: e.to_string(),
            });
            None
        }
    };

    if let Some(target) = &pending.writer {
        if let Some(stream) = open(target, errors) {
            writer_reporter.set_writer(Box::new(IoText(stream)));
        }
    }
    if let Some(target) = &pending.stream {
        if let Some(stream) = open(target, errors) {
            writer_reporter.set_output_stream(stream);
        }
        if pending.writer.is_some() {
            errors.push(ConfigError::WriterAndStream);
        }
    }
}

#[cfg(test)]
#[path = "configurator_tests.rs"]
mod tests;
