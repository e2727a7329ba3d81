use super::*;
use crate::reporter::{RecordingReporter, SharedText, WriterReporter};
use pretty_assertions::assert_eq;

fn recording_config() -> (Configuration, Arc<RecordingReporter>) {
    let recorder = Arc::new(RecordingReporter::new());
    let config = Configuration::new().with_reporter(recorder.clone());
    (config, recorder)
}

fn key(name: &str) -> String {
    format!("{}{}", PROPERTY_PREFIX, name)
}

#[test]
fn test_parse_bool_forms() {
    for yes in ["true", "TRUE", "t", "yes", "Y", "on", "ON"] {
        assert_eq!(parse_bool(yes), Some(true), "{}", yes);
    }
    for no in ["false", "F", "no", "n", "off", "Off"] {
        assert_eq!(parse_bool(no), Some(false), "{}", no);
    }
    for bad in ["", "  ", "maybe", "1", "0"] {
        assert_eq!(parse_bool(bad), None, "{:?}", bad);
    }
}

#[test]
fn test_parse_keyword_substitutions() {
    let table = parse_keyword_substitutions("$self=this, $me = this ,").unwrap();
    assert_eq!(table.get("$self"), Some("this"));
    assert_eq!(table.get("$me"), Some("this"));
    assert_eq!(table.len(), 2);

    assert!(matches!(
        parse_keyword_substitutions("=this"),
        Err(ConfigError::KeywordFormat { .. })
    ));
    assert!(matches!(
        parse_keyword_substitutions("$self"),
        Err(ConfigError::KeywordFormat { .. })
    ));
}

#[test]
fn test_output_target_parse() {
    assert_eq!("stdout".parse::<OutputTarget>(), Ok(OutputTarget::Stdout));
    assert_eq!(" STDERR ".parse::<OutputTarget>(), Ok(OutputTarget::Stderr));
    assert_eq!(
        "file:/tmp/out.log".parse::<OutputTarget>(),
        Ok(OutputTarget::File(PathBuf::from("/tmp/out.log")))
    );
    assert!("file:".parse::<OutputTarget>().is_err());
    assert!("printer".parse::<OutputTarget>().is_err());
}

#[test]
fn test_switch_keys() {
    let registry = ComponentRegistry::with_builtins();
    let (config, recorder) = recording_config();
    let source = PropertySource::new()
        .with(key("Pre"), "off")
        .with(key("Invar"), "no");

    let configured = PropertiesConfigurator::new(&registry).configure_onto(config, &source);

    let switches = &configured.configuration.switches;
    assert!(!switches.is_enabled(CheckKind::Pre));
    assert!(switches.is_enabled(CheckKind::Post));
    assert!(!switches.is_enabled(CheckKind::Invariant));
    assert!(configured.errors.is_empty());
    assert!(recorder.is_empty());
}

#[test]
fn test_contract_disable_overrides_later_keys() {
    let registry = ComponentRegistry::with_builtins();
    let (config, _recorder) = recording_config();
    let source = PropertySource::new()
        .with(key("Contract"), "false")
        .with(key("Pre"), "true")
        .with(key("Post"), "yes");

    let configured = PropertiesConfigurator::new(&registry).configure_onto(config, &source);

    let switches = &configured.configuration.switches;
    assert!(!switches.is_contract_enabled());
    for kind in CheckKind::ALL {
        assert!(!switches.is_enabled(kind), "{} should be off", kind);
    }
    assert!(configured.errors.is_empty());
}

#[test]
fn test_unknown_key_reported_once_others_apply() {
    let registry = ComponentRegistry::with_builtins();
    let (config, recorder) = recording_config();
    let source = PropertySource::new()
        .with(key("Bogus"), "1")
        .with(key("Post"), "off")
        .with("some.other.key", "whatever");

    let configured = PropertiesConfigurator::new(&registry).configure_onto(config, &source);

    assert_eq!(
        configured.errors,
        vec![ConfigError::UnknownKey {
            key: key("Bogus"),
            value: "1".to_string(),
        }]
    );
    assert!(!configured.configuration.switches.is_enabled(CheckKind::Post));

    let reports = recorder.entries_at(Severity::Error);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].source, "PropertiesConfigurator");
    assert!(reports[0].message.contains("org.contract4j5.Bogus"));
}

#[test]
fn test_errors_accumulate_into_one_report() {
    let registry = ComponentRegistry::with_builtins();
    let (config, recorder) = recording_config();
    let source = PropertySource::new()
        .with(key("Pre"), "")
        .with(key("Post"), "sometimes")
        .with(key("ContractEnforcer"), "NoSuchEnforcer")
        .with(key("GlobalReporterThreshold"), "loud");

    let configured = PropertiesConfigurator::new(&registry).configure_onto(config, &source);

    assert_eq!(configured.errors.len(), 4);
    assert!(matches!(configured.errors[0], ConfigError::EmptyValue { .. }));
    assert!(matches!(configured.errors[1], ConfigError::InvalidValue { .. }));
    assert!(matches!(
        configured.errors[2],
        ConfigError::UnknownComponent { component: "contract enforcer", .. }
    ));
    assert!(matches!(configured.errors[3], ConfigError::InvalidValue { .. }));

    let reports = recorder.entries_at(Severity::Error);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message.lines().count(), 4);
    // Invalid values leave the defaults alone
    assert!(configured.configuration.switches.is_enabled(CheckKind::Pre));
    assert!(configured.configuration.switches.is_enabled(CheckKind::Post));
}

#[test]
fn test_component_keys() {
    let registry = ComponentRegistry::with_builtins();
    let source = PropertySource::new()
        .with(key("GlobalReporter"), "covenant::reporter::RecordingReporter")
        .with(key("GlobalReporterThreshold"), "info")
        .with(key("ContractEnforcer"), "ReportingContractEnforcer")
        .with(key("ContractEnforcerIncludeStackTrace"), "yes")
        .with(key("ExpressionInterpreter"), "ScriptInterpreter")
        .with(key("ExpressionInterpreterEmptyTestExpressionsValid"), "true")
        .with(
            key("ExpressionInterpreterOptionalKeywordSubstitutions"),
            "$self=this",
        );

    let configured = PropertiesConfigurator::new(&registry).configure(&source);
    let config = &configured.configuration;

    assert!(configured.errors.is_empty(), "{:?}", configured.errors);
    assert_eq!(config.reporter.threshold(), Severity::Info);
    assert_eq!(config.failure_handling, FailureHandling::Report);
    assert!(config.include_stack_trace);
    assert!(config.empty_expressions_valid);
    assert_eq!(config.keyword_substitutions.get("$self"), Some("this"));

    let interpreter = config.new_interpreter();
    assert!(interpreter.treat_empty_as_valid());
    assert_eq!(interpreter.keyword_substitutions().get("$self"), Some("this"));
}

#[test]
fn test_writer_target_on_non_writer_reporter() {
    let registry = ComponentRegistry::with_builtins();
    let (config, recorder) = recording_config();
    let source = PropertySource::new().with(key("GlobalWriterReporterWriter"), "stderr");

    let configured = PropertiesConfigurator::new(&registry).configure_onto(config, &source);

    assert_eq!(configured.errors, vec![ConfigError::NotWriterReporter]);
    assert_eq!(recorder.entries_at(Severity::Error).len(), 1);
}

#[test]
fn test_writer_and_stream_stream_wins() {
    let registry = ComponentRegistry::with_builtins();
    let text = SharedText::new();
    let reporter = Arc::new(WriterReporter::with_writer(text.clone()));
    let config = Configuration::new().with_reporter(reporter.clone());
    let source = PropertySource::new()
        .with(key("GlobalWriterReporterWriter"), "stdout")
        .with(key("GlobalWriterReporterOutputStream"), "stderr");

    let configured = PropertiesConfigurator::new(&registry).configure_onto(config, &source);

    assert_eq!(configured.errors, vec![ConfigError::WriterAndStream]);
    assert_eq!(reporter.sink_kind(), "output stream");
}

#[test]
fn test_file_target() {
    let path = std::env::temp_dir().join(format!(
        "covenant-configurator-{}.log",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let registry = ComponentRegistry::with_builtins();
    let source = PropertySource::new()
        .with(key("GlobalReporter"), "WriterReporter")
        .with(
            key("GlobalWriterReporterOutputStream"),
            format!("file:{}", path.display()),
        );
    let configured = PropertiesConfigurator::new(&registry).configure(&source);
    assert!(configured.errors.is_empty(), "{:?}", configured.errors);

    configured
        .configuration
        .reporter
        .report(Severity::Error, "test", "written to file");

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "ERROR: test: written to file\n");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_property_key_names_round_trip() {
    for property in PropertyKey::ALL {
        assert_eq!(PropertyKey::parse(property.name()), Some(property));
        assert!(property.full_name().starts_with(PROPERTY_PREFIX));
    }
    assert_eq!(PropertyKey::parse("pre"), None);
}
