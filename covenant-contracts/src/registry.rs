//! Component registry for configuration by type name

use crate::config::{script_interpreter_factory, FailureHandling, InterpreterFactory};
use crate::reporter::{RecordingReporter, Reporter, TracingReporter, WriterReporter};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock};

/// Factory function that creates a reporter
pub type ReporterFactory = Arc<dyn Fn() -> Arc<dyn Reporter> + Send + Sync>;

/// Registry that maps type names to reporter factories, interpreter
/// factories and enforcer policies.
///
/// Names may be given fully qualified (`covenant::reporter::WriterReporter`
/// or `org.example.WriterReporter`); lookups fall back to the last path
/// segment.
pub struct ComponentRegistry {
    reporters: RwLock<FxHashMap<String, ReporterFactory>>,
    interpreters: RwLock<FxHashMap<String, InterpreterFactory>>,
    enforcers: RwLock<FxHashMap<String, FailureHandling>>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            reporters: RwLock::new(FxHashMap::default()),
            interpreters: RwLock::new(FxHashMap::default()),
            enforcers: RwLock::new(FxHashMap::default()),
        }
    }

    /// Create a registry with the built-in components
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_reporter("TracingReporter", || {
            Arc::new(TracingReporter::new()) as Arc<dyn Reporter>
        });
        registry.register_reporter("WriterReporter", || {
            Arc::new(WriterReporter::new()) as Arc<dyn Reporter>
        });
        registry.register_reporter("RecordingReporter", || {
            Arc::new(RecordingReporter::new()) as Arc<dyn Reporter>
        });
        registry.register_interpreter("ScriptInterpreter", script_interpreter_factory());
        registry.register_enforcer("DefaultContractEnforcer", FailureHandling::Raise);
        registry.register_enforcer("ReportingContractEnforcer", FailureHandling::Report);
        registry
    }

    /// Register a factory for a reporter type
    pub fn register_reporter<F>(&self, type_name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn Reporter> + Send + Sync + 'static,
    {
        self.reporters
            .write()
            .insert(type_name.to_string(), Arc::new(factory));
    }

    /// Register a factory for an interpreter type
    pub fn register_interpreter(&self, type_name: &str, factory: InterpreterFactory) {
        self.interpreters
            .write()
            .insert(type_name.to_string(), factory);
    }

    /// Register an enforcer type by its failure policy
    pub fn register_enforcer(&self, type_name: &str, failure_handling: FailureHandling) {
        self.enforcers
            .write()
            .insert(type_name.to_string(), failure_handling);
    }

    /// Instantiate a reporter by type name
    pub fn reporter(&self, type_name: &str) -> Option<Arc<dyn Reporter>> {
        let reporters = self.reporters.read();
        lookup(&*reporters, type_name).map(|factory| factory())
    }

    pub fn interpreter_factory(&self, type_name: &str) -> Option<InterpreterFactory> {
        let interpreters = self.interpreters.read();
        lookup(&*interpreters, type_name).cloned()
    }

    pub fn enforcer_policy(&self, type_name: &str) -> Option<FailureHandling> {
        let enforcers = self.enforcers.read();
        lookup(&*enforcers, type_name).copied()
    }

    /// Registered reporter names, sorted
    pub fn reporter_names(&self) -> Vec<String> {
        sorted_keys(&*self.reporters.read())
    }

    pub fn interpreter_names(&self) -> Vec<String> {
        sorted_keys(&*self.interpreters.read())
    }

    pub fn enforcer_names(&self) -> Vec<String> {
        sorted_keys(&*self.enforcers.read())
    }

    /// Process-wide registry with the built-in components
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<ComponentRegistry> = OnceLock::new();
        INSTANCE.get_or_init(ComponentRegistry::with_builtins)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Last segment of a `::` or `.` separated path
pub fn short_name(type_name: &str) -> &str {
    let trimmed = type_name.trim();
    trimmed
        .rsplit(|c: char| c == '.' || c == ':')
        .next()
        .unwrap_or(trimmed)
}

fn lookup<'m, V>(map: &'m FxHashMap<String, V>, type_name: &str) -> Option<&'m V> {
    map.get(type_name.trim())
        .or_else(|| map.get(short_name(type_name)))
}

fn sorted_keys<V>(map: &FxHashMap<String, V>) -> Vec<String> {
    let mut names: Vec<String> = map.keys().cloned().collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::Severity;

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("covenant::reporter::WriterReporter"), "WriterReporter");
        assert_eq!(short_name("org.contract4j5.reporter.WriterReporter"), "WriterReporter");
        assert_eq!(short_name("WriterReporter"), "WriterReporter");
    }

    #[test]
    fn test_builtins() {
        let registry = ComponentRegistry::with_builtins();
        assert_eq!(
            registry.reporter_names(),
            vec!["RecordingReporter", "TracingReporter", "WriterReporter"]
        );
        assert!(registry.interpreter_factory("ScriptInterpreter").is_some());
        assert_eq!(
            registry.enforcer_policy("covenant::ReportingContractEnforcer"),
            Some(FailureHandling::Report)
        );
        assert!(registry.reporter("NoSuchReporter").is_none());
    }

    #[test]
    fn test_factories_create_fresh_reporters() {
        let registry = ComponentRegistry::with_builtins();
        let a = registry.reporter("RecordingReporter").unwrap();
        let b = registry.reporter("RecordingReporter").unwrap();
        a.set_threshold(Severity::Fatal);
        assert_eq!(b.threshold(), Severity::Debug);
    }

    #[test]
    fn test_custom_registration() {
        let registry = ComponentRegistry::new();
        registry.register_enforcer("Lenient", FailureHandling::Report);
        assert_eq!(registry.enforcer_policy("Lenient"), Some(FailureHandling::Report));
        assert!(registry.enforcer_policy("DefaultContractEnforcer").is_none());
    }
}
