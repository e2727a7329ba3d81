//! Ordered key/value property sources

use crate::configurator::{ConfigError, PROPERTY_PREFIX};
use std::path::Path;
use tracing::debug;

/// Environment variables with this prefix map onto `org.contract4j5.` keys,
/// e.g. `CONTRACT4J5_Pre=off` becomes `org.contract4j5.Pre=off`.
pub const ENV_PREFIX: &str = "CONTRACT4J5_";

/// Properties in the order they were defined. Later definitions of a key
/// override earlier ones when read through [`PropertySource::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySource {
    entries: Vec<(String, String)>,
}

impl PropertySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Last value defined for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every entry of `other` after this source's entries
    pub fn merge(&mut self, other: PropertySource) {
        self.entries.extend(other.entries);
    }

    /// Parse `.properties` text: `key=value`, `key: value` or `key value`
    /// lines, `#`/`!` comments and trailing-backslash continuations.
    pub fn from_properties_str(text: &str) -> Self {
        let mut source = Self::new();
        let mut pending = String::new();

        for raw in text.lines() {
            let line = raw.trim_start();
            if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            let trimmed = line.trim_end();
            if let Some(continued) = trimmed.strip_suffix('\\') {
                pending.push_str(continued);
                continue;
            }
            pending.push_str(trimmed);

            let logical = std::mem::take(&mut pending);
            if let Some((key, value)) = split_property(&logical) {
                source.set(key, value);
            }
        }

        if !pending.is_empty() {
            if let Some((key, value)) = split_property(&pending) {
                source.set(key, value);
            }
        }

        source
    }

    /// Flatten a TOML document into dotted keys. Arrays become
    /// comma separated lists.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
        let mut source = Self::new();
        flatten_table("", &table, &mut source);
        Ok(source)
    }

    /// Load a file, choosing the format by extension (`.toml` or anything
    /// else as properties text)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loading properties");

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            _ => Ok(Self::from_properties_str(&text)),
        }
    }

    /// Collect `CONTRACT4J5_*` variables from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut source = Self::new();
        for (name, value) in vars {
            if let Some(key) = name.as_ref().strip_prefix(ENV_PREFIX) {
                if !key.is_empty() {
                    source.set(format!("{}{}", PROPERTY_PREFIX, key), value);
                }
            }
        }
        source
    }
}

fn split_property(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let split_at = line.find(|c: char| c == '=' || c == ':' || c.is_whitespace());
    match split_at {
        Some(idx) => {
            let key = line[..idx].trim_end();
            let rest = line[idx..].trim_start();
            let value = rest
                .strip_prefix('=')
                .or_else(|| rest.strip_prefix(':'))
                .unwrap_or(rest)
                .trim();
            Some((key.to_string(), value.to_string()))
        }
        None => Some((line.to_string(), String::new())),
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut PropertySource) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(inner) => flatten_table(&full_key, inner, out),
            other => out.set(full_key, toml_scalar(other)),
        }
    }
}

fn toml_scalar(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        toml::Value::Array(items) => items
            .iter()
            .map(toml_scalar)
            .collect::<Vec<_>>()
            .join(", "),
        toml::Value::Table(_) => String::new(),
    }
}
