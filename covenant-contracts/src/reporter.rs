//! Severity-filtered report sinks

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Report severity, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn from_u8(raw: u8) -> Severity {
        Severity::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(Severity::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No severity matching \"{0}\"")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Lock-free threshold shared by the reporters
#[derive(Debug)]
pub struct Threshold(AtomicU8);

impl Threshold {
    pub fn new(severity: Severity) -> Self {
        Self(AtomicU8::new(severity as u8))
    }

    pub fn get(&self) -> Severity {
        Severity::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, severity: Severity) {
        self.0.store(severity as u8, Ordering::Relaxed);
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::new(Severity::Warn)
    }
}

/// Sink for engine diagnostics.
///
/// `report` never fails; messages below the threshold are dropped.
pub trait Reporter: Send + Sync {
    fn threshold(&self) -> Severity;

    fn set_threshold(&self, severity: Severity);

    /// Write one message unconditionally
    fn emit(&self, severity: Severity, source: &str, message: &str);

    fn report(&self, severity: Severity, source: &str, message: &str) {
        if severity >= self.threshold() {
            self.emit(severity, source, message);
        }
    }

    /// Downcast hook used when configuring writer targets
    fn as_writer_reporter(&self) -> Option<&WriterReporter> {
        None
    }
}

/// Forwards reports to `tracing` events
#[derive(Debug, Default)]
pub struct TracingReporter {
    threshold: Threshold,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(severity: Severity) -> Self {
        Self {
            threshold: Threshold::new(severity),
        }
    }
}

impl Reporter for TracingReporter {
    fn threshold(&self) -> Severity {
        self.threshold.get()
    }

    fn set_threshold(&self, severity: Severity) {
        self.threshold.set(severity);
    }

    fn emit(&self, severity: Severity, source: &str, message: &str) {
        match severity {
            Severity::Debug => debug!(target: "covenant", source, "{}", message),
            Severity::Info => info!(target: "covenant", source, "{}", message),
            Severity::Warn => warn!(target: "covenant", source, "{}", message),
            Severity::Error => error!(target: "covenant", source, "{}", message),
            Severity::Fatal => error!(target: "covenant", source, fatal = true, "{}", message),
        }
    }
}

enum Sink {
    Text(Box<dyn fmt::Write + Send>),
    Stream(Box<dyn io::Write + Send>),
}

impl Sink {
    fn kind(&self) -> &'static str {
        match self {
            Sink::Text(_) => "writer",
            Sink::Stream(_) => "output stream",
        }
    }
}

struct SinkState {
    sink: Sink,
    /// Whether the sink was chosen explicitly rather than defaulted
    explicit: bool,
}

/// Writes `SEVERITY: source: message` lines to a text writer or a byte
/// stream, standard error by default. The last sink set wins.
pub struct WriterReporter {
    threshold: Threshold,
    state: Mutex<SinkState>,
}

impl WriterReporter {
    pub fn new() -> Self {
        Self {
            threshold: Threshold::default(),
            state: Mutex::new(SinkState {
                sink: Sink::Stream(Box::new(io::stderr())),
                explicit: false,
            }),
        }
    }

    pub fn with_writer<W: fmt::Write + Send + 'static>(writer: W) -> Self {
        let reporter = Self::new();
        reporter.set_writer(Box::new(writer));
        reporter
    }

    pub fn with_stream<S: io::Write + Send + 'static>(stream: S) -> Self {
        let reporter = Self::new();
        reporter.set_output_stream(Box::new(stream));
        reporter
    }

    /// Route output to a text writer, replacing any stream
    pub fn set_writer(&self, writer: Box<dyn fmt::Write + Send>) {
        self.replace_sink(Sink::Text(writer));
    }

    /// Route output to a byte stream, replacing any writer
    pub fn set_output_stream(&self, stream: Box<dyn io::Write + Send>) {
        self.replace_sink(Sink::Stream(stream));
    }

    fn replace_sink(&self, sink: Sink) {
        let mut state = self.state.lock();
        if state.explicit && state.sink.kind() != sink.kind() {
            warn!(
                previous = state.sink.kind(),
                next = sink.kind(),
                "WriterReporter already had a sink configured; the last one set wins"
            );
        }
        state.sink = sink;
        state.explicit = true;
    }

    /// Kind of the current sink: `"writer"` or `"output stream"`
    pub fn sink_kind(&self) -> &'static str {
        self.state.lock().sink.kind()
    }
}

impl Default for WriterReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WriterReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterReporter")
            .field("threshold", &self.threshold.get())
            .field("sink", &self.sink_kind())
            .finish()
    }
}

impl Reporter for WriterReporter {
    fn threshold(&self) -> Severity {
        self.threshold.get()
    }

    fn set_threshold(&self, severity: Severity) {
        self.threshold.set(severity);
    }

    fn emit(&self, severity: Severity, source: &str, message: &str) {
        let line = format!("{}: {}: {}\n", severity, source, message);
        let mut state = self.state.lock();
        // A broken sink must not turn a report into a failure
        let _ = match &mut state.sink {
            Sink::Text(writer) => writer.write_str(&line).map_err(|_| ()),
            Sink::Stream(stream) => stream
                .write_all(line.as_bytes())
                .and_then(|_| stream.flush())
                .map_err(|_| ()),
        };
    }

    fn as_writer_reporter(&self) -> Option<&WriterReporter> {
        Some(self)
    }
}

/// One captured report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub severity: Severity,
    pub source: String,
    pub message: String,
}

/// Keeps every report above the threshold in memory
#[derive(Debug)]
pub struct RecordingReporter {
    threshold: Threshold,
    entries: Mutex<Vec<ReportEntry>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::with_threshold(Severity::Debug)
    }

    pub fn with_threshold(severity: Severity) -> Self {
        Self {
            threshold: Threshold::new(severity),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.lock().clone()
    }

    /// Entries at exactly this severity
    pub fn entries_at(&self, severity: Severity) -> Vec<ReportEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.severity == severity)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for RecordingReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for RecordingReporter {
    fn threshold(&self) -> Severity {
        self.threshold.get()
    }

    fn set_threshold(&self, severity: Severity) {
        self.threshold.set(severity);
    }

    fn emit(&self, severity: Severity, source: &str, message: &str) {
        self.entries.lock().push(ReportEntry {
            severity,
            source: source.to_string(),
            message: message.to_string(),
        });
    }
}

/// Cloneable in-memory text writer, handy as a `WriterReporter` target
#[derive(Debug, Clone, Default)]
pub struct SharedText(Arc<Mutex<String>>);

impl SharedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.0.lock().clone()
    }
}

impl fmt::Write for SharedText {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.lock().push_str(s);
        Ok(())
    }
}

/// Adapts a byte stream into a text writer
pub struct IoText<W>(pub W);

impl<W: io::Write> fmt::Write for IoText<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0
            .write_all(s.as_bytes())
            .and_then(|_| self.0.flush())
            .map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;
