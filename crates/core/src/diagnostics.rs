//! Generic diagnostic channel — where selector warnings and transport
//! failures go when the host has not supplied a logging callback.
//!
//! Components accept an `Arc<dyn DiagnosticSink>`; the default writes to
//! `tracing`.

use std::sync::Arc;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Receiver for warnings and errors that have no host-level destination.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, severity: Severity, message: &str);

    fn warn(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }
}

/// Writes diagnostics as `tracing` events.
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Warning => warn!(target: "beacon::diagnostics", "{message}"),
            Severity::Error => error!(target: "beacon::diagnostics", "{message}"),
        }
    }
}

/// Discards everything.
pub struct NoOpSink;

impl DiagnosticSink for NoOpSink {
    fn report(&self, _severity: Severity, _message: &str) {}
}

/// In-memory sink that captures diagnostics for testing.
#[derive(Default)]
pub struct CaptureSink {
    entries: parking_lot::Mutex<Vec<(Severity, String)>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            entries: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .count()
    }

    /// Messages of the given severity, in report order.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl DiagnosticSink for CaptureSink {
    fn report(&self, severity: Severity, message: &str) {
        self.entries.lock().push((severity, message.to_string()));
    }
}

/// Convenience: the default `tracing`-backed sink.
pub fn tracing_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(TracingSink)
}

/// Convenience: a sink that drops everything.
pub fn noop_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
