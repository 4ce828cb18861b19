//! Logging shim — forwards messages to a host-supplied callback and always
//! mirrors them into `tracing` at the matching level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// Host logging channel. The return value is never inspected.
pub type LogCallback = Arc<dyn Fn(&str, LogLevel) + Send + Sync>;

/// Send `message` to `callback` (if any) and emit it as a `tracing` event.
pub fn log_message(message: &str, level: LogLevel, callback: Option<&LogCallback>) {
    if let Some(callback) = callback {
        callback(message, level);
    }

    match level {
        LogLevel::Info => info!(target: "beacon", "{message}"),
        LogLevel::Warn => warn!(target: "beacon", "{message}"),
        LogLevel::Error => error!(target: "beacon", "{message}"),
        LogLevel::Debug => debug!(target: "beacon", "{message}"),
    }
}

/// Callback that records every line, for tests and host-side inspection.
#[derive(Default)]
pub struct CaptureLog {
    lines: parking_lot::Mutex<Vec<(String, LogLevel)>>,
}

impl CaptureLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A `LogCallback` that appends to this capture.
    pub fn callback(self: &Arc<Self>) -> LogCallback {
        let capture = Arc::clone(self);
        Arc::new(move |message: &str, level: LogLevel| {
            capture.lines.lock().push((message.to_string(), level));
        })
    }

    pub fn lines(&self) -> Vec<(String, LogLevel)> {
        self.lines.lock().clone()
    }

    pub fn count_level(&self, level: LogLevel) -> usize {
        self.lines.lock().iter().filter(|(_, l)| *l == level).count()
    }
}
