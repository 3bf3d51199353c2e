//! Diagnostics Abstractions
//!
//! Provides the injectable logging sink the export pipeline reports through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::platform::PlatformSendSync;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Structured log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Category the entry belongs to (e.g. `export`)
    pub target: String,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: HashMap<String, String>,
    /// Span the entry was emitted in, if any
    pub span_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span_id: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }
}

/// Logger sink trait
///
/// Receives `(severity, category, message)` entries from the export pipeline
/// and forwards them to whatever the host uses for diagnostics: a console, a
/// log file, a GUI panel.
///
/// Implementations must not panic and must not block for long: the pipeline
/// calls `log` inline on every failure branch and never inspects the outcome.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::diagnostics::{LoggerSink, LogEntry, LogLevel};
///
/// fn report(logger: &dyn LoggerSink, clip: &str) {
///     let entry = LogEntry::new(LogLevel::Warn, "export", "unsupported clip")
///         .with_field("clip", clip);
///     logger.log(entry);
/// }
/// ```
pub trait LoggerSink: PlatformSendSync {
    /// Forward a log entry to the host logging system
    fn log(&self, entry: LogEntry);

    /// Flush any buffered logs
    fn flush(&self) {}

    /// Get the minimum log level that will be processed
    ///
    /// Entries below this level can be filtered out at the source.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }

    /// Convenience wrapper for the common `(severity, category, message)` form.
    fn emit(&self, level: LogLevel, category: &str, message: &str) {
        if level >= self.min_level() {
            self.log(LogEntry::new(level, category, message));
        }
    }
}

/// Sink that drops everything. Used when the host does not care.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl LoggerSink for NoopLogger {
    fn log(&self, _entry: LogEntry) {}

    fn min_level(&self) -> LogLevel {
        LogLevel::Error
    }
}

/// Console logger implementation for testing/development
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    pub min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
        }
    }
}

impl LoggerSink for ConsoleLogger {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        eprintln!(
            "[{}] {} {}: {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            entry.level,
            entry.target,
            entry.message
        );

        if !entry.fields.is_empty() {
            eprintln!("  Fields: {:?}", entry.fields);
        }
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    impl LoggerSink for RecordingSink {
        fn log(&self, entry: LogEntry) {
            self.entries.lock().push(entry);
        }

        fn min_level(&self) -> LogLevel {
            LogLevel::Debug
        }
    }

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(LogLevel::Info, "test", "Test message")
            .with_field("clip", "footsteps")
            .with_span_id("export");

        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.target, "test");
        assert_eq!(entry.message, "Test message");
        assert_eq!(entry.fields.get("clip"), Some(&"footsteps".to_string()));
        assert_eq!(entry.span_id, Some("export".to_string()));
    }

    #[test]
    fn test_emit_respects_min_level() {
        let sink = RecordingSink::default();
        sink.emit(LogLevel::Trace, "export", "dropped");
        sink.emit(LogLevel::Warn, "export", "kept");

        let entries = sink.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
        assert_eq!(entries[0].target, "export");
    }

    #[test]
    fn test_level_ordering_and_display() {
        assert!(LogLevel::Error > LogLevel::Warn);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
    }

    #[test]
    fn test_noop_and_console_loggers_accept_entries() {
        NoopLogger.log(LogEntry::new(LogLevel::Error, "export", "ignored"));
        ConsoleLogger::default().log(LogEntry::new(LogLevel::Debug, "export", "filtered"));
    }
}
