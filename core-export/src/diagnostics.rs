//! Helpers for reporting to the injected [`LoggerSink`].

use bridge_traits::diagnostics::{LogEntry, LogLevel, LoggerSink};

/// Category every export diagnostic is filed under.
pub const EXPORT_CATEGORY: &str = "export";

/// Send one entry about `clip` to the host sink.
pub(crate) fn report(
    logger: &dyn LoggerSink,
    level: LogLevel,
    clip: &str,
    step: &str,
    message: impl Into<String>,
) {
    if level < logger.min_level() {
        return;
    }

    let entry = LogEntry::new(level, EXPORT_CATEGORY, message)
        .with_field("clip", clip)
        .with_field("step", step);
    logger.log(entry);
}
