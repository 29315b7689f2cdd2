//! Structured JSON logger.
//!
//! - Structured logs (JSON), one log line = one event
//! - Deterministic key ordering
//! - Synchronous, no buffering
//!
//! The logger is an owned handle with a severity threshold, passed into
//! component constructors; there is no process-wide mutable log level.

use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger with a severity threshold.
///
/// Events below the threshold are dropped; `Error` events go to stderr,
/// everything else to stdout.
#[derive(Debug, Clone)]
pub struct Logger {
    threshold: Severity,
}

impl Logger {
    /// Creates a logger that emits events at or above `threshold`.
    pub fn new(threshold: Severity) -> Self {
        Self { threshold }
    }

    /// Returns true when events at `severity` would be emitted.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    /// Log an event with the given severity and fields.
    ///
    /// Fields are output in deterministic order (alphabetical by key).
    pub fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !self.enabled(severity) {
            return;
        }
        if severity == Severity::Error {
            Self::log_to_writer(severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(severity, event, fields, &mut io::stdout());
        }
    }

    /// Internal log implementation that writes to a given writer
    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let mut output = String::with_capacity(256);

        output.push('{');

        // Always output event first
        output.push_str("\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push('"');

        // Then severity
        output.push_str(",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        // Sort fields alphabetically for deterministic output
        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push('}');
        output.push('\n');

        // Write atomically (one syscall)
        let _ = writer.write_all(output.as_bytes());
        let _ = writer.flush();
    }

    /// Escape special characters for JSON strings
    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }
}

impl Default for Logger {
    /// Warn-level threshold; queries run quiet unless something is off.
    fn default() -> Self {
        Self::new(Severity::Warn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_threshold_filters() {
        let logger = Logger::new(Severity::Warn);
        assert!(!logger.enabled(Severity::Trace));
        assert!(!logger.enabled(Severity::Info));
        assert!(logger.enabled(Severity::Warn));
        assert!(logger.enabled(Severity::Error));
    }

    #[test]
    fn test_escaping() {
        let mut out = String::new();
        Logger::escape_json_string(&mut out, "a\"b\\c\nd");
        assert_eq!(out, "a\\\"b\\\\c\\nd");
    }
}
