use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five leveled-logging severities, ordered least to most severe.
///
/// Numeric values follow the upstream collector's convention
/// (`trace = 0` through `error = 4`), so `severity` comparisons and the
/// minimum-level gate can use plain ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

pub const LEVELS: [Level; 5] = [
    Level::Trace,
    Level::Debug,
    Level::Info,
    Level::Warn,
    Level::Error,
];

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Level::Trace => 0,
            Level::Debug => 1,
            Level::Info => 2,
            Level::Warn => 3,
            Level::Error => 4,
        }
    }

    pub fn info(self) -> LevelInfo {
        LevelInfo {
            label: self.label().to_string(),
            value: self.value(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown level label.
#[derive(thiserror::Error, Debug)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

/// Composite level as it appears on a [`LogRecord`]: human label plus
/// numeric severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub label: String,
    pub value: u8,
}

/// One structured record produced per log call, before transport shaping.
///
/// Ephemeral: it exists only for the duration of the call and is handed to
/// the converter (and, indirectly, the remote sink) immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub message: String,
    pub level: LevelInfo,
    pub logger: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
}

/// The transport-ready, flattened payload sent to the remote log sink.
///
/// Always carries `level` (the label text) and `severity` (the numeric
/// value) taken from the originating record's level. `error` holds an
/// arbitrary JSON sub-structure when the record's message encoded one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub message: String,
    pub level: String,
    pub severity: u8,
    pub logger: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

/// Minimal event produced when converting a caught error directly:
/// just the message and the structured error description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
    pub error: ErrorInfo,
}

/// The `error` sub-structure of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub stacktrace: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomInfo>,
}

/// Platform-specific diagnostics, present only when the source error
/// carried at least one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomInfo {
    pub javascript: JsDiagnostics,
}

/// Legacy browser error fields, renamed for the collector schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsDiagnostics {
    pub error_number: Option<i64>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
    pub file_name: Option<String>,
}

impl JsDiagnostics {
    pub fn is_empty(&self) -> bool {
        self.error_number.is_none()
            && self.line_number.is_none()
            && self.column_number.is_none()
            && self.file_name.is_none()
    }
}

/// An error captured at a call site, in the shape the converter accepts:
/// a class name, a message and a raw multi-line stack, plus optional
/// legacy diagnostics.
///
/// This is the typed counterpart of the loose JSON value accepted by
/// [`crate::convert::error_to_event`]; building one guarantees the
/// conversion cannot fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaughtError {
    pub name: String,
    pub message: String,
    pub stack: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(rename = "lineNumber", skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(rename = "columnNumber", skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl CaughtError {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        CaughtError {
            name: name.into(),
            message: message.into(),
            stack: stack.into(),
            number: None,
            line_number: None,
            column_number: None,
            file_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_labels_and_values_follow_collector_numbering() {
        let expected = [
            ("trace", 0),
            ("debug", 1),
            ("info", 2),
            ("warn", 3),
            ("error", 4),
        ];
        for (level, (label, value)) in LEVELS.into_iter().zip(expected) {
            assert_eq!(level.label(), label);
            assert_eq!(level.value(), value);
            assert_eq!(label.parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn unknown_level_label_fails_to_parse() {
        let err = "fatal".parse::<Level>().unwrap_err();
        assert_eq!(err.to_string(), "unknown log level: fatal");
    }

    #[test]
    fn absent_optional_fields_are_omitted_from_event_json() {
        let event = LogEvent {
            message: "m".into(),
            level: "info".into(),
            severity: 2,
            logger: "core".into(),
            timestamp: "2024-01-01T00:00:00Z".into(),
            stacktrace: None,
            error: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("stacktrace"));
        assert!(!obj.contains_key("error"));
    }
}
