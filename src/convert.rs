use crate::record::{
    CaughtError, CustomInfo, ErrorEvent, ErrorInfo, JsDiagnostics, LogEvent, LogRecord,
};
use serde::Deserialize;
use serde_json::Value;

/// Sentinel prefix left on a record's message when the call site logged a
/// structured object: the producer serializes it as the default string
/// conversion ("Object") followed by the JSON body. Stripping it is the
/// seam for recovering the original payload.
const OBJECT_KEYWORD: &str = "Object";

/// Errors surfaced by the two converters. No local recovery happens here;
/// both variants propagate to the immediate caller.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    /// The value handed to [`error_to_event`] did not have the
    /// conventional error shape (`name`, `message`, `stack`).
    #[error("Only Error objects can be converted")]
    NotAnError,

    /// The "Object"-prefixed remainder of a record message was not valid
    /// JSON. Propagated rather than swallowed; the message producer broke
    /// the encoding contract.
    #[error("malformed embedded payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// Structured payload recovered from an "Object"-prefixed message.
#[derive(Debug, Deserialize)]
struct EmbeddedPayload {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error: Option<Value>,
}

/// Shape a [`LogRecord`] into the flat [`LogEvent`] the collector ingests.
///
/// Copies the record's fields, flattens the composite level into `level`
/// (label) and `severity` (value), and recovers a structured payload from
/// an "Object"-prefixed message. When the embedded payload carries an
/// `error`, it supersedes the raw `stacktrace` text, which is dropped to
/// avoid duplicate trace data.
pub fn log_record_to_event(record: &LogRecord) -> Result<LogEvent, ConvertError> {
    let mut event = LogEvent {
        message: record.message.clone(),
        level: record.level.label.clone(),
        severity: record.level.value,
        logger: record.logger.clone(),
        timestamp: record.timestamp.clone(),
        stacktrace: record.stacktrace.clone(),
        error: None,
    };

    if let Some(encoded) = record.message.strip_prefix(OBJECT_KEYWORD) {
        let parsed: EmbeddedPayload = serde_json::from_str(encoded)?;
        event.message = parsed.message;
        if let Some(error) = parsed.error {
            event.error = Some(error);
            event.stacktrace = None;
        }
    }

    Ok(event)
}

/// Shape a caught error value into a minimal [`ErrorEvent`].
///
/// The value must be recognizable as error-like: an object carrying string
/// `name`, `message` and `stack` fields. Anything else fails with
/// [`ConvertError::NotAnError`]; callers are expected to route only error
/// payloads here.
pub fn error_to_event(value: &Value) -> Result<ErrorEvent, ConvertError> {
    let obj = value.as_object().ok_or(ConvertError::NotAnError)?;

    let field = |key: &str| obj.get(key).and_then(Value::as_str);
    let (name, message, stack) = match (field("name"), field("message"), field("stack")) {
        (Some(name), Some(message), Some(stack)) => (name, message, stack),
        _ => return Err(ConvertError::NotAnError),
    };

    let mut caught = CaughtError::new(name, message, stack);
    caught.number = obj.get("number").and_then(Value::as_i64);
    caught.line_number = obj.get("lineNumber").and_then(Value::as_u64).map(|n| n as u32);
    caught.column_number = obj.get("columnNumber").and_then(Value::as_u64).map(|n| n as u32);
    caught.file_name = field("fileName").map(str::to_string);

    Ok(caught_error_to_event(&caught))
}

/// Infallible conversion for an already-typed [`CaughtError`].
///
/// The top-level `message` and `error.message` intentionally duplicate the
/// error's message text; the collector schema expects both.
pub fn caught_error_to_event(caught: &CaughtError) -> ErrorEvent {
    let diagnostics = JsDiagnostics {
        error_number: caught.number,
        line_number: caught.line_number,
        column_number: caught.column_number,
        file_name: caught.file_name.clone(),
    };

    ErrorEvent {
        message: caught.message.clone(),
        error: ErrorInfo {
            kind: caught.name.clone(),
            message: caught.message.clone(),
            stacktrace: caught.stack.lines().map(str::to_string).collect(),
            custom: if diagnostics.is_empty() {
                None
            } else {
                Some(CustomInfo {
                    javascript: diagnostics,
                })
            },
        },
    }
}
