use crate::context::{LogContext, Wiring};
use crate::convert;
use crate::options::{DefaultOptions, LoggerOptions};
use crate::record::{CaughtError, Level, LogRecord};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// What a single log call carries. The payload kind is decided at the
/// call site, so the facade never has to guess whether an argument "is"
/// an error.
#[derive(Debug, Clone)]
pub enum LogPayload {
    /// Plain text, forwarded unchanged.
    Text(String),
    /// A structured value, encoded for the collector with the `Object`
    /// sentinel so the converter can recover it.
    Structured(Value),
    /// A caught error, converted to a structured error event before
    /// logging.
    Error(CaughtError),
}

impl From<&str> for LogPayload {
    fn from(text: &str) -> Self {
        LogPayload::Text(text.to_string())
    }
}

impl From<String> for LogPayload {
    fn from(text: String) -> Self {
        LogPayload::Text(text)
    }
}

impl From<Value> for LogPayload {
    fn from(value: Value) -> Self {
        LogPayload::Structured(value)
    }
}

impl From<CaughtError> for LogPayload {
    fn from(caught: CaughtError) -> Self {
        LogPayload::Error(caught)
    }
}

/// The five leveled methods, each defaulting to a no-op.
///
/// [`Logger`] overrides all of them; the no-op defaults exist so tests
/// can substitute an inert or recording double wherever a logger is
/// expected.
pub trait LeveledLogger {
    fn trace(&self, _payload: LogPayload) {}
    fn debug(&self, _payload: LogPayload) {}
    fn info(&self, _payload: LogPayload) {}
    fn warn(&self, _payload: LogPayload) {}
    fn error(&self, _payload: LogPayload) {}
}

/// Per-instance logging facade.
///
/// Holds raw instance options and a handle to the shared [`LogContext`];
/// the effective configuration is recomputed from both on every call, so
/// changes to the context defaults take effect immediately.
pub struct Logger {
    context: Arc<LogContext>,
    options: LoggerOptions,
}

impl Logger {
    pub fn new(context: Arc<LogContext>) -> Self {
        Logger::with_options(context, LoggerOptions::default())
    }

    pub fn with_options(context: Arc<LogContext>, options: LoggerOptions) -> Self {
        Logger { context, options }
    }

    /// Effective options: context defaults overlaid with this instance's
    /// options, instance values winning. Computed fresh; never cached.
    pub fn options(&self) -> DefaultOptions {
        self.context.defaults().merged_with(&self.options)
    }

    /// Replace the instance options verbatim. No validation and no merge
    /// happen here; fallbacks apply only when the effective options are
    /// computed.
    pub fn set_options(&mut self, options: LoggerOptions) {
        self.options = options;
    }

    /// The effective scope name, or the facade's own type name when the
    /// merged scope is empty.
    pub fn log_scope(&self) -> String {
        let scope = self.options().log_scope;
        if scope.is_empty() {
            "Logger".to_string()
        } else {
            scope
        }
    }

    /// Parameterized dispatch shared by the five level methods.
    fn log(&self, level: Level, payload: LogPayload) {
        let effective = self.options();
        if level < effective.min_level {
            return;
        }

        let scope = self.log_scope();
        let message = match payload {
            LogPayload::Text(text) => text,
            LogPayload::Structured(value) => format!("Object{}", value),
            LogPayload::Error(caught) => {
                let event = convert::caught_error_to_event(&caught);
                match serde_json::to_value(&event) {
                    Ok(value) => format!("Object{}", value),
                    Err(e) => {
                        eprintln!("failed to encode error event: {}", e);
                        return;
                    }
                }
            }
        };

        let wiring = self.context.wiring();
        let now = Utc::now();

        let line = match wiring {
            Some(w) if w.prefix.enabled => {
                format!("{} {}", w.prefix.render(now, level, &scope), message)
            }
            _ => message.clone(),
        };
        emit_console(level, &line);

        if let Some(w) = wiring {
            self.ship(w, level, scope, message, now);
        }
    }

    /// Hand one record to the remote sink, fire-and-forget. Conversion
    /// failures and delivery failures are reported on stderr; the facade
    /// never logs its own failures through itself.
    fn ship(&self, wiring: &Wiring, level: Level, scope: String, message: String, now: chrono::DateTime<Utc>) {
        let (sink, runtime) = match (&wiring.sink, &wiring.runtime) {
            (Some(sink), Some(runtime)) => (Arc::clone(sink), runtime.clone()),
            _ => return,
        };

        let stacktrace = if wiring.trace.contains(&level) {
            Some(capture_stacktrace(wiring.depth))
        } else {
            None
        };

        let record = LogRecord {
            message,
            level: level.info(),
            logger: scope,
            timestamp: (wiring.prefix.timestamp_formatter)(now),
            stacktrace,
        };

        match (wiring.format)(&record) {
            Ok(event) => {
                runtime.spawn(async move {
                    if let Err(e) = sink.send(&event).await {
                        eprintln!("error shipping log event: {}", e);
                    }
                });
            }
            Err(e) => eprintln!("error converting log record: {}", e),
        }
    }
}

impl LeveledLogger for Logger {
    fn trace(&self, payload: LogPayload) {
        self.log(Level::Trace, payload);
    }

    fn debug(&self, payload: LogPayload) {
        self.log(Level::Debug, payload);
    }

    fn info(&self, payload: LogPayload) {
        self.log(Level::Info, payload);
    }

    fn warn(&self, payload: LogPayload) {
        self.log(Level::Warn, payload);
    }

    fn error(&self, payload: LogPayload) {
        self.log(Level::Error, payload);
    }
}

fn emit_console(level: Level, line: &str) {
    match level {
        Level::Trace => tracing::trace!("{}", line),
        Level::Debug => tracing::debug!("{}", line),
        Level::Info => tracing::info!("{}", line),
        Level::Warn => tracing::warn!("{}", line),
        Level::Error => tracing::error!("{}", line),
    }
}

/// Capture the current stack, dropping `depth` leading frames of
/// facade-internal noise.
fn capture_stacktrace(depth: usize) -> String {
    let raw = std::backtrace::Backtrace::force_capture().to_string();
    raw.lines()
        .skip(depth)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{InitOptions, PrefixConfig, RemoteConfig};
    use crate::record::LogEvent;
    use crate::sink::LogSink;
    use async_trait::async_trait;
    use std::error::Error;
    use tokio::sync::mpsc;

    struct CaptureSink {
        tx: mpsc::UnboundedSender<LogEvent>,
    }

    #[async_trait]
    impl LogSink for CaptureSink {
        async fn send(&self, event: &LogEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.tx
                .send(event.clone())
                .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)
        }
    }

    fn wired_context(
        defaults: LoggerOptions,
    ) -> (Arc<LogContext>, mpsc::UnboundedReceiver<LogEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(LogContext::default());
        ctx.initialize(InitOptions {
            defaults,
            prefix: PrefixConfig {
                enabled: false,
                ..PrefixConfig::default()
            },
            remote: RemoteConfig {
                sink: Some(Arc::new(CaptureSink { tx })),
                ..RemoteConfig::default()
            },
        });
        (ctx, rx)
    }

    #[tokio::test]
    async fn plain_payload_reaches_the_sink_shaped_as_an_event() {
        let (ctx, mut rx) = wired_context(LoggerOptions::new().log_scope("checkout"));
        let logger = Logger::new(ctx);

        logger.info("payment accepted".into());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.message, "payment accepted");
        assert_eq!(event.level, "info");
        assert_eq!(event.severity, 2);
        assert_eq!(event.logger, "checkout");
        assert_eq!(event.error, None);
        assert_eq!(event.stacktrace, None);
    }

    #[tokio::test]
    async fn error_payload_reaches_the_sink_as_a_structured_event() {
        let (ctx, mut rx) = wired_context(LoggerOptions::new());
        let logger = Logger::new(ctx);

        let caught = CaughtError::new("TypeError", "boom", "TypeError: boom\nat main");
        logger.warn(caught.into());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.message, "boom");
        assert_eq!(event.level, "warn");
        let error = event.error.unwrap();
        assert_eq!(error["type"], "TypeError");
        assert_eq!(error["message"], "boom");
        assert_eq!(error["stacktrace"][1], "at main");
        // The structured error payload supersedes any raw stack text.
        assert_eq!(event.stacktrace, None);
    }

    #[tokio::test]
    async fn calls_below_the_effective_minimum_level_are_suppressed() {
        let (ctx, mut rx) = wired_context(LoggerOptions::new().min_level(Level::Info));
        let logger = Logger::new(ctx);

        logger.debug("ignored".into());
        logger.info("kept".into());

        // Only the info call made it through.
        let event = rx.recv().await.unwrap();
        assert_eq!(event.message, "kept");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn instance_min_level_overrides_the_context_default() {
        let (ctx, mut rx) = wired_context(LoggerOptions::new().min_level(Level::Error));
        let mut logger = Logger::new(ctx);
        logger.set_options(LoggerOptions::new().min_level(Level::Trace));

        logger.trace("visible".into());
        assert_eq!(rx.recv().await.unwrap().message, "visible");
    }

    #[tokio::test]
    async fn error_level_records_carry_a_stacktrace() {
        let (ctx, mut rx) = wired_context(LoggerOptions::new());
        let logger = Logger::new(ctx);

        logger.error("exploded".into());

        let event = rx.recv().await.unwrap();
        assert!(event.stacktrace.is_some());
    }

    #[tokio::test]
    async fn structured_payload_round_trips_through_the_sentinel() {
        let (ctx, mut rx) = wired_context(LoggerOptions::new());
        let logger = Logger::new(ctx);

        logger.info(serde_json::json!({"message": "order placed", "order_id": 7}).into());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.message, "order placed");
        assert_eq!(event.error, None);
    }

    #[test]
    fn effective_options_merge_fresh_on_every_call() {
        let ctx = Arc::new(LogContext::default());
        let logger = Logger::with_options(
            Arc::clone(&ctx),
            LoggerOptions::new().min_level(Level::Info),
        );

        let options = logger.options();
        assert_eq!(options.application, "unknown");
        assert_eq!(options.log_scope, "unknown");
        assert_eq!(options.min_level, Level::Info);

        // A later change to the context defaults is visible immediately.
        ctx.set_defaults(&LoggerOptions::new().application("shop"));
        assert_eq!(logger.options().application, "shop");
        assert_eq!(logger.options().min_level, Level::Info);
    }

    #[test]
    fn empty_scope_falls_back_to_the_type_name() {
        let ctx = Arc::new(LogContext::default());
        let mut logger = Logger::new(Arc::clone(&ctx));
        assert_eq!(logger.log_scope(), "unknown");

        logger.set_options(LoggerOptions::new().log_scope(""));
        assert_eq!(logger.log_scope(), "Logger");
    }

    #[test]
    fn default_leveled_logger_methods_are_no_ops() {
        struct Inert;
        impl LeveledLogger for Inert {}

        let inert = Inert;
        inert.info("dropped on the floor".into());
        inert.error("also dropped".into());
    }
}
