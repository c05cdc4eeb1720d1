use crate::convert::{self, ConvertError};
use crate::options::{DefaultOptions, LoggerOptions};
use crate::record::{Level, LogEvent, LogRecord};
use crate::sink::LogSink;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::{Arc, OnceLock, RwLock};

pub type TimestampFormatter = fn(DateTime<Utc>) -> String;
pub type LevelFormatter = fn(&str) -> String;
pub type NameFormatter = fn(&str) -> String;

/// Shaping function applied to every record before it reaches the remote
/// sink. Defaults to [`convert::log_record_to_event`].
pub type EventFormat = fn(&LogRecord) -> Result<LogEvent, ConvertError>;

fn iso_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn capitalized_level(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn name_or_global(name: &str) -> String {
    if name.is_empty() {
        "global".to_string()
    } else {
        name.to_string()
    }
}

/// Configuration of the console prefix: timestamp, capitalized level and
/// scope name prepended to every rendered line.
#[derive(Clone)]
pub struct PrefixConfig {
    pub enabled: bool,
    pub timestamp_formatter: TimestampFormatter,
    pub level_formatter: LevelFormatter,
    pub name_formatter: NameFormatter,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        PrefixConfig {
            enabled: true,
            timestamp_formatter: iso_timestamp,
            level_formatter: capitalized_level,
            name_formatter: name_or_global,
        }
    }
}

impl PrefixConfig {
    /// Render the prefix for one line: `[timestamp] Level (name):`.
    pub fn render(&self, timestamp: DateTime<Utc>, level: Level, name: &str) -> String {
        format!(
            "[{}] {} ({}):",
            (self.timestamp_formatter)(timestamp),
            (self.level_formatter)(level.label()),
            (self.name_formatter)(name),
        )
    }
}

/// Configuration of remote shipping.
///
/// `url` overrides the default collector endpoint
/// (`/api/log/{application}/`); `trace` lists the levels whose records
/// carry a captured stacktrace; `sink` substitutes the transport itself,
/// which is how tests inject a capture sink.
#[derive(Clone)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub timeout_ms: u64,
    pub trace: Vec<Level>,
    pub format: EventFormat,
    pub sink: Option<Arc<dyn LogSink>>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            enabled: true,
            url: None,
            timeout_ms: 1000,
            trace: vec![Level::Error],
            format: convert::log_record_to_event,
            sink: None,
        }
    }
}

/// Everything [`initialize`](LogContext::initialize) wires up. Built once
/// per context and read-only afterwards.
pub(crate) struct Wiring {
    pub prefix: PrefixConfig,
    pub trace: Vec<Level>,
    pub format: EventFormat,
    /// Leading stacktrace lines stripped as call-site noise: one frame
    /// when prefixing wraps the call, none otherwise.
    pub depth: usize,
    pub sink: Option<Arc<dyn LogSink>>,
    pub runtime: Option<tokio::runtime::Handle>,
}

/// Options accepted by [`LogContext::initialize`].
#[derive(Clone, Default)]
pub struct InitOptions {
    /// Becomes the context's process-wide defaults, normalized.
    pub defaults: LoggerOptions,
    pub prefix: PrefixConfig,
    pub remote: RemoteConfig,
}

/// Shared logging context owned by the application's composition root.
///
/// Holds the process-wide defaults and the one-shot wiring of the two
/// external collaborators (console prefixing and remote shipping).
/// Facades hold an `Arc` to it and re-read the defaults on every call.
pub struct LogContext {
    defaults: RwLock<DefaultOptions>,
    wiring: OnceLock<Wiring>,
}

impl LogContext {
    pub fn new(defaults: DefaultOptions) -> Self {
        LogContext {
            defaults: RwLock::new(defaults),
            wiring: OnceLock::new(),
        }
    }

    pub fn defaults(&self) -> DefaultOptions {
        self.defaults.read().expect("defaults lock poisoned").clone()
    }

    /// Replace the process-wide defaults, normalizing missing fields to
    /// their fallbacks.
    pub fn set_defaults(&self, options: &LoggerOptions) {
        *self.defaults.write().expect("defaults lock poisoned") = DefaultOptions::new(options);
    }

    /// One-time wiring of prefixing and remote shipping.
    ///
    /// The first call replaces the defaults from `options.defaults`,
    /// installs the console subscriber when prefixing is enabled, and
    /// builds the remote sink when shipping is enabled. Every later call
    /// is a no-op.
    ///
    /// **Returns**
    /// - `true` if this call performed the wiring.
    /// - `false` if the context was already initialized.
    pub fn initialize(&self, options: InitOptions) -> bool {
        let mut performed = false;
        self.wiring.get_or_init(|| {
            performed = true;
            self.set_defaults(&options.defaults);

            let prefix = options.prefix;
            let remote = options.remote;
            let depth = if prefix.enabled { 1 } else { 0 };

            if prefix.enabled {
                install_console_subscriber();
            }

            let sink = if remote.enabled {
                remote.sink.clone().or_else(|| {
                    self.build_http_sink(remote.url.as_deref(), remote.timeout_ms)
                })
            } else {
                None
            };

            Wiring {
                prefix,
                trace: remote.trace,
                format: remote.format,
                depth,
                sink,
                // Sends are spawned onto the runtime that was current at
                // initialization; without one, remote shipping stays off.
                runtime: tokio::runtime::Handle::try_current().ok(),
            }
        });
        performed
    }

    pub fn is_initialized(&self) -> bool {
        self.wiring.get().is_some()
    }

    pub(crate) fn wiring(&self) -> Option<&Wiring> {
        self.wiring.get()
    }

    #[cfg(feature = "http")]
    fn build_http_sink(&self, url: Option<&str>, timeout_ms: u64) -> Option<Arc<dyn LogSink>> {
        let url = url.map(str::to_string).unwrap_or_else(|| {
            crate::http::default_endpoint(&self.defaults().application)
        });
        Some(Arc::new(crate::http::HttpSink::new(
            url,
            std::time::Duration::from_millis(timeout_ms),
        )))
    }

    #[cfg(not(feature = "http"))]
    fn build_http_sink(&self, _url: Option<&str>, _timeout_ms: u64) -> Option<Arc<dyn LogSink>> {
        None
    }
}

impl Default for LogContext {
    fn default() -> Self {
        LogContext::new(DefaultOptions::default())
    }
}

/// Install a `fmt` subscriber so prefixed lines reach the console.
///
/// Another context (or the host application) may already own the global
/// subscriber; losing that race is fine, the existing one keeps serving.
fn install_console_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    let subscriber = Registry::default().with(tracing_subscriber::fmt::layer());
    let _ = tracing::subscriber::set_global_default(subscriber);
}
