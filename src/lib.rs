pub mod record;
pub mod convert;
pub mod options;
pub mod context;
pub mod facade;
pub mod sink;

#[cfg(feature = "http")]
pub mod http;

pub mod noop_sink;

pub use context::{InitOptions, LogContext, PrefixConfig, RemoteConfig};
pub use facade::{LeveledLogger, LogPayload, Logger};
pub use options::{DefaultOptions, LoggerOptions};
pub use record::{CaughtError, ErrorEvent, Level, LogEvent, LogRecord};
