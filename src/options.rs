use crate::record::Level;

pub const UNKNOWN: &str = "unknown";

/// Process-wide logging defaults, normalized on construction: missing or
/// empty `application` / `log_scope` fall back to `"unknown"`, a missing
/// `min_level` falls back to debug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultOptions {
    pub application: String,
    pub log_scope: String,
    pub min_level: Level,
}

impl DefaultOptions {
    pub fn new(options: &LoggerOptions) -> Self {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        };
        DefaultOptions {
            application: non_empty(&options.application),
            log_scope: non_empty(&options.log_scope),
            min_level: options.min_level.unwrap_or(Level::Debug),
        }
    }

    /// Overlay per-instance options on these defaults, instance values
    /// winning per field. Returns a fresh value; neither source is
    /// touched. Instance values are taken verbatim, empty strings
    /// included.
    pub fn merged_with(&self, instance: &LoggerOptions) -> DefaultOptions {
        DefaultOptions {
            application: instance
                .application
                .clone()
                .unwrap_or_else(|| self.application.clone()),
            log_scope: instance
                .log_scope
                .clone()
                .unwrap_or_else(|| self.log_scope.clone()),
            min_level: instance.min_level.unwrap_or(self.min_level),
        }
    }
}

impl Default for DefaultOptions {
    fn default() -> Self {
        DefaultOptions::new(&LoggerOptions::default())
    }
}

/// Raw per-instance options. Stored verbatim by the facade; normalization
/// and fallbacks happen only at merge time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerOptions {
    pub application: Option<String>,
    pub log_scope: Option<String>,
    pub min_level: Option<Level>,
}

impl LoggerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    pub fn log_scope(mut self, log_scope: impl Into<String>) -> Self {
        self.log_scope = Some(log_scope.into());
        self
    }

    pub fn min_level(mut self, min_level: Level) -> Self {
        self.min_level = Some(min_level);
        self
    }
}
