use crate::record::LogEvent;
use async_trait::async_trait;
use std::error::Error;

/// Asynchronous destination for [`LogEvent`]s produced by the facade.
///
/// Implementations transport events to a concrete collector (the HTTP
/// endpoint, stdout, a test capture). The facade hands events over
/// fire-and-forget from a spawned task and never awaits delivery on the
/// logging thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send a single log event to the underlying collector.
    ///
    /// **Parameters**
    /// - `event`: fully-shaped [`LogEvent`] produced by the converter.
    ///
    /// **Returns**
    /// - `Ok(())` if the event was accepted by the collector.
    /// - `Err(..)` if delivery failed (network error, serialization
    ///   error, HTTP status, etc.). The facade reports the failure on
    ///   stderr and drops the event; there is no retry at this layer.
    async fn send(&self, event: &LogEvent) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered events, if the sink implements buffering.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
