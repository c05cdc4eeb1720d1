use crate::record::LogEvent;
use crate::sink::LogSink;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;

/// Endpoint path for an application under the default collector layout.
pub fn default_endpoint(application: &str) -> String {
    format!("/api/log/{}/", urlencoding::encode(application))
}

/// HTTP implementation of [`LogSink`]: one JSON-encoded [`LogEvent`] per
/// POST to the collector endpoint. No batching and no retry here; a
/// failed send is reported to the caller and the event is gone.
#[derive(Clone)]
pub struct HttpSink {
    client: Client,
    url: String,
}

impl HttpSink {
    /// Construct a sink posting to `url` with the given per-request
    /// timeout.
    ///
    /// **Parameters**
    /// - `url`: full collector URL, e.g. `http://collector:8080/api/log/shop/`.
    /// - `timeout`: request timeout applied to every send.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn send(&self, event: &LogEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        let resp = self.client.post(&self.url).json(event).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("log collector rejected event with status {}: {}", status, text).into())
        }
    }
}
