use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use tokio::time::Duration;

use crate::config::ExtractionConfig;

/// Converts raw PDF bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: Vec<u8>) -> Result<String>;
}

/// Client for a Tika-style extraction endpoint: PUT the raw document bytes,
/// read the extracted plain text back. The whole call is bounded by the
/// configured timeout; any transport error or non-2xx response is a failure.
pub struct HttpExtractionClient {
    http: Client,
    endpoint: String,
}

impl HttpExtractionClient {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build extraction http client")?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl TextExtractor for HttpExtractionClient {
    async fn extract(&self, bytes: Vec<u8>) -> Result<String> {
        let response = self
            .http
            .put(&self.endpoint)
            .header(reqwest::header::ACCEPT, "text/plain")
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("extraction request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("extraction service returned {status}: {detail}");
        }

        response
            .text()
            .await
            .context("failed to read extraction response body")
    }
}
