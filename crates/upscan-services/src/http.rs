//! HTTP scanning service adapter.
//!
//! The service receives the raw upload as the request body and answers with
//! `{"clean": bool, "threat": string?}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use upscan_core::{CustomScannerConfig, FileDescriptor};
use upscan_processing::{AdapterError, ScannerAdapter};

const SCANNER_NAME: &str = "HTTP scanner";

#[derive(Debug, Deserialize)]
struct ScanVerdict {
    clean: bool,
    #[serde(default)]
    threat: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpScanner {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl HttpScanner {
    pub fn new(url: String, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url,
            timeout_secs,
        })
    }

    pub fn from_config(config: &CustomScannerConfig) -> anyhow::Result<Self> {
        let url = format!("http://{}:{}{}", config.host, config.port, config.path);
        Self::new(url, config.timeout_secs)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_error(&self, e: reqwest::Error) -> AdapterError {
        if e.is_timeout() {
            AdapterError::Timeout {
                scanner: SCANNER_NAME.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            AdapterError::Unavailable {
                scanner: SCANNER_NAME.to_string(),
                reason: e.to_string(),
            }
        }
    }

    fn invalid_response(response: impl Into<String>) -> AdapterError {
        AdapterError::InvalidResponse {
            scanner: SCANNER_NAME.to_string(),
            response: response.into(),
        }
    }
}

#[async_trait]
impl ScannerAdapter for HttpScanner {
    fn name(&self) -> &str {
        SCANNER_NAME
    }

    #[tracing::instrument(skip(self, file), fields(url = %self.url, filename = %file.original_name))]
    async fn scan(&self, file: &FileDescriptor) -> Result<(), AdapterError> {
        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(file.content.clone())
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "HTTP scanner returned an error status");
            return Err(Self::invalid_response(format!("HTTP status {}", status)));
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        let verdict: ScanVerdict = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse HTTP scanner response");
            Self::invalid_response(String::from_utf8_lossy(&body).into_owned())
        })?;

        let duration_ms = start.elapsed().as_millis();
        if verdict.clean {
            tracing::info!(duration_ms, "File scan completed: clean");
            Ok(())
        } else {
            let threat = verdict.threat.unwrap_or_else(|| "unknown".to_string());
            tracing::warn!(duration_ms, threat = %threat, "File scan detected threat");
            Err(AdapterError::Infected {
                scanner: SCANNER_NAME.to_string(),
                threat,
            })
        }
    }

    /// Any HTTP answer counts as reachable.
    async fn ping(&self) -> Result<(), AdapterError> {
        self.client
            .head(&self.url)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| self.request_error(e))
    }
}
