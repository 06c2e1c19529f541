use async_trait::async_trait;
use clamav_client::{clean, PONG};
use std::str;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use upscan_core::{CustomScannerConfig, FileDescriptor};
use upscan_processing::{AdapterError, ScannerAdapter};

const SCANNER_NAME: &str = "ClamAV";

/// INSTREAM chunk size; clamd's default `StreamMaxLength` is far above this.
const CHUNK_SIZE: usize = 4096;

const INSTREAM: &[u8] = b"zINSTREAM\0";
const PING: &[u8] = b"zPING\0";

/// ClamAV daemon reached over TCP with the INSTREAM command.
///
/// Always fail-closed: a connection error, an unparseable reply or a timeout is
/// reported as an [`AdapterError`], never as a clean file. The exchange runs on the
/// async runtime, so a timeout or a cancelled scan drops the socket.
#[derive(Debug, Clone)]
pub struct ClamAvScanner {
    host: String,
    port: u16,
    /// Timeout in seconds for each scan operation (default: 30)
    timeout_secs: u64,
}

impl ClamAvScanner {
    /// Create a new ClamAvScanner.
    ///
    /// # Arguments
    /// * `host` - ClamAV daemon hostname
    /// * `port` - ClamAV daemon port (typically 3310)
    pub fn new(host: String, port: u16) -> Self {
        Self::with_timeout(host, port, 30)
    }

    /// Create with a custom scan timeout (for large files or slow ClamAV instances).
    pub fn with_timeout(host: String, port: u16, timeout_secs: u64) -> Self {
        Self {
            host,
            port,
            timeout_secs,
        }
    }

    pub fn from_config(config: &CustomScannerConfig) -> Self {
        Self::with_timeout(config.host.clone(), config.port, config.timeout_secs)
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn unavailable(reason: impl Into<String>) -> AdapterError {
        AdapterError::Unavailable {
            scanner: SCANNER_NAME.to_string(),
            reason: reason.into(),
        }
    }

    fn timeout(&self) -> AdapterError {
        AdapterError::Timeout {
            scanner: SCANNER_NAME.to_string(),
            timeout_secs: self.timeout_secs,
        }
    }

    /// Send one null-terminated command (plus an optional INSTREAM body) and read the
    /// reply until clamd closes the connection.
    async fn exchange(&self, command: &[u8], body: Option<&[u8]>) -> std::io::Result<Vec<u8>> {
        let mut stream = TcpStream::connect(self.address()).await?;
        stream.write_all(command).await?;

        if let Some(data) = body {
            for chunk in data.chunks(CHUNK_SIZE) {
                stream.write_all(&(chunk.len() as u32).to_be_bytes()).await?;
                stream.write_all(chunk).await?;
            }
            stream.write_all(&[0u8; 4]).await?;
        }
        stream.flush().await?;

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        Ok(response)
    }

    async fn scan_bytes(&self, data: &[u8]) -> Result<(), AdapterError> {
        let start = Instant::now();
        tracing::debug!(host = %self.host, port = %self.port, bytes = data.len(), "Starting ClamAV scan");

        let result = match tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.exchange(INSTREAM, Some(data)),
        )
        .await
        {
            Ok(Ok(response_bytes)) => interpret_scan_response(&response_bytes),
            Ok(Err(e)) => Err(Self::unavailable(e.to_string())),
            Err(_) => Err(self.timeout()),
        };

        let duration_ms = start.elapsed().as_millis();
        match &result {
            Ok(()) => tracing::info!(duration_ms, "File scan completed: clean"),
            Err(AdapterError::Infected { threat, .. }) => {
                tracing::warn!(duration_ms, virus = %threat, "File scan detected virus")
            }
            Err(e) => tracing::error!(duration_ms, error = %e, "ClamAV scan failed"),
        }
        result
    }
}

fn interpret_scan_response(response_bytes: &[u8]) -> Result<(), AdapterError> {
    let is_clean = clean(response_bytes).map_err(|e| AdapterError::InvalidResponse {
        scanner: SCANNER_NAME.to_string(),
        response: format!("non UTF-8 reply: {}", e),
    })?;
    if is_clean {
        return Ok(());
    }

    let response_str = str::from_utf8(response_bytes).unwrap_or("unknown");
    match parse_virus_name(response_str) {
        Some(threat) => Err(AdapterError::Infected {
            scanner: SCANNER_NAME.to_string(),
            threat,
        }),
        None => Err(AdapterError::InvalidResponse {
            scanner: SCANNER_NAME.to_string(),
            response: response_str.trim_end_matches('\0').trim().to_string(),
        }),
    }
}

/// Extract the signature name from a reply such as `stream: Eicar-Test-Signature FOUND`.
fn parse_virus_name(response: &str) -> Option<String> {
    let response = response.trim_end_matches('\0').trim();
    let body = response.strip_suffix("FOUND")?.trim_end();
    let name = match body.split_once(':') {
        Some((_, name)) => name.trim(),
        None => body,
    };
    if name.is_empty() {
        Some("unknown".to_string())
    } else {
        Some(name.to_string())
    }
}

#[async_trait]
impl ScannerAdapter for ClamAvScanner {
    fn name(&self) -> &str {
        SCANNER_NAME
    }

    #[tracing::instrument(skip(self, file), fields(filename = %file.original_name))]
    async fn scan(&self, file: &FileDescriptor) -> Result<(), AdapterError> {
        self.scan_bytes(&file.content).await
    }

    async fn ping(&self) -> Result<(), AdapterError> {
        match tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.exchange(PING, None),
        )
        .await
        {
            Ok(Ok(response)) if response == PONG => Ok(()),
            Ok(Ok(response)) => Err(AdapterError::InvalidResponse {
                scanner: SCANNER_NAME.to_string(),
                response: String::from_utf8_lossy(&response)
                    .trim_end_matches('\0')
                    .to_string(),
            }),
            Ok(Err(e)) => Err(Self::unavailable(e.to_string())),
            Err(_) => Err(self.timeout()),
        }
    }
}
