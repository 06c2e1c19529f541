//! Traits for the scan pipeline.

use async_trait::async_trait;
use upscan_core::FileDescriptor;

/// Why an external scanner did not report a file as clean.
///
/// Every variant is a rejection: an unreachable or misbehaving daemon never counts as a pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("Malware detected by {scanner}: {threat}")]
    Infected { scanner: String, threat: String },

    #[error("{scanner} unavailable: {reason}")]
    Unavailable { scanner: String, reason: String },

    #[error("{scanner} scan timed out after {timeout_secs} seconds")]
    Timeout { scanner: String, timeout_secs: u64 },

    #[error("Invalid response from {scanner}: {response}")]
    InvalidResponse { scanner: String, response: String },

    #[error("{scanner} scan cancelled")]
    Cancelled { scanner: String },
}

/// External scanning daemon (e.g. ClamAV). Implemented in `upscan-services`.
///
/// `scan` must impose its own bounded timeout and report it as [`AdapterError::Timeout`].
#[async_trait]
pub trait ScannerAdapter: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    async fn scan(&self, file: &FileDescriptor) -> Result<(), AdapterError>;

    /// Check that the daemon is reachable.
    async fn ping(&self) -> Result<(), AdapterError> {
        Ok(())
    }
}
