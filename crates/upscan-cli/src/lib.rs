//! Upscan CLI helpers
//!
//! Output types for `upscan scan`, content-type guessing from file extensions and tracing setup.

use serde::Serialize;
use std::path::Path;
use upscan_core::SecurityError;
use upscan_processing::{detect_file_type, sanitize_filename, SIGNATURE_RULES};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Content type a browser would declare for `path`, guessed from its extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let Some(extension) = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
    else {
        return FALLBACK_MIME_TYPE;
    };

    SIGNATURE_RULES
        .iter()
        .find(|rule| rule.accepts_extension(&extension))
        .map(|rule| rule.mime_type)
        .unwrap_or(FALLBACK_MIME_TYPE)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Passed,
    Rejected,
}

#[derive(Debug, Serialize)]
pub struct ScanErrorEntry {
    pub check: &'static str,
    pub message: String,
}

/// One line of `upscan scan` output.
#[derive(Debug, Serialize)]
pub struct ScanOutcome {
    pub file: String,
    pub sanitized_name: String,
    pub detected_type: &'static str,
    pub size_bytes: u64,
    pub status: ScanStatus,
    pub errors: Vec<ScanErrorEntry>,
}

impl ScanOutcome {
    pub fn new(file: &str, content: &[u8], result: &Result<(), SecurityError>) -> Self {
        let errors = match result {
            Ok(()) => Vec::new(),
            Err(e) => e
                .errors
                .iter()
                .map(|err| ScanErrorEntry {
                    check: err.check.as_str(),
                    message: err.message.clone(),
                })
                .collect(),
        };
        Self {
            file: file.to_string(),
            sanitized_name: sanitize_filename(file),
            detected_type: detect_file_type(content),
            size_bytes: content.len() as u64,
            status: if result.is_ok() {
                ScanStatus::Passed
            } else {
                ScanStatus::Rejected
            },
            errors,
        }
    }
}

/// Initialize tracing for CLI binaries. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use upscan_core::{ScanCheck, ScanError};

    #[test]
    fn test_guess_mime_type_from_extension() {
        assert_eq!(guess_mime_type(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(guess_mime_type(Path::new("report.docx")), "application/zip");
        assert_eq!(guess_mime_type(Path::new("run.exe")), "application/octet-stream");
        assert_eq!(guess_mime_type(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn test_outcome_for_passed_file() {
        let outcome = ScanOutcome::new("dir/photo.jpg", b"plain", &Ok(()));
        assert_eq!(outcome.status, ScanStatus::Passed);
        assert_eq!(outcome.sanitized_name, "photo.jpg");
        assert_eq!(outcome.detected_type, "unknown");
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_outcome_for_rejected_file_serializes_errors() {
        let err = SecurityError::new(vec![ScanError::new(
            ScanCheck::DangerousExtension,
            "Dangerous file extension: .exe",
        )]);
        let outcome = ScanOutcome::new("malware.exe", &[0x4D, 0x5A], &Err(err));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["errors"][0]["check"], "dangerous_extension");
        assert_eq!(json["size_bytes"], 2);
    }
}
