//! Error types module
//!
//! A scan produces a list of [`ScanError`]s, one per failed check. When that list is
//! non-empty the scanner raises a single [`SecurityError`] carrying all of them, so the
//! caller can report every problem in one response.

use std::fmt;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected uploads
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// to an HTTP client by whichever layer catches it.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPLOAD_REJECTED")
    fn error_code(&self) -> &'static str;

    /// Client-facing message
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// The check that produced a [`ScanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanCheck {
    Signature,
    DangerousExtension,
    ExecutableContent,
    Size,
    CustomScanner,
}

impl ScanCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanCheck::Signature => "signature",
            ScanCheck::DangerousExtension => "dangerous_extension",
            ScanCheck::ExecutableContent => "executable_content",
            ScanCheck::Size => "size",
            ScanCheck::CustomScanner => "custom_scanner",
        }
    }
}

impl fmt::Display for ScanCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed check. Displays as its human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub check: ScanCheck,
    pub message: String,
}

impl ScanError {
    pub fn new(check: ScanCheck, message: impl Into<String>) -> Self {
        Self {
            check,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Raised when a file fails one or more security checks.
///
/// `errors` keeps the order in which the checks ran.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}: {}", join_messages(.errors))]
pub struct SecurityError {
    pub message: String,
    pub errors: Vec<ScanError>,
}

fn join_messages(errors: &[ScanError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SecurityError {
    pub const DEFAULT_MESSAGE: &'static str = "File failed security scan";

    pub fn new(errors: Vec<ScanError>) -> Self {
        Self {
            message: Self::DEFAULT_MESSAGE.to_string(),
            errors,
        }
    }

    /// The individual error messages, in check order.
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    /// Whether any contained error came from `check`.
    pub fn has_check(&self, check: ScanCheck) -> bool {
        self.errors.iter().any(|e| e.check == check)
    }
}

impl ErrorMetadata for SecurityError {
    fn http_status_code(&self) -> u16 {
        422
    }

    fn error_code(&self) -> &'static str {
        "UPLOAD_REJECTED"
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Warn
    }
}
