//! Upscan Core Library
//!
//! This crate provides the data model, error types and configuration shared by
//! the scanning stages, the scanner adapters and the CLI.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{CustomScannerConfig, ScannerKind, SecurityConfig, DEFAULT_MAX_SIZE_BYTES};
pub use error::{ErrorMetadata, LogLevel, ScanCheck, ScanError, SecurityError};
pub use models::FileDescriptor;
