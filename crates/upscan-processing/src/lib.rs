//! Upscan Processing Library
//!
//! The local scan stages (magic-byte signature, dangerous extension, executable
//! content, size), the [`Scanner`] that runs them in order and aggregates their
//! errors, and the [`ScannerAdapter`] seam for an external scanning daemon.

pub mod detector;
pub mod extension;
pub mod heuristics;
pub mod report;
pub mod sanitize;
pub mod scanner;
pub mod signature;
pub mod size;
pub mod traits;

pub use detector::{
    detect_file_type, detect_rule, signature_rule_for, SignatureRule, SIGNATURE_RULES,
    UNKNOWN_TYPE,
};
pub use extension::{is_dangerous_extension, DANGEROUS_EXTENSIONS};
pub use heuristics::{find_content_patterns, ContentPattern, CONTENT_PATTERNS};
pub use report::ScanReport;
pub use sanitize::{sanitize_filename, MAX_FILENAME_BYTES};
pub use scanner::Scanner;
pub use traits::{AdapterError, ScannerAdapter};

pub use tokio_util::sync::CancellationToken;
