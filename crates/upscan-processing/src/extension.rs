//! Denylist of extensions that must never be stored from user uploads.

use tracing::debug;
use upscan_core::{FileDescriptor, ScanCheck};

use crate::report::ScanReport;
use crate::sanitize::stored_extension;

/// Lowercase extensions (without the dot) that are executable or render as active
/// content when served back.
pub static DANGEROUS_EXTENSIONS: &[&str] = &[
    // Windows executables and scripts
    "exe", "com", "scr", "pif", "msi", "dll", "bat", "cmd", "vbs", "vbe", "wsf", "hta", "cpl",
    "ps1", "lnk", "jar",
    // Server-side scripts
    "php", "php3", "php4", "php5", "php7", "phtml", "phar", "asp", "aspx", "jsp", "cgi", "pl",
    "py", "rb", "sh",
    // Active browser content
    "js", "mjs", "svg", "html", "htm", "xhtml", "shtml",
];

pub fn is_dangerous_extension(extension: &str) -> bool {
    let normalized = extension.trim_start_matches('.').to_lowercase();
    DANGEROUS_EXTENSIONS.contains(&normalized.as_str())
}

/// Extensions the file can end up with: the one in the submitted name and, when it
/// differs, the one the sanitized storage name will carry.
pub fn effective_extensions(file: &FileDescriptor) -> Vec<String> {
    let mut extensions: Vec<String> = file.extension().into_iter().collect();
    if let Some(stored) = stored_extension(&file.original_name) {
        if !extensions.contains(&stored) {
            extensions.push(stored);
        }
    }
    extensions
}

/// Reject files whose extension is on the denylist. Unlisted extensions pass through.
pub fn check_dangerous_extensions(file: &FileDescriptor, report: &mut ScanReport) {
    for extension in effective_extensions(file) {
        if is_dangerous_extension(&extension) {
            debug!(filename = %file.original_name, extension = %extension, "Dangerous extension");
            report.push(
                ScanCheck::DangerousExtension,
                format!("Dangerous file extension: .{}", extension),
            );
        }
    }
}
