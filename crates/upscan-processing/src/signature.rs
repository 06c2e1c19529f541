//! Extension spoofing check: the sniffed content type must accept the claimed extension.

use tracing::debug;
use upscan_core::{FileDescriptor, ScanCheck};

use crate::detector::detect_rule;
use crate::extension::effective_extensions;
use crate::report::ScanReport;

/// Compare the detected content type against the file extension.
///
/// A missing extension or an unrecognised format is not treated as evidence of anything
/// and the check is skipped.
pub fn check_file_signature(file: &FileDescriptor, report: &mut ScanReport) {
    let extensions = effective_extensions(file);
    if extensions.is_empty() {
        debug!(filename = %file.original_name, "No extension, skipping signature check");
        return;
    }

    let Some(rule) = detect_rule(&file.content) else {
        debug!(
            declared_mime_type = %file.declared_mime_type,
            "Unknown file type, skipping signature check"
        );
        return;
    };

    for extension in extensions {
        if !rule.accepts_extension(&extension) {
            report.push(
                ScanCheck::Signature,
                format!(
                    "File signature mismatch: content is of type {} but extension claims .{}",
                    rule.mime_type, extension
                ),
            );
        }
    }
}
