//! Size ceiling enforced inside the security stage.

use upscan_core::{FileDescriptor, ScanCheck};

use crate::report::ScanReport;

/// Record an error when the reported size exceeds `max_size_bytes`.
///
/// The boundary is inclusive: a file of exactly `max_size_bytes` passes.
pub fn check_size_bomb(file: &FileDescriptor, report: &mut ScanReport, max_size_bytes: u64) {
    if file.size_bytes > max_size_bytes {
        report.push(
            ScanCheck::Size,
            format!(
                "File size {} bytes exceeds maximum allowed size of {} bytes",
                file.size_bytes, max_size_bytes
            ),
        );
    }
}
