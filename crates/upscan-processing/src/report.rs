//! Error aggregation shared by the scan stages.

use upscan_core::{ScanCheck, ScanError, SecurityError};

/// Collects the errors of every stage of one scan.
///
/// Stages only ever append; the single decision to raise is made by [`ScanReport::finish`]
/// once all of them have run.
#[derive(Debug, Default)]
pub struct ScanReport {
    errors: Vec<ScanError>,
}

impl ScanReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, check: ScanCheck, message: impl Into<String>) {
        self.errors.push(ScanError::new(check, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ScanError] {
        &self.errors
    }

    /// `Ok(())` when nothing was recorded, otherwise a [`SecurityError`] with every error.
    pub fn finish(self) -> Result<(), SecurityError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(SecurityError::new(self.errors))
        }
    }
}
