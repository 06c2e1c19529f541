#[cfg(feature = "clamav")]
use crate::ClamAvScanner;
#[cfg(feature = "http-scanner")]
use crate::HttpScanner;
use std::sync::Arc;
use upscan_core::{ScannerKind, SecurityConfig};
use upscan_processing::{Scanner, ScannerAdapter};

/// Create the custom scanner adapter selected by `config.custom_scanner`.
///
/// Returns `Ok(None)` when no custom scanner is configured.
pub fn create_scanner_adapter(
    config: &SecurityConfig,
) -> anyhow::Result<Option<Arc<dyn ScannerAdapter>>> {
    let Some(scanner) = &config.custom_scanner else {
        return Ok(None);
    };

    match scanner.kind {
        #[cfg(feature = "clamav")]
        ScannerKind::Clamav => {
            tracing::info!(address = %scanner.address(), "Using ClamAV custom scanner");
            let adapter: Arc<dyn ScannerAdapter> = Arc::new(ClamAvScanner::from_config(scanner));
            Ok(Some(adapter))
        }

        #[cfg(not(feature = "clamav"))]
        ScannerKind::Clamav => Err(anyhow::anyhow!(
            "ClamAV scanner not available (clamav feature not enabled)"
        )),

        #[cfg(feature = "http-scanner")]
        ScannerKind::Http => {
            let adapter = HttpScanner::from_config(scanner)?;
            tracing::info!(url = %adapter.url(), "Using HTTP custom scanner");
            let adapter: Arc<dyn ScannerAdapter> = Arc::new(adapter);
            Ok(Some(adapter))
        }

        #[cfg(not(feature = "http-scanner"))]
        ScannerKind::Http => Err(anyhow::anyhow!(
            "HTTP scanner not available (http-scanner feature not enabled)"
        )),
    }
}

/// Build a [`Scanner`] with the configured custom scanner attached.
pub fn create_scanner(config: &SecurityConfig) -> anyhow::Result<Scanner> {
    config.validate()?;
    let scanner = Scanner::new(config);
    Ok(match create_scanner_adapter(config)? {
        Some(adapter) => scanner.with_custom_scanner(adapter),
        None => scanner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use upscan_core::CustomScannerConfig;

    #[test]
    fn test_no_custom_scanner() {
        let config = SecurityConfig::default();
        assert!(create_scanner_adapter(&config).unwrap().is_none());
        assert!(create_scanner(&config).unwrap().custom_scanner().is_none());
    }

    #[cfg(feature = "clamav")]
    #[test]
    fn test_clamav_selected_by_type_tag() {
        let config = SecurityConfig {
            custom_scanner: Some(CustomScannerConfig::new(ScannerKind::Clamav, "clamd", 3310)),
            ..SecurityConfig::default()
        };
        let adapter = create_scanner_adapter(&config).unwrap().unwrap();
        assert_eq!(adapter.name(), "ClamAV");
    }

    #[cfg(feature = "http-scanner")]
    #[test]
    fn test_http_selected_by_type_tag() {
        let config = SecurityConfig {
            custom_scanner: Some(CustomScannerConfig::new(ScannerKind::Http, "scanner", 8080)),
            ..SecurityConfig::default()
        };
        let scanner = create_scanner(&config).unwrap();
        assert_eq!(scanner.custom_scanner().unwrap().name(), "HTTP scanner");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SecurityConfig {
            max_size_bytes: 0,
            custom_scanner: None,
        };
        assert!(create_scanner(&config).is_err());
    }
}
