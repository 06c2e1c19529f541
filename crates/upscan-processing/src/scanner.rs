//! Scan pipeline: signature → dangerous extension → executable content → size → custom scanner.
//!
//! The four local stages never short-circuit; each appends to the same [`ScanReport`] so a
//! rejected upload reports every problem at once. The optional custom scanner runs once,
//! after them, and any failure it reports (including timeout or cancellation) is a rejection.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use upscan_core::{FileDescriptor, ScanCheck, SecurityConfig, SecurityError};

use crate::extension::check_dangerous_extensions;
use crate::heuristics::check_executable_content;
use crate::report::ScanReport;
use crate::signature::check_file_signature;
use crate::size::check_size_bomb;
use crate::traits::{AdapterError, ScannerAdapter};

/// Upload security gate. Cheap to share behind an `Arc`; holds no per-scan state.
#[derive(Clone)]
pub struct Scanner {
    max_size_bytes: u64,
    custom_scanner: Option<Arc<dyn ScannerAdapter>>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("max_size_bytes", &self.max_size_bytes)
            .field(
                "custom_scanner",
                &self.custom_scanner.as_ref().map(|s| s.name().to_string()),
            )
            .finish()
    }
}

impl Scanner {
    /// Scanner with local checks only. Attach the adapter for `config.custom_scanner`
    /// with [`Scanner::with_custom_scanner`].
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            max_size_bytes: config.max_size_bytes,
            custom_scanner: None,
        }
    }

    pub fn with_custom_scanner(mut self, adapter: Arc<dyn ScannerAdapter>) -> Self {
        self.custom_scanner = Some(adapter);
        self
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn custom_scanner(&self) -> Option<&Arc<dyn ScannerAdapter>> {
        self.custom_scanner.as_ref()
    }

    /// Run every check over `file`.
    ///
    /// Returns `Ok(())` when the file may be stored, otherwise a [`SecurityError`]
    /// listing every failed check in pipeline order.
    pub async fn scan(&self, file: &FileDescriptor) -> Result<(), SecurityError> {
        self.scan_with_cancellation(file, &CancellationToken::new())
            .await
    }

    /// Like [`Scanner::scan`], but the custom scanner call is abandoned when `cancel`
    /// fires. An abandoned call counts as a failed check.
    #[tracing::instrument(
        skip(self, file, cancel),
        fields(
            filename = %file.original_name,
            declared_mime_type = %file.declared_mime_type,
            size_bytes = file.size_bytes
        )
    )]
    pub async fn scan_with_cancellation(
        &self,
        file: &FileDescriptor,
        cancel: &CancellationToken,
    ) -> Result<(), SecurityError> {
        let start = Instant::now();
        let mut report = ScanReport::new();

        check_file_signature(file, &mut report);
        check_dangerous_extensions(file, &mut report);
        check_executable_content(file, &mut report).await;
        check_size_bomb(file, &mut report, self.max_size_bytes);
        debug!(local_errors = report.len(), "Local checks completed");

        if let Some(adapter) = &self.custom_scanner {
            if let Err(e) = run_custom_scanner(adapter.as_ref(), file, cancel).await {
                report.push(ScanCheck::CustomScanner, e.to_string());
            }
        }

        let duration_ms = start.elapsed().as_millis();
        match report.finish() {
            Ok(()) => {
                info!(duration_ms, "File passed security scan");
                Ok(())
            }
            Err(err) => {
                warn!(
                    duration_ms,
                    error_count = err.errors.len(),
                    errors = ?err.messages(),
                    "File rejected by security scan"
                );
                Err(err)
            }
        }
    }

    /// Scan several files concurrently. Results are returned in input order.
    pub async fn scan_batch(&self, files: &[FileDescriptor]) -> Vec<Result<(), SecurityError>> {
        join_all(files.iter().map(|file| self.scan(file))).await
    }
}

async fn run_custom_scanner(
    adapter: &dyn ScannerAdapter,
    file: &FileDescriptor,
    cancel: &CancellationToken,
) -> Result<(), AdapterError> {
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AdapterError::Cancelled {
            scanner: adapter.name().to_string(),
        }),
        result = adapter.scan(file) => result,
    };

    match &result {
        Ok(()) => debug!(scanner = adapter.name(), "Custom scanner reported clean"),
        Err(AdapterError::Infected { threat, .. }) => {
            warn!(scanner = adapter.name(), threat = %threat, "Custom scanner detected malware")
        }
        Err(e) => error!(scanner = adapter.name(), error = %e, "Custom scanner failed"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const JPEG: [u8; 16] = [
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
        0x01,
    ];

    enum Behaviour {
        Clean,
        Infected,
        Unavailable,
        Hang,
    }

    struct MockAdapter {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl MockAdapter {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ScannerAdapter for MockAdapter {
        fn name(&self) -> &str {
            "mock"
        }

        async fn scan(&self, _file: &FileDescriptor) -> Result<(), AdapterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Clean => Ok(()),
                Behaviour::Infected => Err(AdapterError::Infected {
                    scanner: "mock".to_string(),
                    threat: "Eicar-Test-Signature".to_string(),
                }),
                Behaviour::Unavailable => Err(AdapterError::Unavailable {
                    scanner: "mock".to_string(),
                    reason: "connection refused".to_string(),
                }),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }
    }

    fn scanner() -> Scanner {
        Scanner::new(&SecurityConfig::default())
    }

    fn jpeg_file(name: &str) -> FileDescriptor {
        FileDescriptor::new(name, "image/jpeg", JPEG.to_vec()).with_size(1024)
    }

    #[tokio::test]
    async fn test_clean_file_passes() {
        assert!(scanner().scan(&jpeg_file("photo.jpg")).await.is_ok());
    }

    #[tokio::test]
    async fn test_local_errors_are_aggregated_in_stage_order() {
        let scanner = Scanner::new(&SecurityConfig {
            max_size_bytes: 10,
            custom_scanner: None,
        });
        let file = FileDescriptor::new("setup.exe", "image/png", vec![0x4D, 0x5A, 0x90, 0x00])
            .with_size(1024);

        let err = scanner.scan(&file).await.unwrap_err();
        let checks: Vec<ScanCheck> = err.errors.iter().map(|e| e.check).collect();
        assert_eq!(
            checks,
            vec![
                ScanCheck::DangerousExtension,
                ScanCheck::ExecutableContent,
                ScanCheck::Size
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_scanner_runs_once_on_clean_file() {
        let adapter = MockAdapter::new(Behaviour::Clean);
        let scanner = scanner().with_custom_scanner(adapter.clone());

        assert!(scanner.scan(&jpeg_file("photo.jpg")).await.is_ok());
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_scanner_runs_after_local_failures() {
        let adapter = MockAdapter::new(Behaviour::Infected);
        let scanner = scanner().with_custom_scanner(adapter.clone());

        let err = scanner.scan(&jpeg_file("photo.exe")).await.unwrap_err();
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.errors.last().unwrap().check, ScanCheck::CustomScanner);
        assert!(err
            .messages()
            .last()
            .unwrap()
            .contains("Eicar-Test-Signature"));
    }

    #[tokio::test]
    async fn test_unavailable_custom_scanner_rejects() {
        let scanner = scanner().with_custom_scanner(MockAdapter::new(Behaviour::Unavailable));

        let err = scanner.scan(&jpeg_file("photo.jpg")).await.unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.messages(), vec!["mock unavailable: connection refused"]);
    }

    #[tokio::test]
    async fn test_cancellation_rejects() {
        let scanner = scanner().with_custom_scanner(MockAdapter::new(Behaviour::Hang));
        let cancel = CancellationToken::new();
        let file = jpeg_file("photo.jpg");

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = scanner
            .scan_with_cancellation(&file, &cancel)
            .await
            .unwrap_err();
        assert!(err.has_check(ScanCheck::CustomScanner));
        assert_eq!(err.messages(), vec!["mock scan cancelled"]);
    }

    #[tokio::test]
    async fn test_batch_results_keep_input_order() {
        let files = vec![
            jpeg_file("photo.jpg"),
            FileDescriptor::new("malware.exe", "application/octet-stream", vec![0x4D, 0x5A]),
            jpeg_file("other.jpeg"),
        ];

        let results = scanner().scan_batch(&files).await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_debug_names_custom_scanner() {
        let scanner = scanner().with_custom_scanner(MockAdapter::new(Behaviour::Clean));
        let debug = format!("{:?}", scanner);
        assert!(debug.contains("mock"));
        assert_eq!(scanner.max_size_bytes(), 100 * 1024 * 1024);
    }
}
