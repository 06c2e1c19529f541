//! Upscan Services Layer
//!
//! Concrete [`ScannerAdapter`](upscan_processing::ScannerAdapter) implementations for
//! external scanning daemons, and the factory that picks one from configuration.

#[cfg(feature = "clamav")]
pub mod clamav;
pub mod factory;
#[cfg(feature = "http-scanner")]
pub mod http;

#[cfg(feature = "clamav")]
pub use clamav::ClamAvScanner;
pub use factory::{create_scanner, create_scanner_adapter};
#[cfg(feature = "http-scanner")]
pub use http::HttpScanner;
