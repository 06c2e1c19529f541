//! Configuration module
//!
//! Upload security settings, read from the environment (`upload.security.*` keys map to
//! `UPLOAD_SECURITY_*` variables). The structs also derive `Deserialize` so a host
//! application can embed them in its own configuration file.

use serde::{Deserialize, Serialize};
use std::env;

/// 100 MiB
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 100 * 1024 * 1024;

const DEFAULT_SCANNER_HOST: &str = "localhost";
const DEFAULT_CLAMAV_PORT: u16 = 3310;
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_SCANNER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_PATH: &str = "/scan";

/// Type tag selecting the external scanner implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerKind {
    /// ClamAV daemon over TCP (INSTREAM).
    Clamav,
    /// HTTP scanning service accepting the raw bytes.
    Http,
}

impl ScannerKind {
    fn default_port(self) -> u16 {
        match self {
            ScannerKind::Clamav => DEFAULT_CLAMAV_PORT,
            ScannerKind::Http => DEFAULT_HTTP_PORT,
        }
    }
}

impl std::str::FromStr for ScannerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clamav" | "clamd" => Ok(ScannerKind::Clamav),
            "http" => Ok(ScannerKind::Http),
            other => Err(anyhow::anyhow!(
                "Unknown custom scanner type '{}'. Expected 'clamav' or 'http'",
                other
            )),
        }
    }
}

/// External scanning daemon settings (`upload.security.custom_scanner`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomScannerConfig {
    #[serde(rename = "type")]
    pub kind: ScannerKind,
    pub host: String,
    pub port: u16,
    /// Upper bound for one scan call, connection included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Request path for the HTTP scanner. Ignored by ClamAV.
    #[serde(default = "default_http_path")]
    pub path: String,
}

impl CustomScannerConfig {
    pub fn new(kind: ScannerKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind,
            host: host.into(),
            port,
            timeout_secs: DEFAULT_SCANNER_TIMEOUT_SECS,
            path: DEFAULT_HTTP_PATH.to_string(),
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_SCANNER_TIMEOUT_SECS
}

fn default_http_path() -> String {
    DEFAULT_HTTP_PATH.to_string()
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE_BYTES
}

/// Upload security configuration (`upload.security`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecurityConfig {
    #[serde(rename = "max_size", default = "default_max_size")]
    pub max_size_bytes: u64,
    #[serde(default)]
    pub custom_scanner: Option<CustomScannerConfig>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            custom_scanner: None,
        }
    }
}

impl SecurityConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_size_bytes = match var("UPLOAD_SECURITY_MAX_SIZE") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("UPLOAD_SECURITY_MAX_SIZE must be a number of bytes")
            })?,
            None => DEFAULT_MAX_SIZE_BYTES,
        };

        let custom_scanner = match var("UPLOAD_SECURITY_CUSTOM_SCANNER")
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty() && s != "none")
        {
            Some(kind) => {
                let kind: ScannerKind = kind.parse()?;
                let port = match var("UPLOAD_SECURITY_SCANNER_PORT") {
                    Some(raw) => raw.trim().parse().map_err(|_| {
                        anyhow::anyhow!("UPLOAD_SECURITY_SCANNER_PORT must be a valid port number")
                    })?,
                    None => kind.default_port(),
                };
                let timeout_secs = match var("UPLOAD_SECURITY_SCANNER_TIMEOUT_SECS") {
                    Some(raw) => raw.trim().parse().map_err(|_| {
                        anyhow::anyhow!(
                            "UPLOAD_SECURITY_SCANNER_TIMEOUT_SECS must be a number of seconds"
                        )
                    })?,
                    None => DEFAULT_SCANNER_TIMEOUT_SECS,
                };
                Some(CustomScannerConfig {
                    kind,
                    host: var("UPLOAD_SECURITY_SCANNER_HOST")
                        .unwrap_or_else(|| DEFAULT_SCANNER_HOST.to_string()),
                    port,
                    timeout_secs,
                    path: var("UPLOAD_SECURITY_SCANNER_PATH")
                        .unwrap_or_else(|| DEFAULT_HTTP_PATH.to_string()),
                })
            }
            None => None,
        };

        let config = SecurityConfig {
            max_size_bytes,
            custom_scanner,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_SECURITY_MAX_SIZE must be greater than 0"
            ));
        }

        if let Some(scanner) = &self.custom_scanner {
            if scanner.host.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "UPLOAD_SECURITY_SCANNER_HOST must not be empty"
                ));
            }
            if scanner.port == 0 {
                return Err(anyhow::anyhow!(
                    "UPLOAD_SECURITY_SCANNER_PORT must be greater than 0"
                ));
            }
            if scanner.timeout_secs == 0 {
                return Err(anyhow::anyhow!(
                    "UPLOAD_SECURITY_SCANNER_TIMEOUT_SECS must be greater than 0"
                ));
            }
            if scanner.kind == ScannerKind::Http && !scanner.path.starts_with('/') {
                return Err(anyhow::anyhow!(
                    "UPLOAD_SECURITY_SCANNER_PATH must start with '/'"
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<SecurityConfig, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SecurityConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.max_size_bytes, 104_857_600);
        assert!(config.custom_scanner.is_none());
        assert_eq!(config, SecurityConfig::default());
    }

    #[test]
    fn test_max_size_override() {
        let config = from_map(&[("UPLOAD_SECURITY_MAX_SIZE", "2048")]).unwrap();
        assert_eq!(config.max_size_bytes, 2048);
    }

    #[test]
    fn test_invalid_max_size() {
        assert!(from_map(&[("UPLOAD_SECURITY_MAX_SIZE", "ten")]).is_err());
        assert!(from_map(&[("UPLOAD_SECURITY_MAX_SIZE", "0")]).is_err());
    }

    #[test]
    fn test_clamav_scanner_defaults() {
        let config = from_map(&[("UPLOAD_SECURITY_CUSTOM_SCANNER", "ClamAV")]).unwrap();
        let scanner = config.custom_scanner.unwrap();
        assert_eq!(scanner.kind, ScannerKind::Clamav);
        assert_eq!(scanner.host, "localhost");
        assert_eq!(scanner.port, 3310);
        assert_eq!(scanner.timeout_secs, 30);
        assert_eq!(scanner.address(), "localhost:3310");
    }

    #[test]
    fn test_http_scanner() {
        let config = from_map(&[
            ("UPLOAD_SECURITY_CUSTOM_SCANNER", "http"),
            ("UPLOAD_SECURITY_SCANNER_HOST", "scanner.internal"),
            ("UPLOAD_SECURITY_SCANNER_PORT", "9000"),
            ("UPLOAD_SECURITY_SCANNER_TIMEOUT_SECS", "5"),
            ("UPLOAD_SECURITY_SCANNER_PATH", "/v1/scan"),
        ])
        .unwrap();
        let scanner = config.custom_scanner.unwrap();
        assert_eq!(scanner.kind, ScannerKind::Http);
        assert_eq!(scanner.address(), "scanner.internal:9000");
        assert_eq!(scanner.timeout_secs, 5);
        assert_eq!(scanner.path, "/v1/scan");
    }

    #[test]
    fn test_scanner_none_is_disabled() {
        let config = from_map(&[("UPLOAD_SECURITY_CUSTOM_SCANNER", "none")]).unwrap();
        assert!(config.custom_scanner.is_none());
    }

    #[test]
    fn test_unknown_scanner_type() {
        assert!(from_map(&[("UPLOAD_SECURITY_CUSTOM_SCANNER", "sophos")]).is_err());
    }

    #[test]
    fn test_invalid_scanner_timeout() {
        for raw in ["abc", "-5", "1.5", ""] {
            let err = from_map(&[
                ("UPLOAD_SECURITY_CUSTOM_SCANNER", "clamav"),
                ("UPLOAD_SECURITY_SCANNER_TIMEOUT_SECS", raw),
            ])
            .unwrap_err();
            assert!(err
                .to_string()
                .contains("UPLOAD_SECURITY_SCANNER_TIMEOUT_SECS"));
        }
        assert!(from_map(&[
            ("UPLOAD_SECURITY_CUSTOM_SCANNER", "clamav"),
            ("UPLOAD_SECURITY_SCANNER_TIMEOUT_SECS", "0"),
        ])
        .is_err());
    }

    #[test]
    fn test_invalid_scanner_port() {
        assert!(from_map(&[
            ("UPLOAD_SECURITY_CUSTOM_SCANNER", "clamav"),
            ("UPLOAD_SECURITY_SCANNER_PORT", "0"),
        ])
        .is_err());
        assert!(from_map(&[
            ("UPLOAD_SECURITY_CUSTOM_SCANNER", "clamav"),
            ("UPLOAD_SECURITY_SCANNER_PORT", "99999"),
        ])
        .is_err());
    }

    #[test]
    fn test_deserialize_provider_shape() {
        let json = r#"{
            "max_size": 1048576,
            "custom_scanner": { "type": "clamav", "host": "clamd", "port": 3310 }
        }"#;
        let config: SecurityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_size_bytes, 1_048_576);
        let scanner = config.custom_scanner.unwrap();
        assert_eq!(scanner.kind, ScannerKind::Clamav);
        assert_eq!(scanner.timeout_secs, 30);
    }

    #[test]
    fn test_deserialize_null_scanner() {
        let config: SecurityConfig =
            serde_json::from_str(r#"{ "custom_scanner": null }"#).unwrap();
        assert_eq!(config.max_size_bytes, DEFAULT_MAX_SIZE_BYTES);
        assert!(config.custom_scanner.is_none());
    }
}
