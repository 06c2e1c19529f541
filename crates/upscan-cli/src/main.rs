//! upscan: run the upload security checks from the command line.
//!
//! Reads `UPLOAD_SECURITY_*` variables (and `.env`) for the size limit and the
//! custom scanner.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use upscan_cli::{guess_mime_type, init_tracing, ScanOutcome};
use upscan_core::{FileDescriptor, SecurityConfig};
use upscan_processing::sanitize_filename;
use upscan_services::{create_scanner, create_scanner_adapter};

#[derive(Parser)]
#[command(name = "upscan", about = "Upload security scanner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan files as if they had just been uploaded
    Scan {
        /// Files to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Declared content type (default: guessed from the extension)
        #[arg(long)]
        mime: Option<String>,
        /// Override UPLOAD_SECURITY_MAX_SIZE, in bytes
        #[arg(long)]
        max_size: Option<u64>,
    },
    /// Print the storage-safe version of a filename
    Sanitize {
        /// Client-supplied filename
        name: String,
    },
    /// Check that the configured custom scanner is reachable
    Ping,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string(value).context("Serialize result")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            files,
            mime,
            max_size,
        } => {
            let mut config =
                SecurityConfig::from_env().context("Failed to load upload security config")?;
            if let Some(max_size) = max_size {
                config.max_size_bytes = max_size;
            }
            let scanner = create_scanner(&config)?;

            let mut rejected = 0usize;
            for path in &files {
                let content = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let name = path.to_string_lossy().into_owned();
                let declared = mime
                    .clone()
                    .unwrap_or_else(|| guess_mime_type(path).to_string());
                let file = FileDescriptor::new(name.clone(), declared, content);

                let result = scanner.scan(&file).await;
                if result.is_err() {
                    rejected += 1;
                }
                print_json(&ScanOutcome::new(&name, &file.content, &result))?;
            }

            if rejected > 0 {
                tracing::warn!(rejected, total = files.len(), "Some files were rejected");
                std::process::exit(1);
            }
        }
        Commands::Sanitize { name } => {
            println!("{}", sanitize_filename(&name));
        }
        Commands::Ping => {
            let config =
                SecurityConfig::from_env().context("Failed to load upload security config")?;
            let adapter = create_scanner_adapter(&config)?.context(
                "No custom scanner configured. Set UPLOAD_SECURITY_CUSTOM_SCANNER to clamav or http",
            )?;
            adapter
                .ping()
                .await
                .with_context(|| format!("{} is not reachable", adapter.name()))?;
            println!("{}: ok", adapter.name());
        }
    }

    Ok(())
}
