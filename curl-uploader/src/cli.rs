//!
//! This module implements the CLI interface for curl-uploader: command parsing,
//! configuration loading, and printing the terminal status.
//!
//! All resolution, invocation and verification logic lives in the
//! [`curl-uploader-core`] crate. This module is strictly CLI glue.
//!
//! ## How To Use
//! - From a shell: `curl-uploader upload --files 'build/*.zip' --url https://example.com/drop/`
//! - Programmatically / in tests: build a [`Cli`] and call [`run`].
//!
//! [`curl-uploader-core`]: ../../curl-uploader-core/
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use curl_uploader_core::runner::{PathLocator, ProcessRunner};
use curl_uploader_core::upload::{upload, UploadReport};
use curl_uploader_core::verify::UploadWarning;
use std::path::PathBuf;

/// CLI for curl-uploader: upload files with curl and verify every transfer completed.
#[derive(Parser)]
#[clap(
    name = "curl-uploader",
    version,
    about = "Upload a file or a glob of files with curl and verify that every transfer completed"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload the file(s) matching a path or glob pattern to a URL
    Upload(UploadArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct UploadArgs {
    /// File path or glob pattern (`*`, `?`) of the files to upload
    #[clap(long)]
    pub files: Option<String>,

    /// Destination URL
    #[clap(long)]
    pub url: Option<String>,

    #[clap(long)]
    pub username: Option<String>,

    /// Password; falls back to CURL_UPLOAD_PASSWORD
    #[clap(long)]
    pub password: Option<String>,

    /// Make curl write its diagnostics to stdout
    #[clap(long)]
    pub redirect_stderr: bool,

    /// Additional curl arguments, split like a shell would
    #[clap(long, allow_hyphen_values = true)]
    pub options: Option<String>,

    /// Give up and kill curl after this many seconds
    #[clap(long)]
    pub timeout: Option<u64>,

    /// Name or path of the transfer executable
    #[clap(long)]
    pub tool: Option<String>,

    /// Path to a YAML config file; flags override its values
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let result = match cli.command {
        Commands::Upload(args) => upload_command(args).await,
    };

    let exit_span = tracing::info_span!("exit");
    exit_span.in_scope(|| {
        tracing::info!(success = result.is_ok(), "exit");
    });

    result
}

async fn upload_command(args: UploadArgs) -> Result<()> {
    let config = load_config(&args)?;
    config.trace_loaded();
    tracing::info!(command = "upload", "Starting upload");

    let locator = PathLocator::from_env();
    match upload(&config, &locator, &ProcessRunner).await {
        Ok(report) => {
            print_report(config.tool_name(), &report);
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "upload", error = %e, "Upload failed");
            Err(anyhow::Error::new(e).context("Upload failed"))
        }
    }
}

fn print_report(tool: &str, report: &UploadReport) {
    for warning in &report.warnings {
        println!("[WARNING] {warning}");
        match warning {
            UploadWarning::IncompleteTransfer { tested_output, .. } => {
                println!("Tested output [{tested_output}]");
            }
        }
    }

    match serde_json::to_string_pretty(report) {
        Ok(json) => tracing::debug!(json = %json, "Upload report as JSON"),
        Err(e) => tracing::error!(error = ?e, "Failed to serialize upload report"),
    }

    println!("Upload succeeded: {tool} returned code {}", report.exit_code);
}
