//! `load_config` module: merges an optional YAML file, command-line flags and
//! environment secrets into the core's [`UploadConfig`].
//!
//! # Precedence
//! 1. Command-line flags
//! 2. Values from the `--config` YAML file
//! 3. `CURL_UPLOAD_USERNAME` / `CURL_UPLOAD_PASSWORD` (credentials only)
//!
//! # Errors
//! All errors use `anyhow::Error` and name the offending file or field, so they
//! can be surfaced at the CLI boundary as-is.

use crate::cli::UploadArgs;
use anyhow::Result;
use curl_uploader_core::config::UploadConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const USERNAME_ENV: &str = "CURL_UPLOAD_USERNAME";
pub const PASSWORD_ENV: &str = "CURL_UPLOAD_PASSWORD";

/// YAML-side shape: every field optional so flags can fill the gaps.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub files: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub redirect_stderr: Option<bool>,
    pub options: Option<String>,
    pub tool: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Reads and parses a YAML config file.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn env_secret(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => {
            info!(var = name, "Credential found in env");
            Some(value)
        }
        _ => None,
    }
}

/// Builds the validated [`UploadConfig`] for one run.
pub fn load_config(args: &UploadArgs) -> Result<UploadConfig> {
    let file = match &args.config {
        Some(path) => read_config_file(path)?,
        None => FileConfig::default(),
    };

    let files = args.files.clone().or(file.files).unwrap_or_default();
    if files.trim().is_empty() {
        error!("No files or pattern given");
        anyhow::bail!("Missing required input: files (use --files or the config file)");
    }

    let url = args.url.clone().or(file.url).unwrap_or_default();
    if url.trim().is_empty() {
        error!("No destination url given");
        anyhow::bail!("Missing required input: url (use --url or the config file)");
    }

    let config = UploadConfig {
        files,
        url,
        username: args
            .username
            .clone()
            .or(file.username)
            .or_else(|| env_secret(USERNAME_ENV)),
        password: args
            .password
            .clone()
            .or(file.password)
            .or_else(|| env_secret(PASSWORD_ENV)),
        redirect_stderr: args.redirect_stderr || file.redirect_stderr.unwrap_or(false),
        options: args.options.clone().or(file.options),
        tool: args.tool.clone().or(file.tool),
        timeout_secs: args.timeout.or(file.timeout_secs),
    };

    info!(files = %config.files, url = %config.url, "Config loaded and merged successfully");
    Ok(config)
}
