//! Builds the curl command line for one upload.

use tracing::debug;

use crate::config::UploadConfig;
use crate::error::{Result, UploadError};

const UPLOAD_FLAG: &str = "-T";
const STDERR_FLAG: &str = "--stderr";
const STDOUT_TARGET: &str = "-";
const CREDENTIALS_FLAG: &str = "-u";

/// Ordered, immutable argument list handed to the transfer runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadArguments(Vec<String>);

impl UploadArguments {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// The argument naming the file(s) to upload.
    pub fn target_spec(&self) -> &str {
        &self.0[1]
    }

    /// The arguments with the password half of any credential masked.
    pub fn redacted(&self) -> Vec<String> {
        let mut out = self.0.clone();
        for i in 1..out.len() {
            if out[i - 1] != CREDENTIALS_FLAG {
                continue;
            }
            let masked = out[i].split_once(':').map(|(user, _)| format!("{user}:***"));
            if let Some(masked) = masked {
                out[i] = masked;
            }
        }
        out
    }
}

/// Single path as-is, several paths as one `{a,b,c}` list that curl expands itself.
pub fn target_spec(files: &[String]) -> String {
    match files {
        [single] => single.clone(),
        many => format!("{{{}}}", many.join(",")),
    }
}

/// `user:password` with either half allowed to be blank; `None` when both are absent.
pub fn credentials(username: Option<&str>, password: Option<&str>) -> Option<String> {
    let username = username.filter(|u| !u.is_empty());
    let password = password.filter(|p| !p.is_empty());
    if username.is_none() && password.is_none() {
        return None;
    }
    Some(format!(
        "{}:{}",
        username.unwrap_or_default(),
        password.unwrap_or_default()
    ))
}

/// Assembles the full argument list for uploading `files` according to `config`.
pub fn build_arguments(files: &[String], config: &UploadConfig) -> Result<UploadArguments> {
    let mut args = vec![UPLOAD_FLAG.to_string(), target_spec(files), config.url.clone()];

    if config.redirect_stderr {
        args.push(STDERR_FLAG.to_string());
        args.push(STDOUT_TARGET.to_string());
    }

    if let Some(options) = config.options.as_deref().filter(|o| !o.trim().is_empty()) {
        let extra = shell_words::split(options).map_err(|e| UploadError::InvalidOptions {
            options: options.to_string(),
            reason: e.to_string(),
        })?;
        debug!(count = extra.len(), "Appending extra transfer options");
        args.extend(extra);
    }

    if let Some(combo) = credentials(config.username.as_deref(), config.password.as_deref()) {
        args.push(CREDENTIALS_FLAG.to_string());
        args.push(combo);
    }

    Ok(UploadArguments(args))
}
