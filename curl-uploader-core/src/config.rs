use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_TOOL: &str = "curl";

/// Everything one upload run needs, already validated by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Literal path or glob pattern (`*`, `?`) naming the files to upload.
    pub files: String,
    /// Upload destination.
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Ask the tool to write its diagnostics to stdout (`--stderr -`).
    #[serde(default)]
    pub redirect_stderr: bool,
    /// Raw additional arguments, split like a shell would.
    #[serde(default)]
    pub options: Option<String>,
    /// Logical name of the transfer executable; `curl` when unset.
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl UploadConfig {
    pub fn tool_name(&self) -> &str {
        self.tool.as_deref().unwrap_or(DEFAULT_TOOL)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            files = %self.files,
            url = %self.url,
            tool = self.tool_name(),
            has_credentials = self.username.is_some() || self.password.is_some(),
            redirect_stderr = self.redirect_stderr,
            "Loaded UploadConfig"
        );
        debug!(options = ?self.options, timeout_secs = ?self.timeout_secs, "UploadConfig extras");
    }
}
