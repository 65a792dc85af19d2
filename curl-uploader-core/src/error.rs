//! Error types for the upload pipeline.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Every fatal way an upload run can end.
///
/// Incomplete transfers are deliberately absent: they are reported as
/// [`crate::verify::UploadWarning`] values and never change the terminal status.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The transfer executable could not be found on the host.
    #[error("{tool} was not found on PATH")]
    ToolNotFound { tool: String },

    /// A literal (wildcard-free) file target does not exist.
    #[error("Path does not exist: {}", path.display())]
    PathNotFound { path: PathBuf },

    /// A glob pattern matched nothing under its search root.
    #[error("No matching files were found with search pattern: {pattern}")]
    NoMatchingFiles { pattern: String },

    /// The pattern could not be compiled as a glob.
    #[error("Invalid glob pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The raw extra options string could not be tokenised.
    #[error("Invalid transfer options {options:?}: {reason}")]
    InvalidOptions { options: String, reason: String },

    /// Walking the search root failed.
    #[error("Failed to enumerate files under {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The transfer process could not be started.
    #[error("Failed to launch {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transfer tool exited unsuccessfully.
    #[error("curl failed with return code: {exit_code}")]
    TransferFailed { exit_code: i32 },

    /// The transfer did not finish within the configured timeout.
    #[error("Transfer timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

pub type Result<T> = std::result::Result<T, UploadError>;
