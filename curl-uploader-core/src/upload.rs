//! High-level pipeline: resolve files → build curl arguments → run curl → verify.
//!
//! The pipeline is strictly linear and walks through the [`UploadState`]s once:
//!
//! `Resolving → ArgumentsBuilt → Executing → Verified`
//!
//! Nothing is retried. A failure while resolving files or locating the tool
//! stops the run before any process is spawned. Once curl has run, its exit
//! code decides success; the completion count only adds warnings.
//!
//! # Concurrency
//! [`execute`] is the only suspension point. The runner future and the task
//! collecting stdout chunks are polled together; the collector is the single
//! writer of the captured buffer and hands it back once the runner has dropped
//! its sender, so verification always sees the complete output.
//!
//! # Callable From
//! - The CLI crate, with [`crate::runner::PathLocator`] and [`crate::runner::ProcessRunner`]
//! - Tests, with `MockToolLocator` / `MockTransferRunner`

use futures::future::join;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info};

use crate::arguments::{build_arguments, UploadArguments};
use crate::config::UploadConfig;
use crate::contract::{ToolLocator, TransferOutcome, TransferRunner};
use crate::error::{Result, UploadError};
use crate::resolve::resolve;
use crate::verify::{verify, UploadWarning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadState {
    Resolving,
    ArgumentsBuilt,
    Executing,
    Verified,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadState::Resolving => "resolving",
            UploadState::ArgumentsBuilt => "arguments_built",
            UploadState::Executing => "executing",
            UploadState::Verified => "verified",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub state: UploadState,
    pub files: Vec<String>,
    /// Arguments passed to the tool, password masked.
    pub arguments: Vec<String>,
    pub exit_code: i32,
    pub expected: usize,
    pub completed: usize,
    pub warnings: Vec<UploadWarning>,
}

fn enter(state: UploadState) {
    info!(state = %state, "[UPLOAD] Entering state");
}

/// Runs one complete upload described by `config`.
pub async fn upload<L, R>(config: &UploadConfig, locator: &L, runner: &R) -> Result<UploadReport>
where
    L: ToolLocator + ?Sized,
    R: TransferRunner + ?Sized,
{
    enter(UploadState::Resolving);
    let resolved = resolve(&config.files).map_err(|e| {
        error!(error = %e, files = %config.files, "[UPLOAD][ERROR] Failed to resolve files");
        e
    })?;

    let tool = config.tool_name();
    let program = locator.locate(tool).ok_or_else(|| {
        error!(tool, "[UPLOAD][ERROR] Transfer tool not found");
        UploadError::ToolNotFound {
            tool: tool.to_string(),
        }
    })?;
    debug!(tool, program = %program.display(), "[UPLOAD] Located transfer tool");

    let args = build_arguments(&resolved.files, config)?;
    enter(UploadState::ArgumentsBuilt);
    info!(target_spec = %args.target_spec(), "[UPLOAD] Uploading files");

    enter(UploadState::Executing);
    let outcome = execute(runner, &program, &args, config.timeout()).await?;

    let report = verify(&outcome, resolved.expected_count);
    enter(UploadState::Verified);

    if !report.succeeded() {
        error!(exit_code = report.exit_code, "[UPLOAD][ERROR] Transfer failed");
        return Err(UploadError::TransferFailed {
            exit_code: report.exit_code,
        });
    }

    info!(
        exit_code = report.exit_code,
        completed = report.completed,
        expected = report.expected,
        "[UPLOAD] Upload finished"
    );
    Ok(UploadReport {
        state: UploadState::Verified,
        files: resolved.files,
        arguments: args.redacted(),
        exit_code: report.exit_code,
        expected: report.expected,
        completed: report.completed,
        warnings: report.warnings,
    })
}

/// Runs the tool once, echoing its stdout live while accumulating it.
///
/// With a `timeout`, the child is dropped (and killed) when the limit passes
/// and the run fails with [`UploadError::TimedOut`].
pub async fn execute<R>(
    runner: &R,
    program: &Path,
    args: &UploadArguments,
    timeout: Option<Duration>,
) -> Result<TransferOutcome>
where
    R: TransferRunner + ?Sized,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let transfer = join(runner.run(program, args.as_slice(), tx), collect_output(rx));

    let (exit_code, captured_output) = match timeout {
        Some(limit) => tokio::time::timeout(limit, transfer).await.map_err(|_| {
            error!(timeout_secs = limit.as_secs(), "[UPLOAD][ERROR] Transfer timed out");
            UploadError::TimedOut(limit)
        })?,
        None => transfer.await,
    };
    let exit_code = exit_code?;

    debug!(exit_code, bytes = captured_output.len(), "[UPLOAD] Transfer process completed");
    Ok(TransferOutcome {
        exit_code,
        captured_output,
    })
}

/// Single writer of the captured buffer: drains chunks until the runner hangs up.
async fn collect_output(mut rx: UnboundedReceiver<Vec<u8>>) -> String {
    let mut echo = tokio::io::stdout();
    let mut captured = Vec::new();
    while let Some(chunk) = rx.recv().await {
        if let Err(e) = echo.write_all(&chunk).await {
            debug!(error = ?e, "Failed to echo transfer output");
        }
        let _ = echo.flush().await;
        captured.extend_from_slice(&chunk);
    }
    // Decoded once at the end so multi-byte characters split across chunks survive.
    String::from_utf8_lossy(&captured).into_owned()
}
