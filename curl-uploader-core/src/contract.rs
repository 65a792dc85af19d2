#![allow(unused)]

//! # contract: seams between the upload pipeline and the host
//!
//! The pipeline never touches `PATH` or spawns processes directly. It goes
//! through two traits so that tests can swap in deterministic fakes:
//!
//! - [`ToolLocator`] turns a logical tool name (`curl`) into an executable path.
//! - [`TransferRunner`] runs that executable and streams its stdout back in chunks.
//!
//! Both traits are annotated for `mockall`; the generated `MockToolLocator` and
//! `MockTransferRunner` are exported under the default `test-export-mocks` feature.

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::UploadError;

/// What the transfer tool left behind once it exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub exit_code: i32,
    /// Everything the tool wrote to stdout, in arrival order.
    pub captured_output: String,
}

impl TransferOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Resolves a logical tool name to an executable on the host.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ToolLocator: Send + Sync {
    /// Returns `None` when the tool cannot be found.
    fn locate(&self, tool: &str) -> Option<PathBuf>;
}

/// Runs the transfer executable as a child process.
///
/// Implementations must send every chunk read from the child's stdout on
/// `stdout` as soon as it arrives, and must not merge stderr into stdout
/// unless an argument asked the tool to do so. The returned future resolves
/// with the exit code once the child has terminated.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TransferRunner: Send + Sync {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        stdout: UnboundedSender<Vec<u8>>,
    ) -> Result<i32, UploadError>;
}
