//! Host-backed implementations of [`ToolLocator`] and [`TransferRunner`].

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::contract::{ToolLocator, TransferRunner};
use crate::error::UploadError;

const READ_CHUNK: usize = 8 * 1024;

/// Finds executables by searching a `PATH`-style directory list.
#[derive(Debug, Clone, Default)]
pub struct PathLocator {
    search_path: Option<OsString>,
}

impl PathLocator {
    /// Searches the `PATH` of the current process.
    pub fn from_env() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Searches the given `PATH`-formatted directory list instead of the environment.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl ToolLocator for PathLocator {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        let direct = Path::new(tool);
        if direct.components().count() > 1 {
            return is_executable(direct).then(|| direct.to_path_buf());
        }

        let search_path = self.search_path.as_ref()?;
        let found = std::env::split_paths(search_path)
            .flat_map(|dir| candidates(&dir, tool))
            .find(|candidate| is_executable(candidate));
        debug!(tool, found = ?found, "Searched PATH for tool");
        found
    }
}

#[cfg(windows)]
fn candidates(dir: &Path, tool: &str) -> Vec<PathBuf> {
    ["", ".exe", ".cmd", ".bat"]
        .iter()
        .map(|ext| dir.join(format!("{tool}{ext}")))
        .collect()
}

#[cfg(not(windows))]
fn candidates(dir: &Path, tool: &str) -> Vec<PathBuf> {
    vec![dir.join(tool)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Spawns the transfer tool with `tokio::process` and forwards its stdout in chunks.
///
/// Stderr is inherited untouched. The child is killed if the returned future is
/// dropped before it exits, which is how a timeout takes effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl TransferRunner for ProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        stdout: UnboundedSender<Vec<u8>>,
    ) -> Result<i32, UploadError> {
        info!(program = %program.display(), args = args.len(), "Launching transfer process");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                error!(error = ?source, program = %program.display(), "Failed to launch transfer process");
                UploadError::Spawn {
                    program: program.to_path_buf(),
                    source,
                }
            })?;

        let mut pipe = child.stdout.take().ok_or_else(|| {
            UploadError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "child stdout was not captured",
            ))
        })?;

        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = pipe.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            // Keep draining even if nobody listens, so the child never blocks on a full pipe.
            let _ = stdout.send(buf[..n].to_vec());
        }

        let status = child.wait().await?;
        // Killed by a signal: no code, count it as a failure.
        let code = status.code().unwrap_or(-1);
        info!(program = %program.display(), exit_code = code, "Transfer process exited");
        Ok(code)
    }
}
