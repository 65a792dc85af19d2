//! Reconciles curl's progress output with the number of files we asked it to upload.
//!
//! curl's progress meter redraws one line per transfer and starts it with the
//! percentage done, so a finished file shows up as a line starting with `100 `.
//! Counting those is a heuristic: the exit code stays the authoritative
//! pass/fail signal and a mismatch only produces a warning.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::contract::TransferOutcome;

fn completion_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"[\n\r]100\s").expect("completion marker regex is valid"))
}

/// Non-fatal findings surfaced next to the terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadWarning {
    /// Fewer (or more) files reached 100% than were expected.
    IncompleteTransfer {
        completed: usize,
        expected: usize,
        /// The raw output that was scanned, for diagnosis.
        tested_output: String,
    },
}

impl fmt::Display for UploadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadWarning::IncompleteTransfer {
                completed,
                expected,
                ..
            } => write!(
                f,
                "Not all files were uploaded: {completed} of {expected}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub exit_code: i32,
    pub expected: usize,
    pub completed: usize,
    pub warnings: Vec<UploadWarning>,
}

impl VerificationReport {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Number of progress lines that reached 100%.
pub fn count_completions(output: &str) -> usize {
    completion_marker().find_iter(output).count()
}

/// Scans the captured output whatever the exit code and flags a count mismatch.
///
/// The mismatch is only raised as a warning when the tool exited successfully;
/// a failed transfer already carries its own, stronger signal.
pub fn verify(outcome: &TransferOutcome, expected: usize) -> VerificationReport {
    let completed = count_completions(&outcome.captured_output);
    debug!(completed, expected, exit_code = outcome.exit_code, "Successfully uploaded");

    let mut warnings = Vec::new();
    if completed != expected && outcome.succeeded() {
        debug!(output = %outcome.captured_output, "Tested output");
        let warning = UploadWarning::IncompleteTransfer {
            completed,
            expected,
            tested_output: outcome.captured_output.clone(),
        };
        warn!(completed, expected, "{warning}");
        warnings.push(warning);
    }

    VerificationReport {
        exit_code: outcome.exit_code,
        expected,
        completed,
        warnings,
    }
}
