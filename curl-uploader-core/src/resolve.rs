//! Turns a user-supplied path expression into the concrete list of files to upload.
//!
//! A wildcard-free expression is taken literally and only checked for existence.
//! Anything containing `*` or `?` is treated as a glob: the most specific
//! wildcard-free directory is walked recursively and every regular file under it
//! is matched against the full pattern.

use glob::{MatchOptions, Pattern};
use serde::Serialize;
use std::path::{is_separator, Path, PathBuf, MAIN_SEPARATOR};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, UploadError};

/// The outcome of resolving a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFiles {
    /// Files in discovery order, never empty.
    pub files: Vec<String>,
    /// How many completed transfers the upload should report.
    pub expected_count: usize,
    /// Directory that was walked; `None` for a literal path.
    pub search_root: Option<PathBuf>,
}

/// Index of the first `*` or `?` in `expr`, whichever comes first.
pub fn wildcard_index(expr: &str) -> Option<usize> {
    match (expr.find('*'), expr.find('?')) {
        (Some(star), Some(question)) => Some(star.min(question)),
        (star, question) => star.or(question),
    }
}

/// Most specific wildcard-free directory that contains every possible match.
///
/// Returns `None` when `expr` holds no wildcard. A pattern whose first segment
/// is already wildcarded (`*.log`, `foo?/x`) searches the current directory.
pub fn search_root(expr: &str) -> Option<PathBuf> {
    wildcard_index(expr).map(|idx| root_before(expr, idx))
}

fn root_before(expr: &str, idx: usize) -> PathBuf {
    let prefix = &expr[..idx];

    let root = match prefix.rfind(is_separator) {
        None => ".",
        Some(sep) => {
            // `dir//*.log` is rooted at `dir`, not `dir/`.
            let dir = prefix[..sep].trim_end_matches(is_separator);
            if dir.is_empty() {
                &prefix[..1]
            } else if dir.ends_with(':') {
                // `C:\*.txt` must stay rooted at `C:\`, not the drive-relative `C:`.
                &prefix[..=dir.len()]
            } else {
                dir
            }
        }
    };
    PathBuf::from(root)
}

/// The pattern actually compiled for matching.
///
/// Repeated separators after the leading run are collapsed, since walked paths
/// never contain them. A `**` that is not a whole segment behaves like `*`.
fn pattern_source(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len());
    for piece in expr.split_inclusive(is_separator) {
        let (segment, sep) = match piece.char_indices().last() {
            Some((i, c)) if is_separator(c) => (&piece[..i], &piece[i..]),
            _ => (piece, ""),
        };
        if segment.is_empty() && !out.chars().all(is_separator) {
            continue;
        }
        out.push_str(&collapse_stars(segment));
        out.push_str(sep);
    }
    out
}

fn collapse_stars(segment: &str) -> String {
    if segment.len() >= 2 && segment.chars().all(|c| c == '*') {
        return "**".to_string();
    }
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Rewrites native backslash separators to `/` so paths survive as curl arguments.
pub fn normalize_separators(path: &str) -> String {
    if MAIN_SEPARATOR == '\\' {
        path.replace('\\', "/")
    } else {
        path.to_string()
    }
}

/// Resolves `expr` into the files to upload.
pub fn resolve(expr: &str) -> Result<ResolvedFiles> {
    match wildcard_index(expr) {
        None => resolve_literal(expr),
        Some(idx) => resolve_glob(expr, idx),
    }
}

fn resolve_literal(expr: &str) -> Result<ResolvedFiles> {
    let path = Path::new(expr);
    if !path.exists() {
        return Err(UploadError::PathNotFound {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %expr, "Using literal file path");
    Ok(ResolvedFiles {
        files: vec![expr.to_string()],
        expected_count: 1,
        search_root: None,
    })
}

fn resolve_glob(expr: &str, idx: usize) -> Result<ResolvedFiles> {
    debug!(pattern = %expr, "Matching glob pattern");

    let root = root_before(expr, idx);
    debug!(index = idx, search_root = %root.display(), "Computed search root");

    let pattern = Pattern::new(&pattern_source(expr)).map_err(|e| UploadError::InvalidPattern {
        pattern: expr.to_string(),
        reason: e.to_string(),
    })?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let match_base = !expr.chars().any(is_separator);
    // An implicit `.` root is stripped so results stay relative, like the pattern.
    let implicit_root = !expr[..idx].chars().any(is_separator);

    let mut files = Vec::new();
    for candidate in enumerate_files(&root)? {
        let candidate = if implicit_root {
            candidate
                .strip_prefix(".")
                .map(Path::to_path_buf)
                .unwrap_or(candidate)
        } else {
            candidate
        };

        let matched = if match_base {
            candidate
                .file_name()
                .map(|name| pattern.matches_with(&name.to_string_lossy(), options))
                .unwrap_or(false)
        } else {
            pattern.matches_path_with(&candidate, options)
        };

        if matched {
            let normalized = normalize_separators(&candidate.to_string_lossy());
            debug!(file = %normalized, "Matched file");
            files.push(normalized);
        }
    }

    if files.is_empty() {
        warn!(pattern = %expr, search_root = %root.display(), "No files matched pattern");
        return Err(UploadError::NoMatchingFiles {
            pattern: expr.to_string(),
        });
    }

    info!(pattern = %expr, count = files.len(), "Resolved glob pattern");
    Ok(ResolvedFiles {
        expected_count: files.len(),
        files,
        search_root: Some(root),
    })
}

/// Every regular file beneath `root`, in a stable per-directory name order.
fn enumerate_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        debug!(search_root = %root.display(), "Search root is not a directory");
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    // Symlinked files count like regular ones; walkdir reports link loops as entry errors.
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => out.push(entry.into_path()),
            Ok(_) => {}
            Err(e) if e.depth() == 0 => {
                return Err(UploadError::Walk {
                    root: root.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => warn!(error = %e, "Skipping unreadable entry"),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_index_takes_the_earliest_wildcard() {
        let cases = [
            ("/data/report.json", None),
            ("/data/*.log", Some(6)),
            ("/data/?.log", Some(6)),
            ("/da?a/*.log", Some(3)),
            ("/data/a*/b?.log", Some(7)),
            ("*", Some(0)),
        ];
        for (expr, expected) in cases {
            assert_eq!(wildcard_index(expr), expected, "expr: {expr}");
        }
    }

    #[test]
    fn search_root_strips_the_wildcarded_segment() {
        let cases = [
            ("/data/*.log", "/data"),
            ("/data/logs/app-?.log", "/data/logs"),
            ("/data/*/out.log", "/data"),
            ("/da*/out.log", "/"),
            ("/*.log", "/"),
            ("data/sub*/x", "data"),
            ("./*.log", "."),
            ("*.log", "."),
            ("*", "."),
            ("/data//*.log", "/data"),
            ("//*.log", "/"),
        ];
        for (expr, expected) in cases {
            assert_eq!(
                search_root(expr),
                Some(PathBuf::from(expected)),
                "expr: {expr}"
            );
        }
    }

    #[test]
    fn pattern_source_collapses_partial_double_stars_and_separators() {
        let cases = [
            ("/data/a**.log", "/data/a*.log"),
            ("/data/**/*.log", "/data/**/*.log"),
            ("/data/***/x", "/data/**/x"),
            ("/data//*.log", "/data/*.log"),
            ("*", "*"),
        ];
        for (expr, expected) in cases {
            assert_eq!(pattern_source(expr), expected, "expr: {expr}");
        }
    }

    #[test]
    fn search_root_is_none_for_literal_paths() {
        assert_eq!(search_root("/data/report.json"), None);
    }

    #[cfg(unix)]
    #[test]
    fn normalize_keeps_forward_slash_paths() {
        assert_eq!(normalize_separators("/data/a.log"), "/data/a.log");
        assert_eq!(normalize_separators(r"odd\name"), r"odd\name");
    }

    #[cfg(windows)]
    #[test]
    fn normalize_rewrites_backslashes() {
        assert_eq!(normalize_separators(r"C:\data\a.log"), "C:/data/a.log");
    }
}
