//! File discovery: evaluate newline-separated glob patterns against the
//! workspace and apply the workspace-relative ignore list.
//!
//! Matches are returned in per-pattern order. Each pattern's matches are
//! unique, but the union is not globally deduplicated: a file matched by two
//! patterns appears twice, matching the upstream contract.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("failed to read a glob match: {0}")]
    Read(#[from] glob::GlobError),
}

/// Evaluate `patterns` (newline-separated globs, relative to
/// `workspace_root`) and return matching files, excluding directories and
/// any match whose workspace-relative path appears in the newline-separated
/// `ignore` list.
pub fn discover_files(
    workspace_root: &Path,
    patterns: &str,
    ignore: &str,
) -> Result<Vec<PathBuf>, DiscoverError> {
    let ignored: HashSet<PathBuf> = ignore
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect();

    let mut matches = Vec::new();
    for pattern in patterns
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
    {
        let full_pattern = workspace_root.join(pattern).to_string_lossy().into_owned();
        let entries = glob::glob(&full_pattern).map_err(|source| DiscoverError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut matched = 0usize;
        for entry in entries {
            let path = entry?;
            if path.is_dir() {
                continue;
            }
            let relative = path.strip_prefix(workspace_root).unwrap_or(&path);
            if ignored.contains(relative) {
                debug!(path = %relative.display(), "[DISCOVER] Skipping ignored file");
                continue;
            }
            matched += 1;
            matches.push(path);
        }
        info!(pattern, matched, "[DISCOVER] Pattern evaluated");
    }
    Ok(matches)
}
