//! CI output plumbing: expose the run's results to the host platform.
//!
//! Two outputs are published: `files-processed` (integer as string) and
//! `output-files` (JSON array of path strings). When `GITHUB_OUTPUT` names a
//! file, the outputs are appended there as `key=value` lines; they are
//! always logged as well.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

pub const FILES_PROCESSED: &str = "files-processed";
pub const OUTPUT_FILES: &str = "output-files";

/// Publish the run outputs.
pub fn emit(files_processed: usize, outputs: &[PathBuf]) -> Result<()> {
    let paths: Vec<String> = outputs.iter().map(|p| p.display().to_string()).collect();
    let serialized = serde_json::to_string(&paths).context("Failed to serialize output paths")?;

    info!(
        files_processed,
        output_files = %serialized,
        "Run outputs"
    );

    if let Ok(path) = std::env::var("GITHUB_OUTPUT") {
        if !path.is_empty() {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open output file {path:?}"))?;
            writeln!(file, "{FILES_PROCESSED}={files_processed}")?;
            writeln!(file, "{OUTPUT_FILES}={serialized}")?;
        }
    }
    Ok(())
}
