//! Bounded batch dispatcher: fans render jobs out across input files while
//! respecting a worker-count ceiling.
//!
//! The policy is a synchronous-barrier window, not a sliding pool: the
//! dispatcher fills a window of at most `K` pending jobs in input order,
//! joint-awaits the whole window, merges each job's result into the running
//! [`BatchResult`] in window-array order, then starts filling the next
//! window. Throughput is therefore bounded by the slowest job in each
//! window. That trade-off is deliberate: it keeps the merge step free of
//! locks (the accumulator is only touched between windows) and makes the
//! result ordering deterministic — window N's outputs always precede window
//! N+1's, and within a window outputs appear in admission order.
//!
//! # Failure
//! The joint wait fails fast: if any job in a window fails, the window's
//! as-yet-unmerged results are discarded and the error propagates, aborting
//! any remaining files. Results merged from prior windows are counted in the
//! error (`completed_files`) and surfaced through per-window log events.
//!
//! # Callable From
//! - Used by the CLI crate and integration tests
//! - Expects a concrete (async) [`Renderer`] implementation

use std::future::Future;
use std::path::PathBuf;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::contract::{BatchResult, JobResult, RenderError, RenderPlan, RenderRequest, Renderer};
use crate::render;

/// Error produced by a failed batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A job failed; the batch was aborted. `completed_files` counts the
    /// files from prior, fully-settled windows (their outputs had already
    /// been merged and are reported in the logs, but are not returned).
    #[error("batch aborted after {completed_files} completed file(s): {source}")]
    JobFailed {
        completed_files: usize,
        #[source]
        source: RenderError,
    },
}

/// Worker ceiling for a batch run: detected parallelism minus one, floored
/// at 1 so a single-core host still makes progress.
pub fn effective_concurrency() -> usize {
    let detected = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    detected.saturating_sub(1).max(1)
}

/// Run one render job per input file, admitting at most `concurrency` jobs
/// at a time. Files are admitted in input order; see the module docs for the
/// windowing and ordering guarantees.
pub async fn run_batch<R>(
    renderer: &R,
    files: &[PathBuf],
    plan: &RenderPlan,
    concurrency: usize,
) -> Result<BatchResult, BatchError>
where
    R: Renderer,
{
    let concurrency = concurrency.max(1);
    info!(
        files = files.len(),
        concurrency,
        formats = plan.formats.len(),
        "[BATCH] Starting bounded dispatch"
    );

    let mut batch = BatchResult::default();
    let mut window = Vec::with_capacity(concurrency);

    for file in files {
        if window.len() >= concurrency {
            settle_window(&mut batch, std::mem::take(&mut window)).await?;
        }
        let request = RenderRequest {
            file: file.clone(),
            plan: plan.clone(),
        };
        window.push(render::run_job(renderer, request));
    }
    if !window.is_empty() {
        settle_window(&mut batch, window).await?;
    }

    info!(
        files_processed = batch.files_processed,
        outputs = batch.outputs.len(),
        windows = batch.windows_merged,
        "[BATCH] Batch complete"
    );
    match serde_json::to_string(&batch.outputs) {
        Ok(json) => debug!(outputs = %json, "[BATCH][DEBUG] Output manifest"),
        Err(e) => error!(error = ?e, "[BATCH][DEBUG] Failed to serialize output manifest"),
    }
    Ok(batch)
}

/// Joint-wait one window and merge its results in window-array order.
async fn settle_window<F>(batch: &mut BatchResult, window: Vec<F>) -> Result<(), BatchError>
where
    F: Future<Output = Result<JobResult, RenderError>>,
{
    let jobs = window.len();
    debug!(jobs, "[BATCH] Waiting for window to settle");

    let results = try_join_all(window).await.map_err(|source| {
        error!(
            completed_files = batch.files_processed,
            error = %source,
            "[BATCH][ERROR] Window failed; aborting remaining files"
        );
        BatchError::JobFailed {
            completed_files: batch.files_processed,
            source,
        }
    })?;

    for result in results {
        batch.files_processed += result.files;
        batch.outputs.extend(result.outputs);
    }
    batch.windows_merged += 1;
    debug!(
        jobs,
        files_processed = batch.files_processed,
        windows = batch.windows_merged,
        "[BATCH] Window merged"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::effective_concurrency;

    #[test]
    fn effective_concurrency_is_at_least_one() {
        assert!(effective_concurrency() >= 1);
    }
}
