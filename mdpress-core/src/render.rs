//! Render job execution: produce all requested output formats for one input
//! file, plus the production [`Renderer`] that shells out to the external
//! tool.
//!
//! Formats within a job run sequentially, in the configured order. A
//! non-zero exit or spawn failure is a hard failure for the job: remaining
//! formats are not attempted. Outputs mirror the input file's relative
//! subdirectory below the output root.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::contract::{Format, JobResult, RenderError, RenderOptions, RenderRequest, Renderer};

/// Produce all requested formats for one file. Returns the outputs produced
/// up to and including the last successful format; the first failure aborts
/// the rest of the job.
pub async fn run_job<R>(renderer: &R, request: RenderRequest) -> Result<JobResult, RenderError>
where
    R: Renderer + ?Sized,
{
    let mut outputs = Vec::with_capacity(request.plan.formats.len());

    for format in &request.plan.formats {
        let output = output_path(
            &request.plan.output_dir,
            &request.plan.workspace_root,
            &request.file,
            *format,
        );
        if let Some(parent) = output.parent() {
            // Idempotent; concurrent jobs may create overlapping subdirectories.
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| RenderError::Io {
                    file: request.file.display().to_string(),
                    source,
                })?;
        }

        let produced = renderer
            .render(&request.file, *format, &output, &request.plan.options)
            .await?;
        debug!(
            file = %request.file.display(),
            format = %format,
            output = %produced.display(),
            "[RENDER] Format produced"
        );
        outputs.push(produced);
    }

    Ok(JobResult { files: 1, outputs })
}

/// Compute the output path for one (file, format) pair: output root plus the
/// input file's workspace-relative subdirectory plus its stem with the
/// format's extension.
pub fn output_path(
    output_dir: &Path,
    workspace_root: &Path,
    file: &Path,
    format: Format,
) -> PathBuf {
    let relative = file.strip_prefix(workspace_root).unwrap_or(file);
    let mut name = relative
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(format.extension());

    match relative.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => output_dir.join(parent).join(name),
        _ => output_dir.join(name),
    }
}

/// Build the argument list for one invocation of the external tool:
/// `render [-c <config>] <format> -o <output> [--html-layout <layout>]
/// [--vars <varsFile>] [<extra>...] <input>`.
///
/// The layout flag is only emitted for formats that support layouts.
pub fn build_render_args(
    file: &Path,
    format: Format,
    output: &Path,
    options: &RenderOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["render".into()];

    if let Some(config) = &options.config_file {
        args.push("-c".into());
        args.push(config.into());
    }
    args.push(format.as_str().into());
    args.push("-o".into());
    args.push(output.as_os_str().to_os_string());
    if format.supports_layout() {
        if let Some(layout) = &options.layout {
            args.push("--html-layout".into());
            args.push(layout.into());
        }
    }
    if let Some(vars) = &options.vars_file {
        args.push("--vars".into());
        args.push(vars.into());
    }
    for extra in &options.extra_args {
        args.push(extra.into());
    }
    args.push(file.as_os_str().to_os_string());
    args
}

/// Production renderer: invokes the installed external binary once per
/// (file, format) pair and treats it as an opaque black box.
pub struct ExecRenderer {
    program: PathBuf,
}

impl ExecRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Renderer for ExecRenderer {
    async fn render(
        &self,
        file: &Path,
        format: Format,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<PathBuf, RenderError> {
        let args = build_render_args(file, format, output, options);
        info!(
            program = %self.program.display(),
            file = %file.display(),
            format = %format,
            output = %output.display(),
            "[RENDER] Invoking renderer"
        );

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .await
            .map_err(|source| {
                error!(
                    program = %self.program.display(),
                    file = %file.display(),
                    format = %format,
                    error = %source,
                    "[RENDER][ERROR] Failed to launch renderer"
                );
                RenderError::Spawn {
                    file: file.display().to_string(),
                    format,
                    source,
                }
            })?;

        if !status.success() {
            error!(
                file = %file.display(),
                format = %format,
                code = ?status.code(),
                "[RENDER][ERROR] Renderer exited with non-zero code"
            );
            return Err(RenderError::Failed {
                file: file.display().to_string(),
                format,
                code: status.code(),
            });
        }

        Ok(output.to_path_buf())
    }
}
