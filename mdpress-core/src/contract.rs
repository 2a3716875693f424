//! # contract: interfaces and data model for the rendering pipeline
//!
//! This module defines the capability traits ([`Renderer`], [`VersionLookup`])
//! and the plain data types that flow between the dispatcher, the render jobs
//! and the installer.
//!
//! ## Interface & Extensibility
//! - Implement the [`Renderer`] trait to plug in a different rendering backend
//!   (the production implementation shells out to the external binary; tests
//!   use generated mocks or recording stubs).
//! - Implement [`VersionLookup`] to resolve the `latest` version sentinel from
//!   a different metadata source.
//! - All methods are async, returning results; render errors are a concrete
//!   enum so callers can match on the failure kind.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests. The mocks are exported
//!   behind the `test-export-mocks` feature (on by default), mirroring how
//!   downstream test suites consume them.
//!
//! ## Type Sources
//! - Request and result types (e.g. [`RenderPlan`], [`RenderRequest`],
//!   [`JobResult`], [`BatchResult`]) are plain data; see field docs.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// One target output representation of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Html,
    Pdf,
    Markdown,
}

impl Format {
    /// The format token as passed to the external tool's command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Pdf => "pdf",
            Format::Markdown => "markdown",
        }
    }

    /// File extension for produced outputs. Every format maps to its own
    /// name, except `markdown` which produces `.md` files.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Pdf => "pdf",
            Format::Markdown => "md",
        }
    }

    /// True for formats whose visual presentation is controlled by a layout
    /// reference. Layouts never apply to markdown output.
    pub fn supports_layout(&self) -> bool {
        matches!(self, Format::Html | Format::Pdf)
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised format token in configuration.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported format '{token}' (expected one of: html, pdf, markdown)")]
pub struct UnknownFormat {
    pub token: String,
}

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Format::Html),
            "pdf" => Ok(Format::Pdf),
            "markdown" => Ok(Format::Markdown),
            other => Err(UnknownFormat {
                token: other.to_string(),
            }),
        }
    }
}

/// Shared, file-independent rendering options. Built once per run from the
/// resolved configuration and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Optional tool config file reference, passed verbatim to `-c`.
    pub config_file: Option<String>,
    /// Optional layout reference, passed to `--html-layout` for html/pdf only.
    pub layout: Option<String>,
    /// Optional variables-file reference, passed verbatim to `--vars`.
    pub vars_file: Option<String>,
    /// Free-form additional arguments, already split shell-style.
    pub extra_args: Vec<String>,
}

/// The file-independent half of a run: what formats to produce, with which
/// options, and where outputs land.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    /// Ordered list of formats to produce per file.
    pub formats: Vec<Format>,
    pub options: RenderOptions,
    /// Root of the output tree; input subdirectories are mirrored below it.
    pub output_dir: PathBuf,
    /// Workspace root that input paths are made relative to.
    pub workspace_root: PathBuf,
}

/// One file's unit of work: the source file plus the full shared plan.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub file: PathBuf,
    pub plan: RenderPlan,
}

/// Result of one completed render job.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Number of files this job represents. Always 1; kept as a count for
    /// uniform accounting when results are merged.
    pub files: usize,
    /// Output paths produced, in format order, up to the last success.
    pub outputs: Vec<PathBuf>,
}

/// Accumulated result of a batch run. Mutated only by the dispatcher as
/// windows settle; jobs return [`JobResult`]s and never touch this directly.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub files_processed: usize,
    pub outputs: Vec<PathBuf>,
    /// Number of windows merged so far.
    pub windows_merged: usize,
}

/// Error produced by a renderer invocation. Carries the source file and
/// format for diagnostic context; the underlying cause is preserved.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch renderer for {file} ({format}): {source}")]
    Spawn {
        file: String,
        format: Format,
        #[source]
        source: std::io::Error,
    },
    #[error("rendering {file} to {format} failed (exit code {code:?})")]
    Failed {
        file: String,
        format: Format,
        code: Option<i32>,
    },
    #[error("failed to prepare output directory for {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Capability interface over the external rendering tool.
///
/// `render` produces `output` from `file` in the given `format` and returns
/// the path actually produced. The production implementation shells out; test
/// implementations return canned results or errors, so the dispatcher's
/// windowing and error propagation can be exercised without a real binary.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        file: &Path,
        format: Format,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<PathBuf, RenderError>;
}

/// Error type for version lookups (simple boxed error for now).
pub type LookupError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for resolving the `latest` version sentinel against release
/// metadata. A lookup failure is recoverable: the installer falls back to a
/// known-good version instead of failing the run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait VersionLookup: Send + Sync {
    /// Return the tag of the most recent release, e.g. `v1.4.2`.
    async fn latest_version(&self) -> Result<String, LookupError>;
}
