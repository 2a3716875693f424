/// # mdpress CLI Interface (Module)
///
/// This module implements the full CLI interface for mdpress—handling command
/// parsing, argument validation, main entrypoints, and user-visible
/// invocations.
///
/// All core business logic (data models, dispatch, rendering, installation)
/// lives in the [`mdpress-core`] crate. This module is strictly for CLI glue,
/// ergonomic argument exposure, and orchestration.
///
/// ## Features
/// - Entry struct [`Cli`] defines all user-facing options and subcommands.
/// - Subcommand routing (e.g., `run`) and argument validation.
/// - Async entrypoint (`run`) for programmatic invocation and integration
///   testing.
/// - Logging, tracing, and structured error output at CLI level.
///
/// ## How To Use
/// - For command-line users: use the installed `mdpress` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed
///   [`Cli`].
///
/// ## Extending
/// When adding features or subcommands, update [`Commands`] below and keep
/// all non-trivial business logic inside `mdpress-core`.
///
/// [`mdpress-core`]: ../../mdpress-core/
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mdpress_core::contract::RenderPlan;
use mdpress_core::discover::discover_files;
use mdpress_core::dispatch::{effective_concurrency, run_batch};
use mdpress_core::install::{GithubVersionLookup, Installer};
use mdpress_core::render::ExecRenderer;

use crate::load_config::{load_config, RunConfig};
use crate::outputs;

/// CLI for mdpress: batch-render Markdown documentation in CI.
#[derive(Parser)]
#[clap(
    name = "mdpress",
    version,
    about = "Locate Markdown files and render each into the configured output formats via the mdrend tool"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render all matched files using the given config file
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'run_invoked' event at the very start
    tracing::info!("run_invoked");

    match cli.command {
        Commands::Run { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "run", "Starting batch render");
            execute(config).await
        }
    }
}

/// Run the full pipeline for a loaded config: discover, install, dispatch,
/// report.
pub async fn execute(config: RunConfig) -> Result<()> {
    let files = discover_files(&config.workspace_root, &config.patterns, &config.ignore)
        .context("file discovery failed")?;
    tracing::info!(files = files.len(), "Discovery complete");

    // Zero matches is a successful no-op run: report explicit zero counts
    // and never touch the installer's download path.
    if files.is_empty() {
        tracing::warn!("No files matched the configured patterns; nothing to render");
        outputs::emit(0, &[])?;
        println!("Rendered 0 files.");
        return Ok(());
    }

    let cache_root = config
        .cache_root
        .clone()
        .unwrap_or_else(default_cache_root);
    let installer = Installer::new(cache_root);
    let lookup = GithubVersionLookup::new();
    let tool = installer
        .install(&config.version, &lookup)
        .await
        .context("tool installation failed")?;
    tracing::info!(tool = %tool.display(), "Renderer installed");

    let renderer = ExecRenderer::new(tool);
    let plan = RenderPlan {
        formats: config.formats.clone(),
        options: config.options.clone(),
        output_dir: config.output_dir.clone(),
        workspace_root: config.workspace_root.clone(),
    };
    let batch = run_batch(&renderer, &files, &plan, effective_concurrency())
        .await
        .context("batch rendering failed")?;

    outputs::emit(batch.files_processed, &batch.outputs)?;
    println!(
        "Rendered {} file(s) into {} output(s).",
        batch.files_processed,
        batch.outputs.len()
    );
    Ok(())
}

fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mdpress")
}
