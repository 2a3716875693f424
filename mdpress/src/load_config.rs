use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info};

use mdpress_core::contract::{Format, RenderOptions};
use mdpress_core::install::LATEST;

/// Static YAML config shape, as written by the user or the CI workflow.
#[derive(Deserialize)]
struct StaticConfig {
    #[serde(default = "default_workspace")]
    workspace: PathBuf,
    /// Newline-separated glob patterns.
    patterns: String,
    /// Newline-separated workspace-relative paths to skip.
    #[serde(default)]
    ignore: String,
    output_dir: PathBuf,
    /// Comma-separated format list, validated against {html, pdf, markdown}.
    formats: String,
    #[serde(default)]
    layout: Option<String>,
    #[serde(default)]
    vars: Option<String>,
    #[serde(default)]
    cache_dir: Option<PathBuf>,
    #[serde(default)]
    tool: ToolSection,
}

#[derive(Deserialize)]
struct ToolSection {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    config: Option<String>,
    #[serde(default)]
    extra_args: Option<String>,
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            version: default_version(),
            config: None,
            extra_args: None,
        }
    }
}

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

fn default_version() -> String {
    LATEST.to_string()
}

/// Fully validated run configuration, merged from the static YAML file.
#[derive(Debug)]
pub struct RunConfig {
    pub workspace_root: PathBuf,
    pub patterns: String,
    pub ignore: String,
    pub output_dir: PathBuf,
    pub formats: Vec<Format>,
    pub options: RenderOptions,
    pub version: String,
    pub cache_root: Option<PathBuf>,
}

/// Loads the static YAML config file and validates it into a [`RunConfig`].
/// All validation failures happen here, before any processing starts.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = std::fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let static_conf: StaticConfig = serde_yaml::from_str(&config_content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })?;

    let formats = parse_formats(&static_conf.formats)?;

    if static_conf.patterns.trim().is_empty() {
        error!("Config contains no glob patterns");
        anyhow::bail!("'patterns' must contain at least one glob pattern");
    }

    let extra_args = match &static_conf.tool.extra_args {
        Some(raw) => shell_words::split(raw)
            .with_context(|| format!("Failed to parse tool.extra_args: {raw:?}"))?,
        None => Vec::new(),
    };

    let options = RenderOptions {
        config_file: static_conf.tool.config.clone(),
        layout: static_conf.layout.clone(),
        vars_file: static_conf.vars.clone(),
        extra_args,
    };

    info!(
        workspace = %static_conf.workspace.display(),
        output_dir = %static_conf.output_dir.display(),
        formats = ?formats,
        version = %static_conf.tool.version,
        "Config loaded and validated"
    );

    Ok(RunConfig {
        workspace_root: static_conf.workspace,
        patterns: static_conf.patterns,
        ignore: static_conf.ignore,
        output_dir: static_conf.output_dir,
        formats,
        options,
        version: static_conf.tool.version,
        cache_root: static_conf.cache_dir,
    })
}

/// Parse and validate the comma-separated format list.
fn parse_formats(raw: &str) -> Result<Vec<Format>> {
    let formats = raw
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            Format::from_str(token).map_err(|e| {
                error!(token, "Unsupported format in config");
                anyhow::anyhow!(e)
            })
        })
        .collect::<Result<Vec<Format>>>()?;

    if formats.is_empty() {
        error!("Config contains no output formats");
        anyhow::bail!("'formats' must contain at least one of: html, pdf, markdown");
    }
    Ok(formats)
}
