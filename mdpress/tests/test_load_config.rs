use std::fs::write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use mdpress_core::contract::Format;

/// A full config produces a validated RunConfig with every option mapped.
#[test]
fn load_config_success_with_all_fields() {
    let config_yaml = r#"
workspace: ./site
patterns: |
  docs/**/*.md
  README.md
ignore: |
  docs/DRAFT.md
output_dir: ./rendered
formats: "html, pdf, markdown"
layout: manual
vars: https://example.com/vars.yaml
cache_dir: ./.cache
tool:
  version: v1.4.2
  config: ./mdrend.yaml
  extra_args: "--toc --title 'My Docs'"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config =
        mdpress::load_config::load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.workspace_root, PathBuf::from("./site"));
    assert_eq!(config.patterns.lines().count(), 2);
    assert_eq!(config.ignore.trim(), "docs/DRAFT.md");
    assert_eq!(config.output_dir, PathBuf::from("./rendered"));
    assert_eq!(
        config.formats,
        vec![Format::Html, Format::Pdf, Format::Markdown]
    );
    assert_eq!(config.version, "v1.4.2");
    assert_eq!(config.cache_root, Some(PathBuf::from("./.cache")));

    assert_eq!(config.options.layout.as_deref(), Some("manual"));
    assert_eq!(
        config.options.vars_file.as_deref(),
        Some("https://example.com/vars.yaml")
    );
    assert_eq!(config.options.config_file.as_deref(), Some("./mdrend.yaml"));
    // Shell-style splitting keeps the quoted title as one argument.
    assert_eq!(config.options.extra_args, vec!["--toc", "--title", "My Docs"]);
}

/// Omitted optional fields fall back to their defaults.
#[test]
fn load_config_defaults() {
    let config_yaml = r#"
patterns: "**/*.md"
output_dir: out
formats: "markdown"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config =
        mdpress::load_config::load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.workspace_root, PathBuf::from("."));
    assert_eq!(config.version, "latest");
    assert!(config.ignore.is_empty());
    assert!(config.cache_root.is_none());
    assert!(config.options.layout.is_none());
    assert!(config.options.vars_file.is_none());
    assert!(config.options.config_file.is_none());
    assert!(config.options.extra_args.is_empty());
}

#[test]
fn load_config_rejects_unsupported_format() {
    let config_yaml = r#"
patterns: "**/*.md"
output_dir: out
formats: "html,docx"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let err = mdpress::load_config::load_config(config_file.path())
        .expect_err("docx must be rejected");
    assert!(
        err.to_string().contains("unsupported format 'docx'"),
        "got: {err}"
    );
}

#[test]
fn load_config_rejects_empty_formats() {
    let config_yaml = r#"
patterns: "**/*.md"
output_dir: out
formats: " , "
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let err = mdpress::load_config::load_config(config_file.path())
        .expect_err("empty format list must be rejected");
    assert!(err.to_string().contains("formats"), "got: {err}");
}

#[test]
fn load_config_rejects_empty_patterns() {
    let config_yaml = r#"
patterns: "  "
output_dir: out
formats: "html"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let err = mdpress::load_config::load_config(config_file.path())
        .expect_err("empty patterns must be rejected");
    assert!(err.to_string().contains("patterns"), "got: {err}");
}

#[test]
fn load_config_missing_file_fails() {
    let err = mdpress::load_config::load_config("no-such-config.yaml")
        .expect_err("missing file must fail");
    assert!(
        err.to_string().contains("Failed to read config file"),
        "got: {err}"
    );
}
