use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, NamedTempFile};

/// Writes a run config pointing at the given workspace and output dir.
fn write_config(dir: &Path, yaml: &str) -> std::path::PathBuf {
    let path = dir.join("mdpress.yaml");
    fs::write(&path, yaml).expect("Writing temp config failed");
    path
}

#[test]
fn zero_matched_files_is_a_successful_noop_run() {
    let ws = tempdir().unwrap();
    let github_output = NamedTempFile::new().unwrap();

    let config = write_config(
        ws.path(),
        &format!(
            "workspace: {}\npatterns: \"missing/**/*.md\"\noutput_dir: {}\nformats: \"html\"\n",
            ws.path().display(),
            ws.path().join("rendered").display(),
        ),
    );

    let mut cmd = Command::cargo_bin("mdpress").expect("Binary exists");
    cmd.arg("run")
        .arg("--config")
        .arg(&config)
        .env("GITHUB_OUTPUT", github_output.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Rendered 0 files"));

    let outputs = fs::read_to_string(github_output.path()).unwrap();
    assert!(outputs.contains("files-processed=0"), "got: {outputs}");
    assert!(outputs.contains("output-files=[]"), "got: {outputs}");
}

#[cfg(unix)]
#[test]
fn renders_all_files_and_formats_with_cached_tool() {
    use std::os::unix::fs::PermissionsExt;

    let ws = tempdir().unwrap();
    fs::create_dir_all(ws.path().join("docs/sub")).unwrap();
    fs::write(ws.path().join("docs/a.md"), "# a\n").unwrap();
    fs::write(ws.path().join("docs/sub/b.md"), "# b\n").unwrap();

    // Pre-populated cache: the installer must hit it and never download.
    let cache = tempdir().unwrap();
    let tool = cache.path().join("mdrend/v9.9.9/mdrend");
    fs::create_dir_all(tool.parent().unwrap()).unwrap();
    fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

    let github_output = NamedTempFile::new().unwrap();
    let config = write_config(
        ws.path(),
        &format!(
            concat!(
                "workspace: {ws}\n",
                "patterns: \"docs/**/*.md\"\n",
                "output_dir: {out}\n",
                "formats: \"markdown,html\"\n",
                "cache_dir: {cache}\n",
                "tool:\n",
                "  version: v9.9.9\n",
            ),
            ws = ws.path().display(),
            out = ws.path().join("rendered").display(),
            cache = cache.path().display(),
        ),
    );

    let mut cmd = Command::cargo_bin("mdpress").expect("Binary exists");
    cmd.arg("run")
        .arg("--config")
        .arg(&config)
        .env("GITHUB_OUTPUT", github_output.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Rendered 2 file(s) into 4 output(s)"));

    let outputs = fs::read_to_string(github_output.path()).unwrap();
    assert!(outputs.contains("files-processed=2"), "got: {outputs}");
    assert!(outputs.contains("docs/a.md"), "got: {outputs}");
    assert!(outputs.contains("docs/sub/b.html"), "got: {outputs}");
}

#[test]
fn unsupported_format_token_fails_before_processing() {
    let ws = tempdir().unwrap();
    let config = write_config(
        ws.path(),
        &format!(
            "workspace: {}\npatterns: \"**/*.md\"\noutput_dir: {}\nformats: \"html,docx\"\n",
            ws.path().display(),
            ws.path().join("rendered").display(),
        ),
    );

    let mut cmd = Command::cargo_bin("mdpress").expect("Binary exists");
    cmd.arg("run").arg("--config").arg(&config);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unsupported format 'docx'"));
}

#[test]
fn missing_config_file_fails() {
    let mut cmd = Command::cargo_bin("mdpress").expect("Binary exists");
    cmd.arg("run").arg("--config").arg("does-not-exist.yaml");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_run_invoked_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use mdpress::cli::{run, Cli, Commands};

    // A dummy config path is enough: the event must fire before loading.
    let cli = Cli {
        command: Commands::Run {
            config: std::path::PathBuf::from("dummy.yaml"),
        },
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("run_invoked")),
        "Expected a 'run_invoked' trace event, got: {:?}",
        event_msgs
    );
}
