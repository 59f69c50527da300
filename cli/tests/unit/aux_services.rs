//! Unit tests for `launch_auxiliary_services`.

#![allow(clippy::expect_used)]

use ignite_cli::application::services::aux_services::{AuxOutcome, launch_auxiliary_services};
use ignite_cli::domain::install::{MARKER_FILEBROWSER, MARKER_NOTEBOOK};

use crate::helpers::{err_output, test_config};
use crate::mocks::{MemFs, MemoryMarkers, RecordingLauncher, RecordingReporter, RecordingRunner};

#[tokio::test]
async fn test_first_start_configures_then_launches_both() {
    let fs = MemFs::new();
    let runner = RecordingRunner::new();
    let markers = MemoryMarkers::new();
    let launcher = RecordingLauncher::new();
    let cfg = test_config();

    let outcomes = launch_auxiliary_services(
        &runner, &fs, &markers, &launcher, &RecordingReporter::new(), &cfg, "tok",
    )
    .await;

    assert!(matches!(
        &outcomes[0],
        AuxOutcome::Launched { name, configured: true, .. } if name == "filebrowser"
    ));
    assert!(matches!(
        &outcomes[1],
        AuxOutcome::Launched { name, configured: true, .. } if name == "notebook"
    ));

    let lines = runner.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("filebrowser config init"));
    assert!(lines[1].starts_with("filebrowser config set"));
    assert!(lines[2].starts_with("filebrowser users add admin adminadmin12"));
    assert!(markers.contains(MARKER_FILEBROWSER));
    assert!(markers.contains(MARKER_NOTEBOOK));

    let names: Vec<_> = launcher.launched().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["filebrowser", "notebook"]);
}

#[tokio::test]
async fn test_later_starts_skip_setup_but_still_launch() {
    let runner = RecordingRunner::new();
    let markers = MemoryMarkers::with(&[MARKER_FILEBROWSER, MARKER_NOTEBOOK]);
    let launcher = RecordingLauncher::new();

    let outcomes = launch_auxiliary_services(
        &runner, &MemFs::new(), &markers, &launcher, &RecordingReporter::new(), &test_config(), "",
    )
    .await;

    assert!(runner.calls().is_empty(), "no setup expected: {:?}", runner.lines());
    assert_eq!(launcher.launched().len(), 2);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, AuxOutcome::Launched { configured: false, .. })));
}

#[tokio::test]
async fn test_markers_are_independent() {
    let runner = RecordingRunner::new();
    let markers = MemoryMarkers::with(&[MARKER_NOTEBOOK]);
    let launcher = RecordingLauncher::new();

    let outcomes = launch_auxiliary_services(
        &runner, &MemFs::new(), &markers, &launcher, &RecordingReporter::new(), &test_config(), "",
    )
    .await;

    assert_eq!(runner.calls().len(), 3, "file browser still needs configuring");
    assert!(matches!(outcomes[0], AuxOutcome::Launched { configured: true, .. }));
    assert!(matches!(outcomes[1], AuxOutcome::Launched { configured: false, .. }));
}

#[tokio::test]
async fn test_setup_failure_is_a_warning_and_does_not_stop_notebook() {
    let runner = RecordingRunner::new().failing("config init", err_output(1, b"db locked"));
    let markers = MemoryMarkers::new();
    let launcher = RecordingLauncher::new();
    let reporter = RecordingReporter::new();

    let outcomes = launch_auxiliary_services(
        &runner, &MemFs::new(), &markers, &launcher, &reporter, &test_config(), "",
    )
    .await;

    assert!(matches!(&outcomes[0], AuxOutcome::Failed { error, .. } if error.contains("db locked")));
    assert!(!markers.contains(MARKER_FILEBROWSER), "marker must not be written on failure");
    assert!(matches!(outcomes[1], AuxOutcome::Launched { .. }));
    let names: Vec<_> = launcher.launched().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["notebook"]);
    assert_eq!(reporter.warnings().len(), 1);
}

#[tokio::test]
async fn test_launch_failure_is_reported_not_raised() {
    let launcher = RecordingLauncher::new().failing("notebook");
    let outcomes = launch_auxiliary_services(
        &RecordingRunner::new(),
        &MemFs::new(),
        &MemoryMarkers::new(),
        &launcher,
        &RecordingReporter::new(),
        &test_config(),
        "",
    )
    .await;
    assert!(matches!(outcomes[0], AuxOutcome::Launched { .. }));
    assert!(matches!(&outcomes[1], AuxOutcome::Failed { name, .. } if name == "notebook"));
}

#[tokio::test]
async fn test_existing_database_is_adopted_without_setup() {
    let cfg = test_config();
    let fs = MemFs::new().with_file(cfg.filebrowser_db(), "user-state");
    let runner = RecordingRunner::new();
    let markers = MemoryMarkers::new();

    let outcomes = launch_auxiliary_services(
        &runner,
        &fs,
        &markers,
        &RecordingLauncher::new(),
        &RecordingReporter::new(),
        &cfg,
        "",
    )
    .await;

    assert_eq!(fs.file(cfg.filebrowser_db()).as_deref(), Some("user-state"));
    assert!(runner.calls().is_empty(), "accounts must not be reset: {:?}", runner.lines());
    assert!(markers.contains(MARKER_FILEBROWSER));
    assert!(matches!(outcomes[0], AuxOutcome::Launched { configured: false, .. }));
}

#[tokio::test]
async fn test_failed_setup_removes_the_database_it_created() {
    let cfg = test_config();
    let fs = MemFs::new();
    let runner = RecordingRunner::with_fs(&fs).failing("users add", err_output(1, b"db locked"));
    let markers = MemoryMarkers::new();

    let outcomes = launch_auxiliary_services(
        &runner,
        &fs,
        &markers,
        &RecordingLauncher::new(),
        &RecordingReporter::new(),
        &cfg,
        "",
    )
    .await;

    assert!(matches!(outcomes[0], AuxOutcome::Failed { .. }));
    assert!(runner.lines()[0].starts_with("filebrowser config init"));
    assert!(fs.file(cfg.filebrowser_db()).is_none(), "half-configured database left behind");
    assert!(!markers.contains(MARKER_FILEBROWSER));
}

#[tokio::test]
async fn test_disabled_services_are_not_started() {
    let mut cfg = test_config();
    cfg.services.filebrowser.enabled = false;
    cfg.services.notebook.enabled = false;
    let launcher = RecordingLauncher::new();
    let outcomes = launch_auxiliary_services(
        &RecordingRunner::new(),
        &MemFs::new(),
        &MemoryMarkers::new(),
        &launcher,
        &RecordingReporter::new(),
        &cfg,
        "",
    )
    .await;
    assert!(outcomes.iter().all(|o| matches!(o, AuxOutcome::Disabled { .. })));
    assert!(launcher.launched().is_empty());
}

#[tokio::test]
async fn test_notebook_receives_token_and_logs_to_its_file() {
    let launcher = RecordingLauncher::new();
    let cfg = test_config();
    launch_auxiliary_services(
        &RecordingRunner::new(),
        &MemFs::new(),
        &MemoryMarkers::new(),
        &launcher,
        &RecordingReporter::new(),
        &cfg,
        "s3cret",
    )
    .await;
    let notebook = launcher
        .launched()
        .into_iter()
        .find(|s| s.name == "notebook")
        .expect("notebook launched");
    assert!(notebook.args.contains(&"--IdentityProvider.token=s3cret".to_string()));
    assert!(notebook.args.contains(&"--notebook-dir=/vol".to_string()));
    assert_eq!(notebook.log, cfg.paths.log_dir.join("notebook.log"));
}
