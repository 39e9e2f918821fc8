// tests/workflow_end_to_end.rs

use std::error::Error;
use std::ffi::OsString;
use std::fs;
use std::sync::Arc;

use clap::Parser;
use dagbuild::cli::CliArgs;
use dagbuild::workflow::{
    self, EXTERNAL_FILE, FINAL_OUTPUT, FIRST_OUTPUT, SecondTask, SetupTask, workflow_wrapper,
};
use dagbuild::{BuildOptions, TaskError, TaskRef, TaskStatus, build};
use dagbuild_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn full_workflow_produces_every_file() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let data_dir = dir.path().join("data");
    let root: TaskRef = Arc::new(workflow_wrapper(&data_dir));

    let report = with_timeout(build(&[root], BuildOptions::default())).await?;

    assert!(report.success(), "{report}");
    assert_eq!(
        report.run_order(),
        ["SetupTask", "FirstTask", "SecondTask"]
    );
    assert_eq!(
        report.status_of("ExternalFileTask"),
        Some(&TaskStatus::Succeeded)
    );
    assert_eq!(
        report.status_of("WorkflowWrapper"),
        Some(&TaskStatus::Succeeded)
    );

    assert_eq!(
        fs::read_to_string(data_dir.join(EXTERNAL_FILE))?,
        "This is an external file"
    );
    assert_eq!(
        fs::read_to_string(data_dir.join(FIRST_OUTPUT))?,
        "First task completed!"
    );
    let final_text = fs::read_to_string(data_dir.join(FINAL_OUTPUT))?;
    assert_eq!(
        final_text,
        "Second task completed!\nFirst task said: First task completed!\nExternal file said: This is an external file"
    );

    let names: Vec<&str> = report.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "SetupTask",
            "FirstTask",
            "ExternalFileTask",
            "SecondTask",
            "WorkflowWrapper"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn rerunning_the_workflow_is_a_no_op() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let root: TaskRef = Arc::new(workflow_wrapper(dir.path()));

    with_timeout(build(&[root.clone()], BuildOptions::default())).await?;
    let before = fs::read_to_string(dir.path().join(FINAL_OUTPUT))?;

    let again = with_timeout(build(&[root], BuildOptions::default())).await?;

    assert!(again.success());
    assert!(again.run_order().is_empty());
    assert_eq!(again.counts().already_satisfied, 3);
    assert_eq!(fs::read_to_string(dir.path().join(FINAL_OUTPUT))?, before);
    Ok(())
}

#[tokio::test]
async fn external_file_alone_fails_when_setup_never_ran() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let external: TaskRef = Arc::new(workflow::external_file_task(dir.path()));

    let report = with_timeout(build(&[external], BuildOptions::default())).await?;

    match report.status_of("ExternalFileTask") {
        Some(TaskStatus::Failed(TaskError::MissingExternalDependency { target })) => {
            assert!(target.ends_with(EXTERNAL_FILE));
        }
        other => panic!("expected missing external dependency, got {other:?}"),
    }
    assert!(!dir.path().join(EXTERNAL_FILE).exists());
    Ok(())
}

#[tokio::test]
async fn workflow_runs_with_several_workers_once_setup_is_done() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;

    // With several workers the external check may be dispatched alongside
    // setup, so setup is built on its own first.
    let setup: TaskRef = Arc::new(SetupTask::new(dir.path()));
    with_timeout(build(&[setup], BuildOptions::default())).await?;

    let second: TaskRef = Arc::new(SecondTask::new(dir.path()));

    let options = BuildOptions::default().with_workers(4);
    let report = with_timeout(build(&[second], options)).await?;

    assert!(report.success(), "{report}");
    assert_eq!(report.run_order().len(), 2);
    assert!(dir.path().join(FINAL_OUTPUT).exists());
    Ok(())
}

#[test]
fn registry_exposes_every_workflow_task() -> TestResult {
    let dir = TempDir::new()?;
    let registry = workflow::registry(dir.path());
    let names: Vec<&str> = registry.keys().map(|k| k.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "ExternalFileTask",
            "FirstTask",
            "SecondTask",
            "SetupTask",
            "WorkflowWrapper"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn dry_run_resolves_the_graph_without_running() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let data_dir = dir.path().join("data");
    let config = dir.path().join("Dagbuild.toml");
    fs::write(&config, "")?;

    let args = CliArgs::try_parse_from([
        OsString::from("dagbuild"),
        "--dry-run".into(),
        "--config".into(),
        config.into_os_string(),
        "--data-dir".into(),
        data_dir.clone().into_os_string(),
    ])?;

    let code = with_timeout(dagbuild::run(args)).await?;

    assert_eq!(code, 0);
    assert!(!data_dir.join(EXTERNAL_FILE).exists());
    assert!(!data_dir.join(FINAL_OUTPUT).exists());
    Ok(())
}
