// tests/build_semantics.rs

use std::error::Error;
use std::time::Duration;

use dagbuild::errors::DagbuildError;
use dagbuild::{
    BuildOptions, Inputs, Requirement, TaskError, TaskRef, TaskStatus, build, build_blocking,
};
use dagbuild_test_utils::{TestWorld, init_tracing, memory_location, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn skipped(upstream: &str) -> TaskStatus {
    TaskStatus::SkippedFailedDependency {
        upstream: upstream.to_string(),
    }
}

#[tokio::test]
async fn second_build_runs_nothing() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let a = world.task("A").build();
    let b = world.task("B").requires(&a).build();

    let first = with_timeout(build(&[b.clone()], BuildOptions::default())).await?;
    assert!(first.success());
    assert_eq!(world.runs(), vec!["A", "B"]);
    assert_eq!(first.run_order(), ["A", "B"]);

    let second = with_timeout(build(&[b], BuildOptions::default())).await?;
    assert!(second.success());
    assert_eq!(world.runs(), vec!["A", "B"], "nothing ran the second time");
    assert!(second.run_order().is_empty());
    assert_eq!(second.status_of("A"), Some(&TaskStatus::SkippedAlreadySatisfied));
    assert_eq!(second.status_of("B"), Some(&TaskStatus::SkippedAlreadySatisfied));
    Ok(())
}

#[tokio::test]
async fn diamond_runs_shared_dependency_once_and_first() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let d = world.task("D").build();
    let b = world.task("B").requires(&d).build();
    let c = world.task("C").requires(&d).build();
    let a = world.task("A").requires_all(&[&b, &c]).build();

    let report = with_timeout(build(&[a], BuildOptions::default())).await?;

    assert!(report.success());
    assert_eq!(world.log().count("D"), 1);
    assert_eq!(world.runs(), vec!["D", "B", "C", "A"]);

    let names: Vec<&str> = report.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["D", "B", "C", "A"]);
    Ok(())
}

#[tokio::test]
async fn missing_external_fails_its_branch_only() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let raw = world.external("Raw", "raw.csv");
    let clean = world.task("Clean").requires(&raw).build();
    let summary = world.task("Summary").requires(&clean).build();
    let other = world.task("Other").build();
    let all = world.wrapper(
        "All",
        Requirement::Many(vec![summary.clone(), other.clone()]),
    );

    let report = with_timeout(build(&[all], BuildOptions::default())).await?;

    assert!(!report.success());
    assert_eq!(report.exit_code(), 1);
    assert_eq!(
        report.status_of("Raw"),
        Some(&TaskStatus::Failed(TaskError::MissingExternalDependency {
            target: memory_location("raw.csv"),
        }))
    );
    assert_eq!(report.status_of("Clean"), Some(&skipped("Raw")));
    assert_eq!(report.status_of("Summary"), Some(&skipped("Clean")));
    assert_eq!(report.status_of("Other"), Some(&TaskStatus::Succeeded));
    assert_eq!(report.status_of("All"), Some(&skipped("Summary")));
    assert_eq!(world.runs(), vec!["Other"]);

    let failed = report.directly_failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "Raw");
    Ok(())
}

#[tokio::test]
async fn present_external_succeeds_without_running() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    world.seed("raw.csv", "1,2,3");
    let raw = world.external("Raw", "raw.csv");
    let clean = world.task("Clean").requires(&raw).build();

    let report = with_timeout(build(&[clean], BuildOptions::default())).await?;

    assert!(report.success());
    assert_eq!(report.status_of("Raw"), Some(&TaskStatus::Succeeded));
    assert_eq!(world.contents("Clean").as_deref(), Some("Clean\n0=1,2,3"));
    Ok(())
}

#[tokio::test]
async fn run_without_writing_output_is_a_postcondition_violation() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let lazy = world.task("Lazy").forgetting_output().build();
    let after = world.task("After").requires(&lazy).build();

    let report = with_timeout(build(&[after], BuildOptions::default())).await?;

    assert_eq!(
        report.status_of("Lazy"),
        Some(&TaskStatus::Failed(TaskError::PostconditionViolation {
            target: memory_location("Lazy"),
        }))
    );
    assert_eq!(report.status_of("After"), Some(&skipped("Lazy")));
    assert_eq!(world.runs(), vec!["Lazy"]);
    Ok(())
}

#[tokio::test]
async fn labeled_inputs_are_resolved_by_label() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let left = world.task("Left").build();
    let right = world.task("Right").build();
    let join = world
        .task("Join")
        .requires_labeled(&[("left", &left), ("right", &right)])
        .build();

    let report = with_timeout(build(&[join], BuildOptions::default())).await?;

    assert!(report.success());
    assert_eq!(
        world.contents("Join").as_deref(),
        Some("Join\nleft=Left\nright=Right")
    );
    Ok(())
}

#[tokio::test]
async fn sequence_inputs_keep_declaration_order() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let one = world.task("One").build();
    let two = world.task("Two").build();
    let both = world.task("Both").requires_all(&[&two, &one]).build();

    with_timeout(build(&[both], BuildOptions::default())).await?;

    assert_eq!(world.contents("Both").as_deref(), Some("Both\n0=Two\n1=One"));
    assert_eq!(world.runs(), vec!["Two", "One", "Both"]);
    Ok(())
}

#[tokio::test]
async fn wrapper_requirement_is_an_empty_input_slot() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let leaf = world.task("Leaf").build();
    let group = world.wrapper("Group", Requirement::One(leaf));
    let top = world.task("Top").requires(&group).build();

    let report = with_timeout(build(&[top], BuildOptions::default())).await?;

    assert!(report.success());
    assert_eq!(report.status_of("Group"), Some(&TaskStatus::Succeeded));
    assert_eq!(world.contents("Top").as_deref(), Some("Top\n0=<none>"));
    Ok(())
}

#[tokio::test]
async fn run_error_is_recorded_as_execution_failure() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let broken = world.task("Broken").failing("disk on fire").build();

    let report = with_timeout(build(&[broken], BuildOptions::default())).await?;

    match report.status_of("Broken") {
        Some(TaskStatus::Failed(TaskError::Execution(msg))) => {
            assert!(msg.contains("disk on fire"), "unexpected message: {msg}");
        }
        other => panic!("expected execution failure, got {other:?}"),
    }
    assert_eq!(world.runs(), vec!["Broken"]);
    Ok(())
}

#[tokio::test]
async fn panicking_task_is_contained() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let wild = world.task("Wild").panicking("unexpected state").build();
    let calm = world.task("Calm").build();

    let report = with_timeout(build(&[wild, calm], BuildOptions::default())).await?;

    match report.status_of("Wild") {
        Some(TaskStatus::Failed(TaskError::Execution(msg))) => {
            assert!(msg.contains("panicked"));
            assert!(msg.contains("unexpected state"));
        }
        other => panic!("expected execution failure, got {other:?}"),
    }
    assert_eq!(report.status_of("Calm"), Some(&TaskStatus::Succeeded));
    Ok(())
}

#[tokio::test]
async fn write_failure_is_classified_as_target_io() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    world.store().deny_writes("Locked");
    let locked = world.task("Locked").build();

    let report = with_timeout(build(&[locked], BuildOptions::default())).await?;

    match report.status_of("Locked") {
        Some(TaskStatus::Failed(err @ TaskError::TargetIo(_))) => {
            assert_eq!(err.kind().to_string(), "TargetIOError");
        }
        other => panic!("expected target I/O failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn existing_output_wins_over_failed_requirement() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    world.seed("Derived", "from an earlier build");
    let raw = world.external("Raw", "raw.csv");
    let derived = world.task("Derived").requires(&raw).build();

    let report = with_timeout(build(&[derived], BuildOptions::default())).await?;

    assert_eq!(
        report.status_of("Derived"),
        Some(&TaskStatus::SkippedAlreadySatisfied)
    );
    assert!(world.runs().is_empty());
    assert!(!report.success(), "the external failure still fails the build");
    Ok(())
}

#[tokio::test]
async fn fail_fast_cancels_tasks_not_yet_dispatched() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let first = world.task("First").failing("boom").build();
    let second = world.task("Second").build();
    let third = world.task("Third").requires(&second).build();

    let options = BuildOptions::default().with_fail_fast(true);
    let report = with_timeout(build(&[first, third], options)).await?;

    assert!(matches!(
        report.status_of("First"),
        Some(TaskStatus::Failed(_))
    ));
    assert_eq!(report.status_of("Second"), Some(&TaskStatus::Cancelled));
    assert_eq!(report.status_of("Third"), Some(&TaskStatus::Cancelled));
    assert_eq!(world.runs(), vec!["First"]);
    assert_eq!(report.counts().cancelled, 2);
    Ok(())
}

#[tokio::test]
async fn without_fail_fast_independent_branches_keep_going() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let first = world.task("First").failing("boom").build();
    let second = world.task("Second").build();

    let report = with_timeout(build(&[first, second], BuildOptions::default())).await?;

    assert_eq!(report.status_of("Second"), Some(&TaskStatus::Succeeded));
    assert_eq!(world.runs(), vec!["First", "Second"]);
    Ok(())
}

#[tokio::test]
async fn parallel_workers_never_run_a_shared_dependency_twice() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let shared = world
        .task("Shared")
        .sleeping(Duration::from_millis(50))
        .build();
    let branches: Vec<TaskRef> = (0..6)
        .map(|i| {
            world
                .task(&format!("Branch{i}"))
                .requires(&shared)
                .sleeping(Duration::from_millis(10))
                .build()
        })
        .collect();
    let refs: Vec<&TaskRef> = branches.iter().collect();
    let join = world.task("Join").requires_all(&refs).build();

    let options = BuildOptions::default().with_workers(4);
    let report = with_timeout(build(&[join], options)).await?;

    assert!(report.success());
    assert_eq!(world.log().count("Shared"), 1);
    assert_eq!(world.log().position("Shared"), Some(0));
    assert_eq!(world.log().position("Join"), Some(7));
    for i in 0..6 {
        assert_eq!(world.log().count(&format!("Branch{i}")), 1);
    }
    Ok(())
}

#[tokio::test]
async fn timed_out_task_fails_and_propagates() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let slow = world
        .task("Slow")
        .sleeping(Duration::from_millis(400))
        .build();
    let after = world.task("After").requires(&slow).build();

    let limit = Duration::from_millis(50);
    let options = BuildOptions::default().with_task_timeout(limit);
    let report = with_timeout(build(&[after], options)).await?;

    assert_eq!(
        report.status_of("Slow"),
        Some(&TaskStatus::Failed(TaskError::Timeout(limit)))
    );
    assert_eq!(report.status_of("After"), Some(&skipped("Slow")));
    Ok(())
}

#[tokio::test]
async fn producing_task_without_output_is_rejected_before_running() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let ok = world.task("Ok").build();
    let bad = world.task("Bad").requires(&ok).without_output().build();

    match build(&[bad], BuildOptions::default()).await {
        Err(DagbuildError::MissingOutput(name)) => assert_eq!(name, "Bad"),
        Err(e) => panic!("expected MissingOutput, got {e:?}"),
        Ok(_) => panic!("expected error, got Ok"),
    }
    assert!(world.runs().is_empty());
    Ok(())
}

#[tokio::test]
async fn zero_workers_is_a_config_error() -> TestResult {
    let world = TestWorld::new();
    let a = world.task("A").build();

    match build(&[a], BuildOptions::default().with_workers(0)).await {
        Err(DagbuildError::ConfigError(msg)) => assert!(msg.contains("workers")),
        Err(e) => panic!("expected ConfigError, got {e:?}"),
        Ok(_) => panic!("expected error, got Ok"),
    }
    Ok(())
}

#[tokio::test]
async fn empty_build_succeeds() -> TestResult {
    let report = build(&[], BuildOptions::default()).await?;
    assert!(report.success());
    assert!(report.records().is_empty());
    Ok(())
}

#[tokio::test]
async fn shutdown_cancels_remaining_tasks() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let slow = world
        .task("Slow")
        .sleeping(Duration::from_millis(200))
        .build();
    let next = world.task("Next").requires(&slow).build();

    let shutdown = tokio::time::sleep(Duration::from_millis(20));
    let report = with_timeout(dagbuild::build_until(
        &[next],
        BuildOptions::default(),
        shutdown,
    ))
    .await?;

    assert_eq!(report.status_of("Slow"), Some(&TaskStatus::Succeeded));
    assert_eq!(report.status_of("Next"), Some(&TaskStatus::Cancelled));
    assert!(!report.success());
    Ok(())
}

#[test]
fn blocking_entry_point_owns_its_runtime() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    let a = world.task("A").build();
    let report = build_blocking(&[a], BuildOptions::default())?;
    assert!(report.success());
    assert_eq!(world.contents("A").as_deref(), Some("A"));
    Ok(())
}

#[tokio::test]
async fn summary_lists_each_status_group() -> TestResult {
    init_tracing();
    let world = TestWorld::new();
    world.seed("Done", "already");
    let done = world.task("Done").build();
    let broken = world.task("Broken").failing("nope").build();
    let after = world.task("After").requires(&broken).build();
    let fresh = world.task("Fresh").build();

    let report = with_timeout(build(&[done, after, fresh], BuildOptions::default())).await?;
    let text = report.to_string();

    assert!(text.contains("Scheduled 4 tasks of which:"));
    assert!(text.contains("* 1 ran successfully:"));
    assert!(text.contains("* 1 complete ones were encountered:"));
    assert!(text.contains("* 1 failed:"));
    assert!(text.contains("Broken (ExecutionError"));
    assert!(text.contains("After (upstream: Broken)"));
    assert!(text.contains(":("));
    Ok(())
}

#[test]
fn inputs_accessors_reject_the_wrong_shape() {
    let world = TestWorld::new();
    let inputs = Inputs::One(Some(world.target("x")));
    assert!(inputs.single().is_ok());
    assert!(inputs.get("x").is_err());
    assert!(inputs.at(0).is_err());

    let labeled = Inputs::Labeled(vec![("a".to_string(), None)]);
    assert!(labeled.get("a").is_err(), "wrapper slot has no output");
    assert!(labeled.get("missing").is_err());

    let many = Inputs::Many(vec![Some(world.target("y"))]);
    assert!(many.at(0).is_ok());
    assert!(many.at(1).is_err());
}
