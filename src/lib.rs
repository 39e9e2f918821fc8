// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod target;
pub mod task;
pub mod types;
pub mod workflow;

use std::future::Future;
use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use crate::config::BuildOptions;
pub use crate::dag::TaskStatus;
pub use crate::errors::{DagbuildError, Result, TaskError};
pub use crate::report::BuildReport;
pub use crate::target::{LocalTarget, MemoryStore, MemoryTarget, Target, TargetError, TargetRef};
pub use crate::task::{ExternalTask, Inputs, Requirement, Task, TaskRef, WrapperTask};
pub use crate::types::{TaskKind, TaskName};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_and_validate, parse_duration};
use crate::dag::{DagGraph, Scheduler};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent};
use crate::exec::BlockingExecutor;

/// Build `roots` and everything they transitively require.
///
/// Graph errors (cycles, tasks without an output) are returned before any
/// task runs. Task failures never surface here; they are recorded in the
/// returned [`BuildReport`].
pub async fn build(roots: &[TaskRef], options: BuildOptions) -> Result<BuildReport> {
    build_until(roots, options, std::future::pending::<()>()).await
}

/// Like [`build`], but stops dispatching once `shutdown` resolves.
///
/// Tasks already running are allowed to finish; tasks not yet dispatched end
/// up `Cancelled`.
pub async fn build_until<F>(
    roots: &[TaskRef],
    options: BuildOptions,
    shutdown: F,
) -> Result<BuildReport>
where
    F: Future<Output = ()> + Send + 'static,
{
    options.validate()?;

    let graph = DagGraph::build(roots)?;
    info!(
        tasks = graph.len(),
        workers = options.workers,
        fail_fast = options.fail_fast,
        "starting build"
    );

    let scheduler = Scheduler::new(graph, options.workers, options.fail_fast);

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = BlockingExecutor::new(rt_tx.clone(), options.task_timeout);

    let shutdown_handle = tokio::spawn(async move {
        shutdown.await;
        let _ = rt_tx.send(RuntimeEvent::ShutdownRequested).await;
    });

    let runtime = Runtime::new(CoreRuntime::new(scheduler), rt_rx, executor);
    let report = runtime.run().await;
    shutdown_handle.abort();

    let report = report?;
    info!(
        success = report.success(),
        elapsed = ?report.elapsed(),
        "build finished"
    );
    Ok(report)
}

/// Synchronous [`build`] that owns its own Tokio runtime.
///
/// Must not be called from inside an async context.
pub fn build_blocking(roots: &[TaskRef], options: BuildOptions) -> Result<BuildReport> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(build(roots, options))
}

/// High-level entry point used by `main.rs`.
///
/// Loads config, applies CLI overrides, resolves the requested roots of the
/// bundled workflow and builds them. Ctrl-C requests a graceful shutdown.
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> anyhow::Result<i32> {
    let cfg = load_config(args.config.as_deref())?;
    let options = apply_overrides(cfg.build, &args)?;
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| cfg.workflow.data_dir.clone());

    let registry = workflow::registry(&data_dir);
    let requested: Vec<String> = if args.tasks.is_empty() {
        vec!["WorkflowWrapper".to_string()]
    } else {
        args.tasks.clone()
    };

    let mut roots = Vec::with_capacity(requested.len());
    for name in &requested {
        let task = registry
            .get(name)
            .ok_or_else(|| DagbuildError::TaskNotFound(name.clone()))?;
        roots.push(task.clone());
    }

    if args.dry_run {
        let graph = DagGraph::build(&roots)?;
        print_dry_run(&graph, &options, &data_dir);
        return Ok(0);
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received; finishing in-flight tasks");
    };

    let report = build_until(&roots, options, shutdown).await?;
    println!("{report}");
    Ok(report.exit_code())
}

/// An explicit `--config` must exist; the default file is optional.
fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => load_and_validate(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_and_validate(&path)
            } else {
                debug!(path = %path.display(), "no config file; using defaults");
                Ok(ConfigFile::default())
            }
        }
    }
}

fn apply_overrides(mut options: BuildOptions, args: &CliArgs) -> Result<BuildOptions> {
    if let Some(workers) = args.workers {
        options.workers = workers;
    }
    if args.fail_fast {
        options.fail_fast = true;
    }
    if let Some(raw) = args.task_timeout.as_deref() {
        let timeout = parse_duration(raw)
            .map_err(|e| DagbuildError::ConfigError(format!("--task-timeout: {e}")))?;
        options.task_timeout = Some(timeout);
    }
    options.validate()?;
    Ok(options)
}

fn print_dry_run(graph: &DagGraph, options: &BuildOptions, data_dir: &Path) {
    println!("dagbuild dry-run");
    println!("  workers = {}", options.workers);
    println!("  fail_fast = {}", options.fail_fast);
    if let Some(timeout) = options.task_timeout {
        println!("  task_timeout = {timeout:?}");
    }
    println!("  data_dir = {}", data_dir.display());
    println!("  roots = {:?}", graph.roots());
    println!();

    println!("tasks ({}), in topological order:", graph.len());
    for name in graph.topological_order() {
        let Some(node) = graph.node(name) else {
            continue;
        };
        println!("  - {name} [{}]", node.kind);
        if let Some(output) = &node.output {
            let state = if output.exists() { "present" } else { "missing" };
            println!("      output: {} ({state})", output.location());
        }
        if !node.deps.is_empty() {
            println!("      requires: {:?}", node.deps);
        }
        let dependents = graph.dependents_of(name);
        if !dependents.is_empty() {
            println!("      required by: {dependents:?}");
        }
    }

    debug!("dry-run complete (no execution)");
}
