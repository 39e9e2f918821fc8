// src/exec/task_runner.rs

//! Evaluation of a single scheduled task.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info};

use crate::dag::ScheduledTask;
use crate::engine::TaskOutcome;
use crate::errors::TaskError;
use crate::types::{TaskKind, TaskName};

/// Result of evaluating one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub outcome: TaskOutcome,
    /// Whether `run` was invoked.
    pub ran: bool,
}

impl Evaluation {
    fn checked(outcome: TaskOutcome) -> Self {
        Self { outcome, ran: false }
    }

    fn after_run(outcome: TaskOutcome) -> Self {
        Self { outcome, ran: true }
    }
}

/// Evaluate `task` according to its kind.
///
/// - External: succeeded iff the output exists.
/// - Wrapper: succeeded iff no requirement blocked it.
/// - Producing: an existing output wins over everything else; otherwise a
///   blocked requirement skips the task; otherwise `run` is called and the
///   output must exist afterwards.
///
/// Blocking: may perform filesystem IO and run arbitrary task code.
pub fn evaluate(task: &ScheduledTask) -> Evaluation {
    match task.kind {
        TaskKind::External => evaluate_external(task),
        TaskKind::Wrapper => Evaluation::checked(wrapper_outcome(task.blocked_by.clone())),
        TaskKind::Producing => evaluate_producing(task),
    }
}

/// Outcome of a wrapper task: it succeeds exactly when no requirement
/// blocked it.
///
/// The scheduler resolves wrappers inline through this function, so they
/// never reach a worker.
pub fn wrapper_outcome(blocked_by: Option<TaskName>) -> TaskOutcome {
    match blocked_by {
        None => TaskOutcome::Succeeded,
        Some(upstream) => TaskOutcome::SkippedFailedDependency { upstream },
    }
}

fn evaluate_external(task: &ScheduledTask) -> Evaluation {
    // Graphs reject output-less externals; a hand-built task may still lack one.
    let Some(output) = &task.output else {
        return Evaluation::checked(TaskOutcome::Failed(TaskError::MissingExternalDependency {
            target: "<no output>".to_string(),
        }));
    };

    if output.exists() {
        debug!(task = %task.name, target = %output.location(), "external dependency present");
        Evaluation::checked(TaskOutcome::Succeeded)
    } else {
        error!(task = %task.name, target = %output.location(), "external dependency missing");
        Evaluation::checked(TaskOutcome::Failed(TaskError::MissingExternalDependency {
            target: output.location(),
        }))
    }
}

fn evaluate_producing(task: &ScheduledTask) -> Evaluation {
    let Some(output) = &task.output else {
        return Evaluation::checked(TaskOutcome::Failed(TaskError::Execution(format!(
            "task '{}' declares no output",
            task.name
        ))));
    };

    if output.exists() {
        info!(task = %task.name, target = %output.location(), "output exists; skipping");
        return Evaluation::checked(TaskOutcome::AlreadySatisfied);
    }

    if let Some(upstream) = &task.blocked_by {
        info!(task = %task.name, %upstream, "requirement failed; not running");
        return Evaluation::checked(TaskOutcome::SkippedFailedDependency {
            upstream: upstream.clone(),
        });
    }

    info!(task = %task.name, target = %output.location(), "running task");

    let result = panic::catch_unwind(AssertUnwindSafe(|| task.task.run(&task.inputs)));

    let outcome = match result {
        Ok(Ok(())) if output.exists() => TaskOutcome::Succeeded,
        Ok(Ok(())) => TaskOutcome::Failed(TaskError::PostconditionViolation {
            target: output.location(),
        }),
        Ok(Err(err)) => TaskOutcome::Failed(TaskError::from_run_error(&err)),
        Err(payload) => TaskOutcome::Failed(TaskError::Execution(format!(
            "task panicked: {}",
            panic_message(payload.as_ref())
        ))),
    };

    match &outcome {
        TaskOutcome::Failed(err) => {
            error!(task = %task.name, kind = %err.kind(), error = %err, "task failed")
        }
        _ => info!(task = %task.name, "task succeeded"),
    }

    Evaluation::after_run(outcome)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
