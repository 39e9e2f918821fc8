// src/dag/task_info.rs

//! Per-task execution records and the scheduled-task type handed to
//! executors.

use std::fmt;

use crate::errors::TaskError;
use crate::target::TargetRef;
use crate::task::{Inputs, TaskRef};
use crate::types::{TaskKind, TaskName};

/// Execution record of a task within one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// In the graph, waiting on requirements or a free worker.
    Pending,
    /// Dispatched to the executor.
    Running,
    /// Ran (or, for external and wrapper tasks, was found complete) and its
    /// output is present.
    Succeeded,
    Failed(TaskError),
    /// Output existed before evaluation; `run` was not called.
    SkippedAlreadySatisfied,
    /// Not executed because `upstream` (a direct requirement) did not end in
    /// a success-compatible state.
    ///
    /// Wrappers use this as their failure state.
    SkippedFailedDependency { upstream: TaskName },
    /// Never dispatched because the build stopped early (`fail_fast` or a
    /// shutdown request).
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    /// Succeeded or already satisfied.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::SkippedAlreadySatisfied
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed(_) => "failed",
            TaskStatus::SkippedAlreadySatisfied => "skipped-already-satisfied",
            TaskStatus::SkippedFailedDependency { .. } => "skipped-due-to-failed-dependency",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Failed(err) => write!(f, "failed ({}: {err})", err.kind()),
            TaskStatus::SkippedFailedDependency { upstream } => {
                write!(f, "skipped-due-to-failed-dependency ({upstream})")
            }
            other => f.write_str(other.label()),
        }
    }
}

/// Scheduler-side bookkeeping for one task.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub kind: TaskKind,
    /// Direct dependencies.
    pub deps: Vec<TaskName>,
    pub status: TaskStatus,
}

impl TaskInfo {
    pub fn new(name: TaskName, kind: TaskKind, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            kind,
            deps,
            status: TaskStatus::Pending,
        }
    }
}

/// A task the scheduler wants evaluated now.
#[derive(Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub kind: TaskKind,
    pub task: TaskRef,
    pub output: Option<TargetRef>,
    pub inputs: Inputs,
    /// First direct requirement that did not succeed, if any.
    ///
    /// A producing task whose output already exists is still reported as
    /// satisfied; otherwise this blocks `run`.
    pub blocked_by: Option<TaskName>,
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("output", &self.output.as_ref().map(|t| t.location()))
            .field("blocked_by", &self.blocked_by)
            .finish_non_exhaustive()
    }
}
