// src/report.rs

//! Build report: the immutable outcome of one build invocation.

use std::fmt;
use std::time::Duration;

use crate::dag::{Scheduler, TaskStatus};
use crate::errors::TaskError;
use crate::types::{TaskKind, TaskName};

/// Terminal record of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub name: TaskName,
    pub kind: TaskKind,
    pub status: TaskStatus,
}

/// Number of tasks per terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub succeeded: usize,
    pub already_satisfied: usize,
    pub failed: usize,
    pub skipped_failed_dependency: usize,
    pub cancelled: usize,
}

/// Snapshot of every task's terminal status plus the overall verdict.
#[derive(Debug, Clone)]
pub struct BuildReport {
    roots: Vec<TaskName>,
    /// Topological order.
    records: Vec<TaskRecord>,
    executed: Vec<TaskName>,
    success: bool,
    elapsed: Duration,
}

impl BuildReport {
    pub(crate) fn from_scheduler(scheduler: &Scheduler, elapsed: Duration) -> Self {
        let records: Vec<TaskRecord> = scheduler
            .records()
            .into_iter()
            .map(|(name, kind, status)| TaskRecord { name, kind, status })
            .collect();

        let success = records.iter().all(|r| r.status.is_success());

        Self {
            roots: scheduler.graph().roots().to_vec(),
            records,
            executed: scheduler.executed().to_vec(),
            success,
            elapsed,
        }
    }

    /// True iff every task ended succeeded or already satisfied.
    pub fn success(&self) -> bool {
        self.success
    }

    /// 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.success { 0 } else { 1 }
    }

    pub fn roots(&self) -> &[TaskName] {
        &self.roots
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn status_of(&self, task: &str) -> Option<&TaskStatus> {
        self.records
            .iter()
            .find(|r| r.name == task)
            .map(|r| &r.status)
    }

    /// Tasks whose `run` was invoked, in completion order.
    pub fn run_order(&self) -> &[TaskName] {
        &self.executed
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Tasks that failed themselves, excluding propagated skips.
    pub fn directly_failed(&self) -> Vec<(&str, &TaskError)> {
        self.records
            .iter()
            .filter_map(|r| match &r.status {
                TaskStatus::Failed(err) => Some((r.name.as_str(), err)),
                _ => None,
            })
            .collect()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for record in &self.records {
            match record.status {
                TaskStatus::Succeeded => counts.succeeded += 1,
                TaskStatus::SkippedAlreadySatisfied => counts.already_satisfied += 1,
                TaskStatus::Failed(_) => counts.failed += 1,
                TaskStatus::SkippedFailedDependency { .. } => counts.skipped_failed_dependency += 1,
                TaskStatus::Cancelled => counts.cancelled += 1,
                TaskStatus::Pending | TaskStatus::Running => {}
            }
        }
        counts
    }

    fn with_status<'a, F>(&'a self, pred: F) -> Vec<&'a TaskRecord>
    where
        F: Fn(&TaskStatus) -> bool,
    {
        self.records.iter().filter(|r| pred(&r.status)).collect()
    }
}

const RULE: &str = "===== dagbuild Execution Summary =====";

/// Human-readable execution summary, grouped by terminal status.
impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f)?;
        writeln!(f, "Scheduled {} tasks of which:", self.records.len())?;

        let sections: [(&str, Vec<&TaskRecord>); 5] = [
            (
                "ran successfully",
                self.with_status(|s| *s == TaskStatus::Succeeded),
            ),
            (
                "complete ones were encountered",
                self.with_status(|s| *s == TaskStatus::SkippedAlreadySatisfied),
            ),
            (
                "failed",
                self.with_status(|s| matches!(s, TaskStatus::Failed(_))),
            ),
            (
                "were not run due to failed dependencies",
                self.with_status(|s| matches!(s, TaskStatus::SkippedFailedDependency { .. })),
            ),
            (
                "were cancelled before dispatch",
                self.with_status(|s| *s == TaskStatus::Cancelled),
            ),
        ];

        for (heading, records) in sections.iter().filter(|(_, r)| !r.is_empty()) {
            writeln!(f, "* {} {heading}:", records.len())?;
            for record in records {
                match &record.status {
                    TaskStatus::Failed(err) => {
                        writeln!(f, "    - {} ({}: {err})", record.name, err.kind())?
                    }
                    TaskStatus::SkippedFailedDependency { upstream } => {
                        writeln!(f, "    - {} (upstream: {upstream})", record.name)?
                    }
                    _ => writeln!(f, "    - {} [{}]", record.name, record.kind)?,
                }
            }
        }

        writeln!(f)?;
        if self.success {
            writeln!(
                f,
                "This progress looks :) because there were no failed tasks or missing dependencies"
            )?;
        } else {
            writeln!(f, "This progress looks :( because there were failed tasks")?;
        }
        writeln!(f)?;
        write!(f, "{RULE}")
    }
}
