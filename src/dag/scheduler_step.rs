// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::types::TaskName;

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the graph and make
/// assertions about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to evaluate as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks that were newly marked `Failed` in this step (direct failures
    /// only; propagated skips show up as their dependents are evaluated).
    pub newly_failed: Vec<TaskName>,
    /// Tasks cancelled in this step because the build stopped early.
    pub newly_cancelled: Vec<TaskName>,
    /// Whether every task is now terminal.
    pub build_finished: bool,
}
