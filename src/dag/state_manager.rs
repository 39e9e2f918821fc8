// src/dag/state_manager.rs

//! Per-build state transitions for tasks in the scheduler.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::task_info::{ScheduledTask, TaskInfo, TaskStatus};
use crate::dag::DagGraph;
use crate::exec::wrapper_outcome;
use crate::types::{TaskKind, TaskName};

/// Where a pending task stands with respect to its direct requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// At least one requirement is not terminal yet.
    Waiting,
    /// Every requirement succeeded or was already satisfied.
    Satisfied,
    /// Every requirement is terminal, but this one did not succeed.
    Blocked(TaskName),
}

/// Manages status transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a DagGraph, tasks: &'a mut HashMap<TaskName, TaskInfo>) -> Self {
        Self { graph, tasks }
    }

    /// Walk pending tasks in topological order and pick up everything whose
    /// requirements are all terminal.
    ///
    /// - Wrappers are resolved on the spot: they have nothing to check or
    ///   run, so they never occupy a worker.
    /// - Other tasks are marked `Running` and returned for dispatch, at most
    ///   `capacity` of them.
    ///
    /// A single pass is enough: a wrapper resolved here is seen as terminal
    /// by every later task in the order.
    pub fn collect_new_ready_tasks(&mut self, capacity: usize) -> Vec<ScheduledTask> {
        let mut ready = Vec::new();

        for name in self.graph.topological_order() {
            let readiness = match self.tasks.get(name) {
                Some(info) if info.status == TaskStatus::Pending => {
                    ReadOnlyStateManager::new(self.tasks).readiness_of_info(info)
                }
                Some(_) => continue,
                None => {
                    warn!(task = %name, "node in graph not present in tasks map");
                    continue;
                }
            };

            let blocked_by = match readiness {
                Readiness::Waiting => continue,
                Readiness::Satisfied => None,
                Readiness::Blocked(upstream) => Some(upstream),
            };

            let Some(info) = self.tasks.get_mut(name) else {
                continue;
            };

            if info.kind == TaskKind::Wrapper {
                info.status = wrapper_outcome(blocked_by).into();
                info!(task = %info.name, status = %info.status, "wrapper resolved");
                continue;
            }

            if ready.len() >= capacity {
                continue;
            }

            let Some(node) = self.graph.node(name) else {
                continue;
            };

            debug!(
                task = %info.name,
                kind = %info.kind,
                blocked_by = ?blocked_by,
                "requirements terminal; marking Running"
            );
            info.status = TaskStatus::Running;

            ready.push(ScheduledTask {
                name: node.name.clone(),
                kind: node.kind,
                task: node.task.clone(),
                output: node.output.clone(),
                inputs: self.graph.inputs_for(name),
                blocked_by,
            });
        }

        ready
    }

    /// Mark every still-pending task `Cancelled`. Running tasks are left to
    /// finish.
    pub fn cancel_pending(&mut self) -> Vec<TaskName> {
        let mut cancelled = Vec::new();
        for name in self.graph.topological_order() {
            if let Some(info) = self.tasks.get_mut(name) {
                if info.status == TaskStatus::Pending {
                    info.status = TaskStatus::Cancelled;
                    debug!(task = %info.name, "cancelled before dispatch");
                    cancelled.push(info.name.clone());
                }
            }
        }
        cancelled
    }
}

/// A read-only view for checking requirement state.
///
/// Used where we only have shared access to the tasks map (e.g. in
/// `Scheduler::readiness_of`).
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    pub fn readiness_of_info(&self, info: &TaskInfo) -> Readiness {
        let mut blocked_by = None;

        for dep_name in &info.deps {
            let Some(dep) = self.tasks.get(dep_name) else {
                warn!(
                    task = %info.name,
                    dep = %dep_name,
                    "dependency missing from tasks map"
                );
                return Readiness::Waiting;
            };

            if !dep.status.is_terminal() {
                return Readiness::Waiting;
            }
            if blocked_by.is_none() && !dep.status.is_success() {
                blocked_by = Some(dep.name.clone());
            }
        }

        match blocked_by {
            Some(upstream) => Readiness::Blocked(upstream),
            None => Readiness::Satisfied,
        }
    }
}
