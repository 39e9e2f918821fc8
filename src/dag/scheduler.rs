// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, Readiness, StateManager};
use crate::dag::task_info::{ScheduledTask, TaskInfo, TaskStatus};
use crate::engine::TaskOutcome;
use crate::types::{TaskKind, TaskName};

/// Scheduler holds the immutable graph plus the execution record table.
///
/// It is responsible for:
/// - deciding when a task is ready (all requirements terminal)
/// - keeping at most `workers` tasks in flight
/// - recording outcomes reported by the executor
/// - stopping dispatch after the first failure when `fail_fast` is set
///
/// It performs no IO: existence checks and `run` calls happen in the
/// executor, which reports back through [`Scheduler::handle_completion`].
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    workers: usize,
    fail_fast: bool,
    /// Set once dispatch has stopped for good (fail-fast or shutdown).
    halted: bool,
    in_flight: usize,
    /// Tasks whose `run` was invoked, in completion order.
    executed: Vec<TaskName>,
}

impl Scheduler {
    /// `workers` is clamped to at least 1.
    pub fn new(graph: DagGraph, workers: usize, fail_fast: bool) -> Self {
        let tasks = graph
            .tasks()
            .filter_map(|name| graph.node(name))
            .map(|node| {
                (
                    node.name.clone(),
                    TaskInfo::new(node.name.clone(), node.kind, node.deps.clone()),
                )
            })
            .collect();

        Self {
            graph,
            tasks,
            workers: workers.max(1),
            fail_fast,
            halted: false,
            in_flight: 0,
            executed: Vec::new(),
        }
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    pub fn status_of(&self, task: &str) -> Option<&TaskStatus> {
        self.tasks.get(task).map(|info| &info.status)
    }

    /// Requirement state of `task` right now. `None` if the task is unknown.
    pub fn readiness_of(&self, task: &str) -> Option<Readiness> {
        let info = self.tasks.get(task)?;
        Some(ReadOnlyStateManager::new(&self.tasks).readiness_of_info(info))
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Whether every task has reached a terminal status.
    pub fn is_finished(&self) -> bool {
        self.tasks.values().all(|info| info.status.is_terminal())
    }

    pub fn executed(&self) -> &[TaskName] {
        &self.executed
    }

    /// Snapshot of every task's record, in topological order.
    pub fn records(&self) -> Vec<(TaskName, TaskKind, TaskStatus)> {
        self.graph
            .tasks()
            .filter_map(|name| self.tasks.get(name))
            .map(|info| (info.name.clone(), info.kind, info.status.clone()))
            .collect()
    }

    /// Dispatch the initial wave (production API).
    pub fn start(&mut self) -> Vec<ScheduledTask> {
        self.start_step_internal().newly_scheduled
    }

    /// Record an executor outcome and return newly ready tasks (production API).
    pub fn handle_completion(
        &mut self,
        task: &str,
        outcome: TaskOutcome,
        ran: bool,
    ) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome, ran)
            .newly_scheduled
    }

    /// Stop dispatching and cancel everything still pending.
    pub fn halt(&mut self) -> Vec<TaskName> {
        self.halt_internal()
    }

    /// Manual-step variant of `start` that returns a rich [`SchedulerStep`].
    pub fn step_start(&mut self) -> SchedulerStep {
        self.start_step_internal()
    }

    /// Manual-step variant of `handle_completion`.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome, ran: bool) -> SchedulerStep {
        self.completion_step_internal(task, outcome, ran)
    }

    fn capacity(&self) -> usize {
        if self.halted {
            0
        } else {
            self.workers.saturating_sub(self.in_flight)
        }
    }

    fn collect_ready(&mut self) -> Vec<ScheduledTask> {
        let capacity = self.capacity();
        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        let ready = manager.collect_new_ready_tasks(capacity);
        self.in_flight += ready.len();
        ready
    }

    fn halt_internal(&mut self) -> Vec<TaskName> {
        if self.halted {
            return Vec::new();
        }
        self.halted = true;
        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        let cancelled = manager.cancel_pending();
        info!(
            cancelled = cancelled.len(),
            in_flight = self.in_flight,
            "scheduler halted; no further tasks will be dispatched"
        );
        cancelled
    }

    fn start_step_internal(&mut self) -> SchedulerStep {
        info!(
            tasks = self.tasks.len(),
            workers = self.workers,
            fail_fast = self.fail_fast,
            "scheduler: starting build"
        );

        let newly_scheduled = self.collect_ready();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            newly_cancelled: Vec::new(),
            build_finished: self.is_finished(),
        }
    }

    fn completion_step_internal(&mut self, task: &str, outcome: TaskOutcome, ran: bool) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        let current = match self.tasks.get(task) {
            Some(info) => info.status.clone(),
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
                step.build_finished = self.is_finished();
                return step;
            }
        };

        if current != TaskStatus::Running {
            warn!(
                task = %task,
                status = %current,
                "completion for task that is not running; ignoring"
            );
            step.build_finished = self.is_finished();
            return step;
        }

        self.in_flight = self.in_flight.saturating_sub(1);

        let Some(info) = self.tasks.get_mut(task) else {
            return step;
        };

        if ran {
            self.executed.push(info.name.clone());
        }

        info.status = outcome.into();

        let failed = matches!(info.status, TaskStatus::Failed(_));
        if failed {
            warn!(
                task = %info.name,
                status = %info.status,
                downstream = ?self.graph.transitive_dependents(task),
                "task failed"
            );
            step.newly_failed.push(info.name.clone());
        } else {
            debug!(task = %info.name, status = %info.status, ran, "task finished");
        }

        if failed && self.fail_fast {
            step.newly_cancelled = self.halt_internal();
        }

        step.newly_scheduled = self.collect_ready();
        step.build_finished = self.is_finished();

        if step.build_finished {
            info!(executed = self.executed.len(), "scheduler: all tasks terminal");
        }

        step
    }
}
