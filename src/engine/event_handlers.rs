// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::info;

use crate::dag::{ScheduledTask, Scheduler};
use crate::engine::TaskOutcome;
use crate::types::TaskName;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Every task is terminal; the shell can stop and build the report.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Seed the build with whatever is ready before any task has run.
pub fn handle_start(scheduler: &mut Scheduler) -> CoreStep {
    let ready = scheduler.start();
    finish_step(scheduler, ready)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    task: TaskName,
    outcome: TaskOutcome,
    ran: bool,
) -> CoreStep {
    let ready = scheduler.handle_completion(&task, outcome, ran);
    finish_step(scheduler, ready)
}

/// Handle a shutdown request: cancel pending work, wait for in-flight tasks.
pub fn handle_shutdown(scheduler: &mut Scheduler) -> CoreStep {
    let cancelled = scheduler.halt();
    info!(
        cancelled = cancelled.len(),
        in_flight = scheduler.in_flight(),
        "shutdown requested"
    );
    finish_step(scheduler, Vec::new())
}

fn finish_step(scheduler: &Scheduler, ready: Vec<ScheduledTask>) -> CoreStep {
    let mut commands = Vec::new();

    if !ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(ready));
    }

    let keep_running = !scheduler.is_finished();
    if !keep_running {
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
