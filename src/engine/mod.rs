// src/engine/mod.rs

//! Orchestration engine for dagbuild.
//!
//! This module ties together:
//! - the scheduler (which tasks are ready, what each one ended as)
//! - the main runtime event loop that reacts to:
//!   - task completion events from the executor
//!   - shutdown requests
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::dag::TaskStatus;
use crate::errors::TaskError;
use crate::types::TaskName;

/// Outcome of evaluating one task, as reported by an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Ran and produced its output, or (external/wrapper) found complete.
    Succeeded,
    /// Output existed before evaluation.
    AlreadySatisfied,
    Failed(TaskError),
    /// Output missing and a requirement did not succeed; `run` not called.
    SkippedFailedDependency { upstream: TaskName },
}

impl From<TaskOutcome> for TaskStatus {
    fn from(outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Succeeded => TaskStatus::Succeeded,
            TaskOutcome::AlreadySatisfied => TaskStatus::SkippedAlreadySatisfied,
            TaskOutcome::Failed(err) => TaskStatus::Failed(err),
            TaskOutcome::SkippedFailedDependency { upstream } => {
                TaskStatus::SkippedFailedDependency { upstream }
            }
        }
    }
}

/// Events flowing into the runtime from executors and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task finished evaluating.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
        /// Whether the task's `run` was invoked.
        ran: bool,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C): stop dispatching, let
    /// in-flight tasks finish.
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
