// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//!
//! The core can be unit tested without any Tokio, channels, filesystem, or
//! task bodies.

use std::time::Duration;

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    handle_shutdown, handle_start, handle_task_completion, CoreStep,
};
use crate::engine::RuntimeEvent;
use crate::report::BuildReport;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Expose whether every task is terminal (for tests).
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Produce the initial commands for a fresh build.
    pub fn start(&mut self) -> CoreStep {
        handle_start(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome, ran } => {
                handle_task_completion(&mut self.scheduler, task, outcome, ran)
            }
            RuntimeEvent::ShutdownRequested => handle_shutdown(&mut self.scheduler),
        }
    }

    /// Freeze the execution records into a report.
    pub fn into_report(self, elapsed: Duration) -> BuildReport {
        BuildReport::from_scheduler(&self.scheduler, elapsed)
    }
}
