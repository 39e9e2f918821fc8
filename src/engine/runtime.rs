// src/engine/runtime.rs

use std::fmt;
use std::time::Instant;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::report::BuildReport;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the scheduler in response to `RuntimeEvent`s and delegates task
/// evaluation to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// build semantics.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Dispatches the initial wave.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them into the core.
    /// - Executes commands returned by the core until every task is terminal.
    pub async fn run(mut self) -> Result<BuildReport> {
        let started = Instant::now();
        info!("dagbuild runtime started");

        let mut step = self.core.start();

        loop {
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                break;
            }

            if self.core.scheduler().in_flight() == 0 {
                return Err(anyhow!("scheduler stalled: tasks pending but none in flight").into());
            }

            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    return Err(anyhow!(
                        "runtime event channel closed with {} task(s) in flight",
                        self.core.scheduler().in_flight()
                    )
                    .into());
                }
            };

            debug!(?event, "runtime received event");
            step = self.core.step(event);
        }

        let elapsed = started.elapsed();
        info!(?elapsed, "runtime exiting");
        Ok(self.core.into_report(elapsed))
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => {
                self.spawn_ready(tasks).await?;
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
