// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of evaluating tasks
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation here.
//!
//! - `BlockingExecutor` is the default implementation. Each scheduled task
//!   is evaluated on Tokio's blocking pool (task bodies are synchronous and
//!   do file IO) and its outcome is sent back as `TaskCompleted`.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were scheduled and directly emits `TaskCompleted` events.
//!
//! The number of tasks in flight is bounded by the scheduler, not here.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::{Result, TaskError};

use super::task_runner::{evaluate, Evaluation};

/// Trait abstracting how scheduled tasks are evaluated.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for evaluation.
    ///
    /// The implementation must eventually send exactly one
    /// `RuntimeEvent::TaskCompleted` per task.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor backend used in production.
pub struct BlockingExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    task_timeout: Option<Duration>,
}

impl BlockingExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, task_timeout: Option<Duration>) -> Self {
        Self {
            runtime_tx,
            task_timeout,
        }
    }
}

impl ExecutorBackend for BlockingExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let timeout = self.task_timeout;

        Box::pin(async move {
            for task in tasks {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let name = task.name.clone();
                    let Evaluation { outcome, ran } = evaluate_with_timeout(task, timeout).await;

                    if tx
                        .send(RuntimeEvent::TaskCompleted {
                            task: name.clone(),
                            outcome,
                            ran,
                        })
                        .await
                        .is_err()
                    {
                        warn!(task = %name, "runtime gone before completion could be reported");
                    }
                });
            }
            Ok(())
        })
    }
}

/// Run [`evaluate`] on the blocking pool, optionally bounded by `timeout`.
///
/// A timed-out task is reported failed immediately; its thread keeps running
/// and its eventual result is dropped.
pub async fn evaluate_with_timeout(task: ScheduledTask, timeout: Option<Duration>) -> Evaluation {
    let name = task.name.clone();
    let ran_if_lost = task.kind.has_run();
    let handle = tokio::task::spawn_blocking(move || evaluate(&task));

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                error!(task = %name, ?limit, "task timed out");
                return Evaluation {
                    outcome: TaskOutcome::Failed(TaskError::Timeout(limit)),
                    ran: ran_if_lost,
                };
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(evaluation) => {
            debug!(task = %name, outcome = ?evaluation.outcome, "evaluation finished");
            evaluation
        }
        Err(e) => {
            error!(task = %name, error = %e, "evaluation thread failed");
            Evaluation {
                outcome: TaskOutcome::Failed(TaskError::Execution(format!(
                    "evaluation thread failed: {e}"
                ))),
                ran: ran_if_lost,
            }
        }
    }
}
