use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use dagbuild::dag::ScheduledTask;
use dagbuild::engine::{RuntimeEvent, TaskOutcome};
use dagbuild::errors::Result;
use dagbuild::exec::ExecutorBackend;

/// A fake executor that:
/// - records each dispatched batch of task names
/// - immediately reports `TaskCompleted` with a scripted outcome
///   (`Succeeded` unless configured otherwise)
///
/// No task body is ever called.
pub struct FakeExecutor {
    runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
    outcomes: HashMap<String, TaskOutcome>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
        batches: Arc<Mutex<Vec<Vec<String>>>>,
    ) -> Self {
        Self {
            runtime_tx,
            outcomes: HashMap::new(),
            batches,
        }
    }

    pub fn with_outcome(mut self, task: &str, outcome: TaskOutcome) -> Self {
        self.outcomes.insert(task.to_string(), outcome);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let batches = Arc::clone(&self.batches);

        let completions: Vec<(String, TaskOutcome, bool)> = tasks
            .iter()
            .map(|t| {
                let outcome = self
                    .outcomes
                    .get(&t.name)
                    .cloned()
                    .unwrap_or(TaskOutcome::Succeeded);
                let ran = t.kind.has_run()
                    && matches!(outcome, TaskOutcome::Succeeded | TaskOutcome::Failed(_));
                (t.name.clone(), outcome, ran)
            })
            .collect();

        Box::pin(async move {
            {
                let mut guard = batches.lock().expect("batch log poisoned");
                guard.push(completions.iter().map(|(name, _, _)| name.clone()).collect());
            }

            for (task, outcome, ran) in completions {
                tx.send(RuntimeEvent::TaskCompleted { task, outcome, ran })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
