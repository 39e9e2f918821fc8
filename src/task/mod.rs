// src/task/mod.rs

//! Task model.
//!
//! A task is anything implementing [`Task`]: a stable name, a
//! [`Requirement`] naming the tasks it depends on, an optional output
//! [`Target`](crate::target::Target) and, for producing tasks, `run` logic.
//!
//! - [`requirement`] holds the declaration shapes ([`Requirement`]) and the
//!   resolved shape handed to `run` ([`Inputs`]).
//! - [`kinds`] provides ready-made external and wrapper tasks.

use std::sync::Arc;

use crate::target::TargetRef;
use crate::types::TaskKind;

pub mod kinds;
pub mod requirement;

pub use kinds::{ExternalTask, WrapperTask};
pub use requirement::{Inputs, Requirement};

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// A named unit of work with declared prerequisites and a completion marker.
///
/// The engine calls `requires`, `output` and `kind` once, while building the
/// graph, and `run` at most once per build.
///
/// ```ignore
/// struct Report {
///     data: TaskRef,
/// }
///
/// impl Task for Report {
///     fn name(&self) -> &str {
///         "Report"
///     }
///
///     fn requires(&self) -> Requirement {
///         Requirement::One(self.data.clone())
///     }
///
///     fn output(&self) -> Option<TargetRef> {
///         Some(Arc::new(LocalTarget::new("out/report.txt")))
///     }
///
///     fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
///         let data = inputs.single()?.read_to_string()?;
///         let out = self.output().context("no output")?;
///         out.write_bytes(data.to_uppercase().as_bytes())?;
///         Ok(())
///     }
/// }
/// ```
pub trait Task: Send + Sync {
    /// Identity of the task. Two tasks with the same name are the same task.
    fn name(&self) -> &str;

    fn kind(&self) -> TaskKind {
        TaskKind::Producing
    }

    fn requires(&self) -> Requirement {
        Requirement::None
    }

    /// The artifact proving this task has completed.
    ///
    /// Producing and external tasks must return `Some`; wrappers return
    /// `None`. Must be stable across calls.
    fn output(&self) -> Option<TargetRef> {
        None
    }

    /// Do the work. `inputs` mirrors [`Task::requires`] with each task
    /// replaced by its output target.
    ///
    /// On success the output must exist afterwards.
    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        let _ = inputs;
        anyhow::bail!("task '{}' has no run logic", self.name())
    }
}
