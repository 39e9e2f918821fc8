// src/types.rs

use std::fmt;

/// Canonical task identity used throughout the engine.
pub type TaskName = String;

/// The three shapes of task the scheduler knows how to evaluate.
///
/// - `Producing`: has `run` logic and a real output to create (default).
/// - `External`: declares an output but never runs; the output must already
///   exist when the task is evaluated.
/// - `Wrapper`: no output of its own, only groups requirements. Its
///   completion is the logical AND of its requirements' success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskKind {
    #[default]
    Producing,
    External,
    Wrapper,
}

impl TaskKind {
    /// Whether the engine expects `output()` to return a target.
    pub fn has_output(self) -> bool {
        !matches!(self, TaskKind::Wrapper)
    }

    /// Whether evaluating this kind ever calls `run`.
    pub fn has_run(self) -> bool {
        matches!(self, TaskKind::Producing)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Producing => "producing",
            TaskKind::External => "external",
            TaskKind::Wrapper => "wrapper",
        };
        f.write_str(s)
    }
}
