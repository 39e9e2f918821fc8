// src/errors.rs

//! Crate-wide error types and aliases.
//!
//! - [`DagbuildError`] covers everything that stops a build before (or
//!   instead of) running tasks: bad config, cyclic graphs, tasks that do not
//!   declare an output.
//! - [`TaskError`] is the task-local failure recorded in a
//!   [`crate::report::BuildReport`]. It never aborts the build; it only fails
//!   the task and, through propagation, its dependents.

use std::time::Duration;

use thiserror::Error;

use crate::types::TaskName;

#[derive(Error, Debug)]
pub enum DagbuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// The requirement graph contains a cycle; the path lists every task on
    /// it, starting and ending with the same name.
    #[error("Cyclic dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<TaskName>),

    /// A producing or external task declared no output target.
    #[error("Task '{0}' must declare an output target")]
    MissingOutput(TaskName),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a single task ended in the `Failed` state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// An external task's output was absent; the engine never creates it.
    #[error("missing external dependency: {target} does not exist")]
    MissingExternalDependency { target: String },

    /// The task's `run` returned an error.
    #[error("execution failed: {0}")]
    Execution(String),

    /// `run` returned normally but the declared output is still absent.
    #[error("postcondition violated: run completed but {target} does not exist")]
    PostconditionViolation { target: String },

    /// Reading or writing a target failed while the task was running.
    #[error("target I/O error: {0}")]
    TargetIo(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Coarse classification of a [`TaskError`], used by summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingExternalDependency,
    ExecutionError,
    PostconditionViolation,
    TargetIoError,
    Timeout,
}

impl TaskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::MissingExternalDependency { .. } => ErrorKind::MissingExternalDependency,
            TaskError::Execution(_) => ErrorKind::ExecutionError,
            TaskError::PostconditionViolation { .. } => ErrorKind::PostconditionViolation,
            TaskError::TargetIo(_) => ErrorKind::TargetIoError,
            TaskError::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Classify an error returned from a task's `run`.
    ///
    /// Any [`TargetError`](crate::target::TargetError) in the cause chain
    /// makes it a target I/O failure; everything else is an execution error.
    pub fn from_run_error(err: &anyhow::Error) -> Self {
        let io_cause = err
            .chain()
            .any(|cause| cause.downcast_ref::<crate::target::TargetError>().is_some());

        if io_cause {
            TaskError::TargetIo(format!("{err:#}"))
        } else {
            TaskError::Execution(format!("{err:#}"))
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::MissingExternalDependency => "MissingExternalDependency",
            ErrorKind::ExecutionError => "ExecutionError",
            ErrorKind::PostconditionViolation => "PostconditionViolation",
            ErrorKind::TargetIoError => "TargetIOError",
            ErrorKind::Timeout => "Timeout",
        };
        f.write_str(s)
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagbuildError>;
