// src/task/kinds.rs

//! Ready-made external and wrapper tasks.

use super::{Requirement, Task};
use crate::target::TargetRef;
use crate::types::{TaskKind, TaskName};

/// A task whose output is expected to already exist.
///
/// The engine only checks presence; it never tries to create the artifact.
#[derive(Debug, Clone)]
pub struct ExternalTask {
    name: TaskName,
    target: TargetRef,
}

impl ExternalTask {
    pub fn new(name: impl Into<TaskName>, target: TargetRef) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

impl Task for ExternalTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::External
    }

    fn output(&self) -> Option<TargetRef> {
        Some(self.target.clone())
    }
}

/// Groups requirements without producing anything itself.
#[derive(Debug, Clone)]
pub struct WrapperTask {
    name: TaskName,
    requirement: Requirement,
}

impl WrapperTask {
    pub fn new(name: impl Into<TaskName>, requirement: Requirement) -> Self {
        Self {
            name: name.into(),
            requirement,
        }
    }
}

impl Task for WrapperTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Wrapper
    }

    fn requires(&self) -> Requirement {
        self.requirement.clone()
    }
}
