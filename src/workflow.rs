// src/workflow.rs

//! The bundled demo workflow run by the `dagbuild` binary.
//!
//! ```text
//! SetupTask ──> FirstTask ──┐
//!     │                     ├──> SecondTask ──> WorkflowWrapper
//!     └──> (writes) ExternalFileTask ┘
//! ```
//!
//! `SetupTask` creates the file that `ExternalFileTask` only checks for, so
//! the external dependency is satisfied once setup has run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::target::{LocalTarget, TargetRef};
use crate::task::{ExternalTask, Inputs, Requirement, Task, TaskRef, WrapperTask};
use crate::types::TaskName;

pub const EXTERNAL_FILE: &str = "external_file.txt";
pub const FIRST_OUTPUT: &str = "first_output.txt";
pub const FINAL_OUTPUT: &str = "final_output.txt";

pub const EXTERNAL_TEXT: &str = "This is an external file";
pub const FIRST_TEXT: &str = "First task completed!";

fn local(data_dir: &Path, file: &str) -> TargetRef {
    Arc::new(LocalTarget::new(data_dir.join(file)))
}

fn own_output(task: &dyn Task) -> Result<TargetRef> {
    task.output()
        .with_context(|| format!("task '{}' has no output", task.name()))
}

/// Creates the data directory and the file the external task points at.
#[derive(Debug, Clone)]
pub struct SetupTask {
    data_dir: PathBuf,
}

impl SetupTask {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl Task for SetupTask {
    fn name(&self) -> &str {
        "SetupTask"
    }

    fn output(&self) -> Option<TargetRef> {
        Some(local(&self.data_dir, EXTERNAL_FILE))
    }

    fn run(&self, _inputs: &Inputs) -> Result<()> {
        own_output(self)?.write_bytes(EXTERNAL_TEXT.as_bytes())?;
        Ok(())
    }
}

pub fn external_file_task(data_dir: &Path) -> ExternalTask {
    ExternalTask::new("ExternalFileTask", local(data_dir, EXTERNAL_FILE))
}

#[derive(Debug, Clone)]
pub struct FirstTask {
    data_dir: PathBuf,
}

impl FirstTask {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl Task for FirstTask {
    fn name(&self) -> &str {
        "FirstTask"
    }

    fn requires(&self) -> Requirement {
        Requirement::One(Arc::new(SetupTask::new(&self.data_dir)))
    }

    fn output(&self) -> Option<TargetRef> {
        Some(local(&self.data_dir, FIRST_OUTPUT))
    }

    fn run(&self, _inputs: &Inputs) -> Result<()> {
        own_output(self)?.write_bytes(FIRST_TEXT.as_bytes())?;
        Ok(())
    }
}

/// Combines the first task's output with the external file.
#[derive(Debug, Clone)]
pub struct SecondTask {
    data_dir: PathBuf,
}

impl SecondTask {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl Task for SecondTask {
    fn name(&self) -> &str {
        "SecondTask"
    }

    fn requires(&self) -> Requirement {
        Requirement::labeled([
            ("first", Arc::new(FirstTask::new(&self.data_dir)) as TaskRef),
            ("setup", Arc::new(SetupTask::new(&self.data_dir)) as TaskRef),
            ("external", Arc::new(external_file_task(&self.data_dir)) as TaskRef),
        ])
    }

    fn output(&self) -> Option<TargetRef> {
        Some(local(&self.data_dir, FINAL_OUTPUT))
    }

    fn run(&self, inputs: &Inputs) -> Result<()> {
        let first = inputs.get("first")?.read_to_string()?;
        let external = inputs.get("external")?.read_to_string()?;

        let contents = format!(
            "Second task completed!\nFirst task said: {first}\nExternal file said: {external}"
        );
        own_output(self)?.write_bytes(contents.as_bytes())?;
        Ok(())
    }
}

/// Groups the whole workflow under one root.
pub fn workflow_wrapper(data_dir: &Path) -> WrapperTask {
    WrapperTask::new(
        "WorkflowWrapper",
        Requirement::One(Arc::new(SecondTask::new(data_dir))),
    )
}

/// Every workflow task by name, for selecting roots on the command line.
pub fn registry(data_dir: &Path) -> BTreeMap<TaskName, TaskRef> {
    let tasks: [TaskRef; 5] = [
        Arc::new(SetupTask::new(data_dir)),
        Arc::new(external_file_task(data_dir)),
        Arc::new(FirstTask::new(data_dir)),
        Arc::new(SecondTask::new(data_dir)),
        Arc::new(workflow_wrapper(data_dir)),
    ];

    tasks
        .into_iter()
        .map(|task| (task.name().to_string(), task))
        .collect()
}
