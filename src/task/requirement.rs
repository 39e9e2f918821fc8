// src/task/requirement.rs

use std::fmt;

use anyhow::{anyhow, Result};

use super::TaskRef;
use crate::target::TargetRef;

/// Prerequisites declared by a task.
///
/// `Labeled` keeps declaration order: it decides the order in which the
/// graph builder discovers, and therefore schedules, the requirements.
#[derive(Clone, Default)]
pub enum Requirement {
    #[default]
    None,
    One(TaskRef),
    Many(Vec<TaskRef>),
    Labeled(Vec<(String, TaskRef)>),
}

impl Requirement {
    pub fn labeled<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, TaskRef)>,
        S: Into<String>,
    {
        Requirement::Labeled(
            pairs
                .into_iter()
                .map(|(label, task)| (label.into(), task))
                .collect(),
        )
    }

    /// Required tasks in declaration order (may contain duplicates).
    pub fn tasks(&self) -> Vec<&TaskRef> {
        match self {
            Requirement::None => Vec::new(),
            Requirement::One(task) => vec![task],
            Requirement::Many(tasks) => tasks.iter().collect(),
            Requirement::Labeled(pairs) => pairs.iter().map(|(_, task)| task).collect(),
        }
    }

    /// Resolve into [`Inputs`] of the same shape, looking up each task's
    /// output by name.
    pub(crate) fn resolve<F>(&self, mut output_of: F) -> Inputs
    where
        F: FnMut(&str) -> Option<TargetRef>,
    {
        match self {
            Requirement::None => Inputs::None,
            Requirement::One(task) => Inputs::One(output_of(task.name())),
            Requirement::Many(tasks) => {
                Inputs::Many(tasks.iter().map(|t| output_of(t.name())).collect())
            }
            Requirement::Labeled(pairs) => Inputs::Labeled(
                pairs
                    .iter()
                    .map(|(label, t)| (label.clone(), output_of(t.name())))
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::None => f.write_str("None"),
            Requirement::One(task) => f.debug_tuple("One").field(&task.name()).finish(),
            Requirement::Many(tasks) => f
                .debug_tuple("Many")
                .field(&tasks.iter().map(|t| t.name()).collect::<Vec<_>>())
                .finish(),
            Requirement::Labeled(pairs) => f
                .debug_tuple("Labeled")
                .field(
                    &pairs
                        .iter()
                        .map(|(label, t)| (label.as_str(), t.name()))
                        .collect::<Vec<_>>(),
                )
                .finish(),
        }
    }
}

/// Requirement outputs as seen by `run`.
///
/// A required wrapper has no output, so its slot is `None`.
#[derive(Debug, Clone, Default)]
pub enum Inputs {
    #[default]
    None,
    One(Option<TargetRef>),
    Many(Vec<Option<TargetRef>>),
    Labeled(Vec<(String, Option<TargetRef>)>),
}

impl Inputs {
    /// The output of a single (`One`) requirement.
    pub fn single(&self) -> Result<&TargetRef> {
        match self {
            Inputs::One(Some(target)) => Ok(target),
            Inputs::One(None) => Err(anyhow!("required task has no output")),
            other => Err(anyhow!("expected a single input, got {}", other.shape())),
        }
    }

    /// The output at `index` of a `Many` requirement.
    pub fn at(&self, index: usize) -> Result<&TargetRef> {
        match self {
            Inputs::Many(targets) => targets
                .get(index)
                .ok_or_else(|| anyhow!("no input at index {index}"))?
                .as_ref()
                .ok_or_else(|| anyhow!("input {index} has no output")),
            other => Err(anyhow!("expected a sequence of inputs, got {}", other.shape())),
        }
    }

    /// The output registered under `label` in a `Labeled` requirement.
    pub fn get(&self, label: &str) -> Result<&TargetRef> {
        match self {
            Inputs::Labeled(pairs) => pairs
                .iter()
                .find(|(l, _)| l == label)
                .ok_or_else(|| anyhow!("no input labelled '{label}'"))?
                .1
                .as_ref()
                .ok_or_else(|| anyhow!("input '{label}' has no output")),
            other => Err(anyhow!("expected labelled inputs, got {}", other.shape())),
        }
    }

    /// Every input with a key: the label, or the position for `One`/`Many`.
    pub fn entries(&self) -> Vec<(String, Option<&TargetRef>)> {
        match self {
            Inputs::None => Vec::new(),
            Inputs::One(target) => vec![("0".to_string(), target.as_ref())],
            Inputs::Many(targets) => targets
                .iter()
                .enumerate()
                .map(|(i, t)| (i.to_string(), t.as_ref()))
                .collect(),
            Inputs::Labeled(pairs) => pairs
                .iter()
                .map(|(label, t)| (label.clone(), t.as_ref()))
                .collect(),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Inputs::None => "no inputs",
            Inputs::One(_) => "a single input",
            Inputs::Many(_) => "a sequence",
            Inputs::Labeled(_) => "labelled inputs",
        }
    }
}
