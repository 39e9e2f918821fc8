use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, bail};
use dagbuild::{
    ExternalTask, Inputs, MemoryStore, Requirement, Target, TargetRef, Task, TaskKind, TaskRef,
    WrapperTask,
};

/// Shared, ordered log of `run` invocations.
#[derive(Debug, Clone, Default)]
pub struct RunLog(Arc<Mutex<Vec<String>>>);

impl RunLog {
    pub fn record(&self, name: &str) {
        self.0.lock().expect("run log poisoned").push(name.to_string());
    }

    pub fn runs(&self) -> Vec<String> {
        self.0.lock().expect("run log poisoned").clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.runs().iter().filter(|n| *n == name).count()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.runs().iter().position(|n| n == name)
    }
}

/// An in-memory store plus a run log, from which test tasks are built.
#[derive(Debug, Clone, Default)]
pub struct TestWorld {
    store: MemoryStore,
    log: RunLog,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    pub fn runs(&self) -> Vec<String> {
        self.log.runs()
    }

    /// Pre-populate an artifact.
    pub fn seed(&self, key: &str, contents: &str) {
        self.store.insert(key, contents.as_bytes().to_vec());
    }

    pub fn contents(&self, key: &str) -> Option<String> {
        self.store
            .get(key)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn target(&self, key: &str) -> TargetRef {
        Arc::new(self.store.target(key))
    }

    /// A producing task whose output key defaults to its name.
    pub fn task(&self, name: &str) -> TaskBuilder {
        TaskBuilder {
            name: name.to_string(),
            store: self.store.clone(),
            log: self.log.clone(),
            requirement: Requirement::None,
            output_key: Some(name.to_string()),
            behaviour: Behaviour::Write,
        }
    }

    pub fn external(&self, name: &str, key: &str) -> TaskRef {
        Arc::new(ExternalTask::new(name, self.target(key)))
    }

    pub fn wrapper(&self, name: &str, requirement: Requirement) -> TaskRef {
        Arc::new(WrapperTask::new(name, requirement))
    }
}

/// What a [`RecordingTask`] does when run.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Write its name followed by one `label=content` line per input.
    Write,
    /// Return an error without writing.
    Fail(String),
    /// Return `Ok` without writing anything.
    ForgetOutput,
    /// Sleep, then behave like `Write`.
    Sleep(Duration),
    Panic(String),
}

pub struct TaskBuilder {
    name: String,
    store: MemoryStore,
    log: RunLog,
    requirement: Requirement,
    output_key: Option<String>,
    behaviour: Behaviour,
}

impl TaskBuilder {
    pub fn requires(mut self, task: &TaskRef) -> Self {
        self.requirement = Requirement::One(task.clone());
        self
    }

    pub fn requires_all(mut self, tasks: &[&TaskRef]) -> Self {
        self.requirement = Requirement::Many(tasks.iter().map(|t| (*t).clone()).collect());
        self
    }

    pub fn requires_labeled(mut self, pairs: &[(&str, &TaskRef)]) -> Self {
        self.requirement =
            Requirement::labeled(pairs.iter().map(|(label, t)| (*label, (*t).clone())));
        self
    }

    pub fn output_key(mut self, key: &str) -> Self {
        self.output_key = Some(key.to_string());
        self
    }

    /// Declare no output at all (invalid for a producing task).
    pub fn without_output(mut self) -> Self {
        self.output_key = None;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.behaviour = Behaviour::Fail(message.to_string());
        self
    }

    pub fn forgetting_output(mut self) -> Self {
        self.behaviour = Behaviour::ForgetOutput;
        self
    }

    pub fn sleeping(mut self, duration: Duration) -> Self {
        self.behaviour = Behaviour::Sleep(duration);
        self
    }

    pub fn panicking(mut self, message: &str) -> Self {
        self.behaviour = Behaviour::Panic(message.to_string());
        self
    }

    pub fn build(self) -> TaskRef {
        Arc::new(RecordingTask {
            name: self.name,
            store: self.store,
            log: self.log,
            requirement: self.requirement,
            output_key: self.output_key,
            behaviour: self.behaviour,
        })
    }
}

/// Producing task backed by a [`MemoryStore`] that records each `run`.
#[derive(Debug)]
pub struct RecordingTask {
    name: String,
    store: MemoryStore,
    log: RunLog,
    requirement: Requirement,
    output_key: Option<String>,
    behaviour: Behaviour,
}

impl RecordingTask {
    fn write_output(&self, inputs: &Inputs) -> anyhow::Result<()> {
        let output = self.output().context("recording task has no output")?;

        let mut contents = self.name.clone();
        for (label, target) in inputs.entries() {
            let value = match target {
                Some(target) => target.read_to_string()?,
                None => "<none>".to_string(),
            };
            contents.push_str(&format!("\n{label}={value}"));
        }

        output.write_bytes(contents.as_bytes())?;
        Ok(())
    }
}

impl Task for RecordingTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Producing
    }

    fn requires(&self) -> Requirement {
        self.requirement.clone()
    }

    fn output(&self) -> Option<TargetRef> {
        self.output_key
            .as_ref()
            .map(|key| Arc::new(self.store.target(key.clone())) as TargetRef)
    }

    fn run(&self, inputs: &Inputs) -> anyhow::Result<()> {
        self.log.record(&self.name);

        match &self.behaviour {
            Behaviour::Write => self.write_output(inputs),
            Behaviour::Fail(message) => bail!("{message}"),
            Behaviour::ForgetOutput => Ok(()),
            Behaviour::Sleep(duration) => {
                std::thread::sleep(*duration);
                self.write_output(inputs)
            }
            Behaviour::Panic(message) => panic!("{message}"),
        }
    }
}

/// Location string of a memory target, as used in error messages.
pub fn memory_location(key: &str) -> String {
    MemoryStore::new().target(key).location()
}
