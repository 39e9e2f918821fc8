// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{DagbuildError, Result};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [build]
/// workers = 2
/// fail_fast = false
/// task_timeout = "30s"
///
/// [workflow]
/// data_dir = "data"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub workflow: WorkflowSection,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Maximum number of tasks evaluated concurrently. Must be >= 1.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Stop dispatching new tasks after the first failure.
    #[serde(default)]
    pub fail_fast: bool,

    /// Duration string (e.g. `"30s"`, `"500ms"`) after which a running task
    /// is marked failed.
    #[serde(default)]
    pub task_timeout: Option<String>,
}

fn default_workers() -> usize {
    1
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            fail_fast: false,
            task_timeout: None,
        }
    }
}

/// `[workflow]` section, used by the bundled demo workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSection {
    /// Directory the demo tasks write their outputs into.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Engine options for a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub workers: usize,
    pub fail_fast: bool,
    pub task_timeout: Option<Duration>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            fail_fast: false,
            task_timeout: None,
        }
    }
}

impl BuildOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(DagbuildError::ConfigError(
                "workers must be >= 1 (got 0)".to_string(),
            ));
        }
        if self.task_timeout == Some(Duration::ZERO) {
            return Err(DagbuildError::ConfigError(
                "task_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validated configuration.
///
/// Construct via `ConfigFile::try_from(RawConfigFile)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub build: BuildOptions,
    pub workflow: WorkflowSection,
}

