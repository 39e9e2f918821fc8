// src/exec/mod.rs

//! Task evaluation layer.
//!
//! This module is responsible for actually evaluating scheduled tasks
//! (existence checks, `run` calls, postcondition checks) and reporting back
//! to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`task_runner`] holds the synchronous per-task evaluation rules.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `BlockingExecutor` used in production, which tests can replace with a
//!   fake implementation.

pub mod backend;
pub mod task_runner;

pub use backend::{BlockingExecutor, ExecutorBackend};
pub use task_runner::{evaluate, wrapper_outcome, Evaluation};
