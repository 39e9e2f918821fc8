// src/dag/mod.rs

//! Dependency graph and scheduling.
//!
//! - [`graph`] builds the deduplicated, acyclic task graph from root tasks.
//! - [`scheduler`] contains the per-build state machine that decides
//!   which tasks are ready and records their outcomes.
//! - [`task_info`] provides execution records and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages status transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::{DagGraph, TaskNode};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use state_manager::Readiness;
pub use task_info::{ScheduledTask, TaskStatus};
