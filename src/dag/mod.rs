// src/dag/mod.rs

//! Pipelines, their DAG lowering and scheduling.
//!
//! - [`pipeline`] holds the validated step structure of a named pipeline.
//! - [`graph`] lowers steps into dependency edges.
//! - [`scheduler`] is the per-run state machine that decides which tasks
//!   are ready and fails the dependents of failed tasks.
//! - [`task_info`] provides task metadata and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod pipeline;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use pipeline::{Pipeline, Step};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskRunState};
