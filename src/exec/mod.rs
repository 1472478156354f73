// src/exec/mod.rs

//! Task execution layer.
//!
//! Runs scheduled tasks on blocking worker threads and reports back to the
//! orchestration runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the loop that serializes instances per task name.
//! - [`task_runner`] runs one task and maps its report to an outcome.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `RealExecutorBackend`, which tests replace with a fake.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
