// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the trigger queue (watch triggers arriving while a run is active)
//! - the main runtime event loop that reacts to:
//!   - manual and file-watch triggers
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of one task invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Every file was processed.
    Success,
    /// Some files failed to transform; their outputs were left untouched.
    Partial { failed_files: usize },
    /// The task was aborted (filesystem error, panic, or a partial run in a
    /// pipeline without `keep_going`).
    Failed(String),
}

impl TaskOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failed(_))
    }

    /// Apply the pipeline's error policy: without `keep_going`, per-file
    /// failures fail the task.
    pub fn with_policy(self, keep_going: bool) -> Self {
        match self {
            TaskOutcome::Partial { failed_files } if !keep_going => {
                TaskOutcome::Failed(format!("{failed_files} file(s) failed to transform"))
            }
            other => other,
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Success => f.write_str("success"),
            TaskOutcome::Partial { failed_files } => {
                write!(f, "partial ({failed_files} file(s) failed)")
            }
            TaskOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Why a task was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Pipeline roots at startup, or a task run from the command line.
    Manual,
    /// A watched file changed.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Exit once the scheduler is idle and nothing is queued (pipeline runs).
    pub exit_when_idle: bool,
    /// Treat `Partial` outcomes as success.
    pub keep_going: bool,
}

/// Events flowing into the runtime from the watcher, executor and signals.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// What happened during a runtime's lifetime. Each task appears at most once,
/// with its latest result, so a long watch session stays bounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<TaskName>,
    pub partial: Vec<TaskName>,
    /// Failed tasks followed by the dependents they blocked.
    pub failed: Vec<TaskName>,
    /// Shutdown was requested before the runtime went idle.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }

    /// Drop any earlier result recorded for `task`.
    pub fn forget(&mut self, task: &str) {
        for list in [&mut self.succeeded, &mut self.partial, &mut self.failed] {
            list.retain(|t| t != task);
        }
    }
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
