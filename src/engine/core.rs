// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces an updated state plus a
//! list of commands describing what the IO shell should do next (dispatch
//! tasks, post a reload, exit).
//!
//! The async shell (`engine::runtime::Runtime`) reads channels, sends
//! `ScheduledTask`s to the executor and forwards reloads to the dev server.
//! The core itself is unit tested without Tokio, channels or a filesystem.

use std::collections::BTreeMap;

use tracing::info;

use crate::dag::Scheduler;
use crate::engine::event_handlers::{handle_task_completion, handle_task_trigger, CoreStep};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RunSummary, RuntimeEvent, RuntimeOptions, TaskName};
use crate::types::{ReloadKind, TriggerWhileRunningBehaviour};

/// Pure core runtime state.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
    /// Reload posted after a task fully succeeded.
    reloads: BTreeMap<TaskName, ReloadKind>,
    summary: RunSummary,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: TriggerWhileRunningBehaviour,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            queue: TriggerQueue::new(behaviour),
            options,
            reloads: BTreeMap::new(),
            summary: RunSummary::default(),
        }
    }

    /// Attach reload kinds per task (watch mode).
    pub fn with_reloads(mut self, reloads: BTreeMap<TaskName, ReloadKind>) -> Self {
        self.reloads = reloads;
        self
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    /// Handle a single runtime event, returning the commands for the shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(&mut self.scheduler, &mut self.queue, task, reason)
            }
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                &self.reloads,
                &mut self.summary,
                task,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => {
                if !self.scheduler.is_idle() {
                    info!(
                        running = ?self.scheduler.tasks_in_current_run(),
                        "shutdown requested while a run is active"
                    );
                    self.summary.interrupted = true;
                }
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }
}
