// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::dag::{ScheduledTask, Scheduler, TaskRunState};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RunSummary, RuntimeOptions, TaskName, TaskOutcome, TriggerReason};
use crate::types::ReloadKind;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Tell connected browsers to reload.
    Reload(ReloadKind),
    /// The runtime is done (pipeline finished and nothing is queued).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a task trigger event.
///
/// - Scheduler idle: start a new run seeded with this trigger plus anything
///   already queued.
/// - Run active and `task` not part of it: merge it into the active run
///   (this is how a pipeline's parallel first step gets seeded).
/// - Run active and `task` already part of it: queue/cancel semantics.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    debug!(task = %task, ?reason, "trigger received");

    if scheduler.is_idle() {
        let mut triggers: BTreeSet<TaskName> = queue.drain_pending().into_iter().collect();
        triggers.insert(task);
        return start_new_run_from_triggers(scheduler, triggers.into_iter().collect());
    }

    let mut commands = Vec::new();
    match scheduler.run_state_of(&task) {
        None => warn!(task = %task, "trigger for unknown task; ignoring"),
        Some(TaskRunState::NotInRun) => {
            let newly_ready = scheduler.handle_trigger(&task);
            if !newly_ready.is_empty() {
                commands.push(CoreCommand::DispatchTasks(newly_ready));
            }
        }
        Some(_) => queue.record_trigger(&task),
    }

    CoreStep::running(commands)
}

/// Handle a task completion event.
///
/// Applies the `keep_going` policy to the outcome, updates the summary and
/// emits a reload for tasks with a reload subscription that fully succeeded.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    reloads: &BTreeMap<TaskName, ReloadKind>,
    summary: &mut RunSummary,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let outcome = outcome.with_policy(options.keep_going);
    let mut commands = Vec::new();

    let step = scheduler.step_completion(&task, &outcome);
    summary.forget(&task);
    for blocked in &step.newly_failed {
        summary.forget(blocked);
    }
    match &outcome {
        TaskOutcome::Success => summary.succeeded.push(task.clone()),
        TaskOutcome::Partial { .. } => summary.partial.push(task.clone()),
        TaskOutcome::Failed(_) => {}
    }
    summary.failed.extend(step.newly_failed.iter().cloned());

    if outcome == TaskOutcome::Success {
        if let Some(kind) = reloads.get(&task) {
            commands.push(CoreCommand::Reload(*kind));
        }
    }
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }
    if step.run_just_finished {
        info!(
            succeeded = summary.succeeded.len(),
            partial = summary.partial.len(),
            failed = summary.failed.len(),
            "run finished"
        );
    }

    commands.extend(maybe_start_queued_run(scheduler, queue));

    let mut keep_running = true;
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

/// Seed a new run from a set of triggers. Unknown task names are dropped.
pub fn start_new_run_from_triggers(scheduler: &mut Scheduler, triggers: Vec<TaskName>) -> CoreStep {
    let known: Vec<TaskName> = triggers
        .into_iter()
        .filter(|t| {
            let known = scheduler.run_state_of(t).is_some();
            if !known {
                warn!(task = %t, "trigger for unknown task; ignoring");
            }
            known
        })
        .collect();

    if known.is_empty() {
        return CoreStep::running(Vec::new());
    }

    scheduler.start_new_run();

    let mut all_ready = Vec::new();
    for task in known {
        all_ready.extend(scheduler.handle_trigger(&task));
    }

    let mut commands = Vec::new();
    if !all_ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(all_ready));
    }
    CoreStep::running(commands)
}

/// If the scheduler is idle and there are queued triggers, start a new run.
fn maybe_start_queued_run(scheduler: &mut Scheduler, queue: &mut TriggerQueue) -> Vec<CoreCommand> {
    if !scheduler.is_idle() {
        return Vec::new();
    }
    let triggers = queue.drain_pending();
    if triggers.is_empty() {
        return Vec::new();
    }
    start_new_run_from_triggers(scheduler, triggers).commands
}
