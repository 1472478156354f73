// src/dag/scheduler.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::pipeline::Pipeline;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};
use crate::tasks::TaskSpec;

/// Scheduler holds the immutable DAG plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding when a triggered task is ready (all deps succeeded)
/// - failing dependents when a task fails
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: BTreeMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    /// Build a scheduler over `graph`. Every graph node must have a spec.
    pub fn new(graph: DagGraph, specs: &BTreeMap<TaskName, Arc<TaskSpec>>) -> Self {
        let mut tasks = BTreeMap::new();
        for name in graph.tasks() {
            match specs.get(name) {
                Some(spec) => {
                    let deps = graph.dependencies_of(name);
                    tasks.insert(name.to_string(), TaskInfo::new(Arc::clone(spec), deps));
                }
                None => warn!(task = %name, "no task spec for DAG node; dropping it"),
            }
        }

        Self {
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
        }
    }

    /// Scheduler for one pipeline's steps.
    pub fn for_pipeline(pipeline: &Pipeline, specs: &BTreeMap<TaskName, Arc<TaskSpec>>) -> Self {
        Self::new(DagGraph::from_pipeline(pipeline), specs)
    }

    /// Scheduler for watch mode: the given tasks, without dependencies.
    pub fn for_watch<'a>(
        names: impl IntoIterator<Item = &'a str>,
        specs: &BTreeMap<TaskName, Arc<TaskSpec>>,
    ) -> Self {
        Self::new(DagGraph::independent(names), specs)
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    /// Names of tasks participating in the active run.
    pub fn tasks_in_current_run(&self) -> Vec<TaskName> {
        if self.current_run_id.is_none() {
            return Vec::new();
        }
        self.tasks
            .values()
            .filter(|info| info.run_state.is_some())
            .map(|info| info.name.clone())
            .collect()
    }

    /// Start a new run, resetting per-run state but keeping history.
    pub fn start_new_run(&mut self) {
        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }

        debug!(run_id = self.run_counter, "scheduler: starting new run");
    }

    /// Handle a trigger for a task name.
    pub fn handle_trigger(&mut self, task: &str) -> Vec<ScheduledTask> {
        self.trigger_step_internal(task).newly_scheduled
    }

    /// Handle completion of a task with a concrete outcome.
    pub fn handle_completion(&mut self, task: &str, outcome: &TaskOutcome) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome).newly_scheduled
    }

    /// Manual-step variant of `handle_trigger`.
    pub fn step_trigger(&mut self, task: &str) -> SchedulerStep {
        self.trigger_step_internal(task)
    }

    /// Manual-step variant of `handle_completion`.
    pub fn step_completion(&mut self, task: &str, outcome: &TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    /// Clear `current_run_id` once every task is terminal. Returns `true`
    /// if this call finished the run.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        if manager.all_tasks_terminal() {
            info!(run_id = self.current_run_id, "scheduler: all tasks terminal; run finished");
            self.current_run_id = None;
            true
        } else {
            false
        }
    }

    fn trigger_step_internal(&mut self, task: &str) -> SchedulerStep {
        if !self.tasks.contains_key(task) {
            warn!(task = %task, "trigger for unknown task; ignoring");
            return SchedulerStep::default();
        }

        if self.current_run_id.is_none() {
            self.start_new_run();
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        manager.mark_task_and_dependents_pending(task);
        let newly_scheduled = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    fn completion_step_internal(&mut self, task: &str, outcome: &TaskOutcome) -> SchedulerStep {
        let Some(run_id) = self.current_run_id else {
            warn!(task = %task, "completion with no active run; ignoring");
            return SchedulerStep::default();
        };

        let mut step = SchedulerStep::default();

        let Some(info) = self.tasks.get_mut(task) else {
            warn!(task = %task, "completion for unknown task; ignoring");
            return step;
        };

        if info.run_state != Some(RunState::Running) {
            debug!(task = %task, state = ?info.run_state, "completion for task not running; ignoring");
            return step;
        }

        if outcome.is_failure() {
            info.run_state = Some(RunState::DoneFailed);
            info.last_failed_run = Some(run_id);
            warn!(task = %info.name, run_id, outcome = %outcome, "task failed; blocking dependents");
            step.newly_failed.push(info.name.clone());
            let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
            step.newly_failed.extend(manager.mark_dependents_failed(task));
        } else {
            info.run_state = Some(RunState::DoneSuccess);
            info.last_successful_run = Some(run_id);
            debug!(task = %info.name, run_id, outcome = %outcome, "task completed");
            let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
            step.newly_scheduled = manager.collect_new_ready_tasks();
        }

        step.run_just_finished = self.maybe_finish_run();
        step
    }
}
