// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::dag::DagGraph;
use crate::engine::TaskName;

/// Whether every dependency of `info` completed successfully.
///
/// Dependencies that are not part of the current run fall back to history:
/// they count as satisfied if they ever succeeded.
fn deps_satisfied(tasks: &BTreeMap<TaskName, TaskInfo>, info: &TaskInfo) -> bool {
    info.deps.iter().all(|dep_name| {
        let Some(dep) = tasks.get(dep_name) else {
            warn!(task = %info.name, dep = %dep_name, "dependency missing from tasks map");
            return false;
        };
        match dep.run_state {
            Some(RunState::DoneSuccess) => true,
            Some(RunState::DoneFailed | RunState::Pending | RunState::Running) => false,
            None => dep.last_successful_run.is_some(),
        }
    })
}

/// Mutating view over the scheduler's task table for one run.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut BTreeMap<TaskName, TaskInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut BTreeMap<TaskName, TaskInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Include a triggered task and all its downstream dependents in this run.
    ///
    /// Tasks not yet part of the run become `Pending`; tasks already in the
    /// run keep their state.
    pub fn mark_task_and_dependents_pending(&mut self, root: &str) {
        let mut stack: Vec<TaskName> = vec![root.to_string()];
        let mut visited: BTreeSet<TaskName> = BTreeSet::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let Some(info) = self.tasks.get_mut(&name) else {
                warn!(task = %name, "node in DAG not present in tasks map");
                continue;
            };
            if info.run_state.is_none() {
                info.run_state = Some(RunState::Pending);
                debug!(task = %info.name, "marked Pending for this run");
            }
            stack.extend(self.graph.dependents_of(&name));
        }
    }

    /// Mark every pending or running transitive dependent of a failed task
    /// as `DoneFailed`.
    ///
    /// Returns the newly failed tasks, excluding `failed_task` itself.
    pub fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task);
        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            let Some(info) = self.tasks.get_mut(&name) else {
                continue;
            };
            if matches!(info.run_state, Some(RunState::Pending | RunState::Running)) {
                info.run_state = Some(RunState::DoneFailed);
                debug!(task = %info.name, upstream = %failed_task, "blocked by upstream failure");
                newly_failed.push(info.name.clone());
                stack.extend(self.graph.dependents_of(&name));
            }
        }

        newly_failed
    }

    /// Mark `Pending` tasks whose dependencies are satisfied as `Running` and
    /// return them, in name order.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let tasks = &*self.tasks;
        let candidates: Vec<TaskName> = tasks
            .values()
            .filter(|info| {
                matches!(info.run_state, Some(RunState::Pending)) && deps_satisfied(tasks, info)
            })
            .map(|info| info.name.clone())
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for name in candidates {
            let Some(info) = self.tasks.get_mut(&name) else {
                continue;
            };
            let is_rerun = info.last_successful_run.is_some() || info.last_failed_run.is_some();
            info!(
                task = %info.name,
                kind = %info.spec.kind,
                run_id = self.current_run_id,
                rerun = is_rerun,
                "dispatching task"
            );
            info.run_state = Some(RunState::Running);
            ready.push(ScheduledTask::from_task_info(
                info,
                self.current_run_id.unwrap_or(0),
            ));
        }

        ready
    }

    /// Whether no task is pending or running.
    pub fn all_tasks_terminal(&self) -> bool {
        !self
            .tasks
            .values()
            .any(|info| matches!(info.run_state, Some(RunState::Pending | RunState::Running)))
    }
}
