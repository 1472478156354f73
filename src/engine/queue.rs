// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use super::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Watch triggers that arrive for a task already part of the active run.
///
/// Pending triggers are a set: saving the same file five times during a run
/// re-runs its task once. When the runtime becomes idle it calls
/// [`TriggerQueue::drain_pending`] and starts one run with everything queued.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    pending: BTreeSet<TaskName>,
}

impl TriggerQueue {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        Self {
            behaviour,
            pending: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Record that `task` was triggered while a run is in progress.
    ///
    /// - `Queue`: add it to the pending set.
    /// - `Cancel`: forget everything queued so far and keep only this task.
    pub fn record_trigger(&mut self, task: &str) {
        if self.behaviour == TriggerWhileRunningBehaviour::Cancel && !self.pending.is_empty() {
            debug!(task = %task, dropped = self.pending.len(), "replacing queued triggers with latest (cancel mode)");
            self.pending.clear();
        }
        let inserted = self.pending.insert(task.to_string());
        debug!(task = %task, inserted, "queued trigger for next run");
    }

    /// Take every queued task name, sorted.
    pub fn drain_pending(&mut self) -> Vec<TaskName> {
        let drained: Vec<TaskName> = std::mem::take(&mut self.pending).into_iter().collect();
        if !drained.is_empty() {
            debug!(drained = drained.len(), "drained queued triggers into new run");
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_mode_coalesces_triggers() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue);
        q.record_trigger("styles");
        q.record_trigger("html");
        q.record_trigger("styles");
        assert_eq!(q.drain_pending(), vec!["html".to_string(), "styles".to_string()]);
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_mode_keeps_only_latest() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Cancel);
        q.record_trigger("styles");
        q.record_trigger("html");
        assert_eq!(q.drain_pending(), vec!["html".to_string()]);
    }

    #[test]
    fn draining_empties_the_queue() {
        let mut q = TriggerQueue::new(TriggerWhileRunningBehaviour::Queue);
        assert!(q.drain_pending().is_empty());
        q.record_trigger("html");
        q.drain_pending();
        assert!(q.is_empty());
        assert!(q.drain_pending().is_empty());
    }
}
