use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sitepipe::dag::ScheduledTask;
use sitepipe::engine::{RuntimeEvent, TaskOutcome};
use sitepipe::errors::Result;
use sitepipe::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records every dispatch batch, in order
/// - immediately reports `TaskCompleted` with a scripted outcome
///   (`Success` unless configured otherwise).
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    outcomes: HashMap<String, TaskOutcome>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            outcomes: HashMap::new(),
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Report `outcome` whenever `task` runs.
    pub fn with_outcome(mut self, task: &str, outcome: TaskOutcome) -> Self {
        self.outcomes.insert(task.to_string(), outcome);
        self
    }

    /// Shared view of the dispatch batches, usable after the executor moved
    /// into a runtime.
    pub fn batches(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.batches)
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        self.batches
            .lock()
            .unwrap()
            .push(tasks.iter().map(|t| t.name.clone()).collect());
        let completions: Vec<_> = tasks
            .into_iter()
            .map(|t| {
                let outcome = self
                    .outcomes
                    .get(&t.name)
                    .cloned()
                    .unwrap_or(TaskOutcome::Success);
                (t.name, outcome)
            })
            .collect();

        Box::pin(async move {
            for (task, outcome) in completions {
                tx.send(RuntimeEvent::TaskCompleted { task, outcome })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
