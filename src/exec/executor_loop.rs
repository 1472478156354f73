// src/exec/executor_loop.rs

//! Main executor loop.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::tasks::TaskContext;

/// Spawn the background executor loop.
///
/// The returned sender is what [`RealExecutorBackend`](super::RealExecutorBackend)
/// forwards scheduled tasks to. Each task runs in its own Tokio task, and
/// **per task name at most one instance runs at a time**: when a task is
/// scheduled while its previous instance is still running, the new instance
/// waits for the previous one to finish before it starts.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    ctx: TaskContext,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        debug!("executor loop started");

        let mut active: HashMap<String, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            handle_scheduled_task(task, &mut active, &runtime_tx, &ctx);
        }

        debug!("executor loop finished (channel closed)");
    });

    tx
}

fn handle_scheduled_task(
    task: ScheduledTask,
    active: &mut HashMap<String, JoinHandle<()>>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    ctx: &TaskContext,
) {
    let name = task.name.clone();
    let previous = active.remove(&name).filter(|h| !h.is_finished());

    if previous.is_some() {
        info!(
            task = %name,
            run_id = task.run_id,
            "previous instance still running; new instance will start after it"
        );
    }

    let rt_tx = runtime_tx.clone();
    let ctx = ctx.clone();
    let handle = tokio::spawn(async move {
        if let Some(previous) = previous {
            // A panic in the previous instance was already reported by it.
            let _ = previous.await;
        }
        run_task(task, ctx, rt_tx).await;
    });

    active.insert(name, handle);
}
