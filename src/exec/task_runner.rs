// src/exec/task_runner.rs

//! Runs a single scheduled task on a blocking worker thread.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::tasks::{self, TaskContext, TaskReport};

/// Execute `task` and report a `TaskCompleted` event to the runtime.
///
/// The task only completes after every write it performs has finished.
pub async fn run_task(
    task: ScheduledTask,
    ctx: TaskContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(
        task = %task.name,
        kind = %task.spec.kind,
        run_id = task.run_id,
        "starting task"
    );
    let started = Instant::now();

    let spec = Arc::clone(&task.spec);
    let result = tokio::task::spawn_blocking(move || tasks::execute(&spec, &ctx)).await;

    let outcome = match result {
        Ok(Ok(report)) => outcome_from_report(&task, &report, started),
        Ok(Err(err)) => {
            error!(
                task = %task.name,
                run_id = task.run_id,
                error = %format!("{err:#}"),
                "task aborted"
            );
            TaskOutcome::Failed(format!("{err:#}"))
        }
        Err(join_err) => {
            error!(task = %task.name, run_id = task.run_id, error = %join_err, "task panicked");
            TaskOutcome::Failed(format!("task panicked: {join_err}"))
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        debug!(task = %task.name, "runtime gone; dropping completion");
    }
}

fn outcome_from_report(task: &ScheduledTask, report: &TaskReport, started: Instant) -> TaskOutcome {
    for failure in &report.failures {
        error!(
            task = %task.name,
            path = %failure.path.display(),
            error = %failure.error,
            "transformation failed; previous output left in place"
        );
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if report.is_clean() {
        info!(
            task = %task.name,
            run_id = task.run_id,
            outputs = report.written.len(),
            elapsed_ms,
            "task finished"
        );
        TaskOutcome::Success
    } else {
        warn!(
            task = %task.name,
            run_id = task.run_id,
            outputs = report.written.len(),
            failed = report.failures.len(),
            elapsed_ms,
            "task finished with errors"
        );
        TaskOutcome::Partial {
            failed_files: report.failures.len(),
        }
    }
}
