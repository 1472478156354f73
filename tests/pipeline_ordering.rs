// tests/pipeline_ordering.rs

mod common;
use crate::common::{builtin_project, init_tracing, with_timeout};

use std::path::Path;

use tokio::sync::mpsc;

use sitepipe::engine::{RunSummary, TaskOutcome};
use sitepipe::errors::SitepipeError;
use sitepipe::{check_summary, run_pipeline_with};
use sitepipe_test_utils::fake_executor::FakeExecutor;

async fn run_builtin(
    pipeline: &str,
    configure: impl FnOnce(FakeExecutor) -> FakeExecutor,
) -> (RunSummary, Vec<Vec<String>>) {
    init_tracing();
    let project = builtin_project(Path::new("/unused"));
    let pipeline = project.pipeline_for(pipeline).unwrap();

    let (rt_tx, rt_rx) = mpsc::channel(64);
    let executor = configure(FakeExecutor::new(rt_tx.clone()));
    let batches = executor.batches();

    let summary = with_timeout(run_pipeline_with(&project, &pipeline, executor, rt_tx, rt_rx))
        .await
        .unwrap();
    let batches = batches.lock().unwrap().clone();
    (summary, batches)
}

fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

#[tokio::test]
async fn build_runs_steps_in_order_with_final_group_together() {
    let (summary, batches) = run_builtin("build", |e| e).await;

    assert!(summary.is_success());
    assert_eq!(batches.len(), 4, "{batches:?}");
    assert_eq!(batches[0], vec!["clean"]);
    assert_eq!(batches[1], vec!["copy"]);
    assert_eq!(batches[2], vec!["optimize_images"]);
    assert_eq!(
        sorted(batches[3].clone()),
        vec!["html", "scripts", "sprite", "styles", "svg", "webp"]
    );
    assert_eq!(summary.succeeded.len(), 9);
}

#[tokio::test]
async fn nothing_is_dispatched_before_clean_completes() {
    let (_, batches) = run_builtin("default", |e| e).await;
    let order: Vec<String> = batches.iter().flatten().cloned().collect();
    assert_eq!(order[0], "clean");
    assert_eq!(batches[0].len(), 1);
    assert_eq!(order.iter().filter(|t| *t == "clean").count(), 1);
}

#[tokio::test]
async fn failure_blocks_every_later_step() {
    let (summary, batches) = run_builtin("build", |e| {
        e.with_outcome("copy", TaskOutcome::Failed("disk full".into()))
    })
    .await;

    assert_eq!(batches, vec![vec!["clean".to_string()], vec!["copy".to_string()]]);
    assert_eq!(summary.failed[0], "copy");
    assert!(summary.failed.contains(&"optimize_images".to_string()));
    assert!(summary.failed.contains(&"styles".to_string()));

    let pipeline = builtin_project(Path::new("/unused")).pipeline_for("build").unwrap();
    match check_summary(&pipeline, &summary) {
        Err(SitepipeError::PipelineFailed { pipeline, failed }) => {
            assert_eq!(pipeline, "build");
            assert!(failed.contains(&"copy".to_string()));
        }
        other => panic!("expected PipelineFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_group_member_lets_siblings_finish() {
    let (summary, batches) = run_builtin("build", |e| {
        e.with_outcome("styles", TaskOutcome::Failed("boom".into()))
    })
    .await;

    assert_eq!(batches.len(), 4);
    assert_eq!(summary.failed, vec!["styles".to_string()]);
    assert!(summary.succeeded.contains(&"html".to_string()));
}

#[tokio::test]
async fn partial_outcome_fails_build_but_not_dev_pipeline() {
    let partial = || TaskOutcome::Partial { failed_files: 1 };

    let (build, _) = run_builtin("build", |e| e.with_outcome("styles", partial())).await;
    assert!(build.failed.contains(&"styles".to_string()));
    assert!(!build.is_success());

    // `default` has keep_going: styles is step 4, the final group still runs.
    let (dev, batches) = run_builtin("default", |e| e.with_outcome("styles", partial())).await;
    assert!(dev.is_success(), "{dev:?}");
    assert_eq!(dev.partial, vec!["styles".to_string()]);
    assert_eq!(batches.len(), 5);
    assert_eq!(
        sorted(batches[4].clone()),
        vec!["html", "scripts", "sprite", "svg", "webp"]
    );
}

#[tokio::test]
async fn single_task_target_runs_alone() {
    let (summary, batches) = run_builtin("styles", |e| e).await;
    assert_eq!(batches, vec![vec!["styles".to_string()]]);
    assert_eq!(summary.succeeded, vec!["styles".to_string()]);
}
