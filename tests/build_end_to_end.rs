// tests/build_end_to_end.rs

mod common;
use crate::common::{builtin_project, init_tracing, real_ctx, with_timeout};

use std::fs;
use std::path::Path;

use sitepipe::errors::SitepipeError;
use sitepipe::tasks::plan::check_isolation;
use sitepipe::{check_summary, run_pipeline};
use sitepipe_test_utils::fixtures::{tree_hash, write_file, write_sample_project};

async fn run_target(root: &Path, target: &str) -> sitepipe::engine::RunSummary {
    let project = builtin_project(root);
    let pipeline = project.pipeline_for(target).unwrap();
    let ctx = real_ctx(&project);
    check_isolation(&pipeline, project.specs(), &ctx).unwrap();
    with_timeout(run_pipeline(&project, &pipeline, ctx)).await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn build_writes_every_output() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_sample_project(root);

    let summary = run_target(root, "build").await;
    assert!(summary.is_success(), "{summary:?}");

    for rel in [
        "build/css/style.min.css",
        "build/index.html",
        "build/js/main.js",
        "build/fonts/body.woff2",
        "build/favicon.ico",
        "build/manifest.webmanifest",
        "build/img/hero.png",
        "build/img/hero.webp",
        "build/img/photos/beach.jpg",
        "build/img/photos/beach.webp",
        "build/img/svg/logo.svg",
        "build/img/svg/sprite.svg",
    ] {
        assert!(root.join(rel).is_file(), "missing {rel}");
    }

    let css = fs::read_to_string(root.join("build/css/style.min.css")).unwrap();
    assert!(css.contains("body{"), "{css}");
    assert!(css.contains("user-select:none"), "{css}");
    assert!(!css.contains('\n'));

    let html = fs::read_to_string(root.join("build/index.html")).unwrap();
    assert!(html.len() < sitepipe_test_utils::fixtures::INDEX_HTML.len());
    assert!(!html.contains("\n    "));

    let logo = fs::read_to_string(root.join("build/img/svg/logo.svg")).unwrap();
    assert!(!logo.contains("metadata"));

    // Sources are never touched.
    assert!(root.join("source/img/svg/icons/plus.svg").is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn build_twice_yields_identical_tree() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_sample_project(root);

    assert!(run_target(root, "build").await.is_success());
    let first = tree_hash(&root.join("build"));

    // A stale file from an earlier layout must not survive the clean step.
    write_file(root, "build/old/leftover.txt", "stale");

    assert!(run_target(root, "build").await.is_success());
    assert!(!root.join("build/old/leftover.txt").exists());
    assert_eq!(tree_hash(&root.join("build")), first);
}

#[tokio::test(flavor = "multi_thread")]
async fn sprite_holds_one_symbol_per_icon() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_sample_project(root);

    assert!(run_target(root, "sprite").await.is_success());

    let sprite = fs::read_to_string(root.join("build/img/svg/sprite.svg")).unwrap();
    assert_eq!(sprite.matches("<symbol").count(), 2, "{sprite}");
    assert!(sprite.contains(r#"id="plus""#));
    assert!(sprite.contains(r#"id="minus""#));
    assert!(sprite.contains(r#"viewBox="0 0 24 24""#));
}

#[tokio::test(flavor = "multi_thread")]
async fn sass_error_fails_build() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_sample_project(root);
    write_file(root, "source/sass/style.sass", "body\n  color: $missing\n");

    let project = builtin_project(root);
    let pipeline = project.pipeline_for("build").unwrap();
    let summary = run_target(root, "build").await;

    assert_eq!(summary.failed, vec!["styles".to_string()]);
    assert!(!root.join("build/css/style.min.css").exists());
    // Siblings in the same group still ran.
    assert!(root.join("build/index.html").is_file());

    match check_summary(&pipeline, &summary) {
        Err(SitepipeError::PipelineFailed { failed, .. }) => assert_eq!(failed, vec!["styles"]),
        other => panic!("expected PipelineFailed, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn sass_error_is_only_reported_in_dev_pipeline() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_sample_project(root);
    write_file(root, "source/sass/style.sass", "body\n  color: $missing\n");

    let project = builtin_project(root);
    let pipeline = project.pipeline_for("default").unwrap();
    let summary = run_target(root, "default").await;

    assert_eq!(summary.partial, vec!["styles".to_string()]);
    assert!(summary.failed.is_empty());
    check_summary(&pipeline, &summary).unwrap();
    // The step after styles still ran.
    assert!(root.join("build/js/main.js").is_file());
}

#[tokio::test(flavor = "multi_thread")]
async fn clean_without_build_directory_succeeds() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let summary = run_target(dir.path(), "clean").await;
    assert_eq!(summary.succeeded, vec!["clean".to_string()]);
    assert!(!dir.path().join("build").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn conflicting_outputs_are_refused_before_running() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_sample_project(root);
    // `svg` would write build/img/svg/sprite.svg next to the `sprite` task.
    write_file(root, "source/img/svg/sprite.svg", sitepipe_test_utils::fixtures::LOGO_SVG);

    let project = builtin_project(root);
    let pipeline = project.pipeline_for("build").unwrap();
    let err = check_isolation(&pipeline, project.specs(), &real_ctx(&project)).unwrap_err();

    match err {
        SitepipeError::OutputConflict(msg) => {
            assert!(msg.contains("sprite"), "{msg}");
            assert!(msg.contains("build/img/svg/sprite.svg"), "{msg}");
        }
        other => panic!("expected OutputConflict, got {other:?}"),
    }
    assert!(!root.join("build").exists());
}
