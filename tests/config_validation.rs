// tests/config_validation.rs

use sitepipe::config::{ConfigFile, load_from_str};
use sitepipe::errors::SitepipeError;
use sitepipe::types::{ReloadKind, TaskKind};
use sitepipe_test_utils::builders::{ConfigBuilder, clean, parallel, step, task};

fn config_error(builder: ConfigBuilder) -> String {
    match ConfigFile::try_from(builder.raw()) {
        Err(SitepipeError::ConfigError(msg)) => msg,
        Err(other) => panic!("expected ConfigError, got {other:?}"),
        Ok(_) => panic!("expected ConfigError, got a valid config"),
    }
}

fn html() -> sitepipe::config::TaskConfig {
    task(TaskKind::Html, &["source/*.html"], "build")
}

#[test]
fn valid_project_builds() {
    let cfg = ConfigBuilder::new()
        .with_task("clean", clean("build"))
        .with_task("html", html())
        .with_pipeline("build", vec![step("clean"), parallel(&["html"])])
        .with_watch("html", &["source/*.html"], ReloadKind::Full)
        .build();
    assert_eq!(cfg.pipelines()["build"].steps.len(), 2);
}

#[test]
fn unknown_task_in_pipeline_is_rejected() {
    let msg = config_error(
        ConfigBuilder::new()
            .with_task("html", html())
            .with_pipeline("build", vec![step("html"), step("styles")]),
    );
    assert!(msg.contains("unknown task 'styles'"), "{msg}");
}

#[test]
fn clean_in_parallel_with_writer_is_rejected() {
    let msg = config_error(
        ConfigBuilder::new()
            .with_task("clean", clean("build"))
            .with_task("html", html())
            .with_pipeline("build", vec![parallel(&["clean", "html"])]),
    );
    assert!(msg.contains("in parallel with"), "{msg}");
}

#[test]
fn clean_after_writer_is_rejected() {
    let msg = config_error(
        ConfigBuilder::new()
            .with_task("clean", clean("build/css"))
            .with_task("styles", task(TaskKind::Styles, &["source/sass/*.sass"], "build/css"))
            .with_pipeline("build", vec![step("styles"), step("clean")]),
    );
    assert!(msg.contains("before 'clean'"), "{msg}");
}

#[test]
fn clean_of_unrelated_directory_may_follow_writers() {
    ConfigBuilder::new()
        .with_task("clean", clean("tmp"))
        .with_task("html", html())
        .with_pipeline("build", vec![step("html"), step("clean")])
        .build();
}

#[test]
fn duplicate_task_in_pipeline_is_rejected() {
    let msg = config_error(
        ConfigBuilder::new()
            .with_task("html", html())
            .with_pipeline("build", vec![step("html"), step("html")]),
    );
    assert!(msg.contains("more than once"), "{msg}");
}

#[test]
fn escaping_paths_are_rejected() {
    let msg = config_error(
        ConfigBuilder::new().with_task("html", task(TaskKind::Html, &["source/*.html"], "../out")),
    );
    assert!(msg.contains("'..'"), "{msg}");

    let msg = config_error(
        ConfigBuilder::new().with_task("html", task(TaskKind::Html, &["source/*.html"], "/tmp/out")),
    );
    assert!(msg.contains("relative"), "{msg}");
}

#[test]
fn invalid_glob_is_rejected() {
    let msg = config_error(
        ConfigBuilder::new().with_task("html", task(TaskKind::Html, &["source/{a,b.html"], "build")),
    );
    assert!(msg.contains("invalid glob"), "{msg}");
}

#[test]
fn watch_must_target_a_writing_task() {
    let msg = config_error(
        ConfigBuilder::new()
            .with_task("clean", clean("build"))
            .with_watch("clean", &["source/**"], ReloadKind::Full),
    );
    assert!(msg.contains("clean task"), "{msg}");

    let msg = config_error(
        ConfigBuilder::new()
            .with_task("html", html())
            .with_watch("scripts", &["source/js/*.js"], ReloadKind::Full),
    );
    assert!(msg.contains("unknown task"), "{msg}");
}

#[test]
fn bad_browser_target_is_rejected() {
    let raw = load_from_str(
        r#"
[targets]
safari = "fifteen"

[task.html]
kind = "html"
src = ["source/*.html"]
dest = "build"
"#,
    )
    .unwrap();
    match ConfigFile::try_from(raw) {
        Err(SitepipeError::ConfigError(msg)) => assert!(msg.contains("[targets].safari"), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn unknown_kind_fails_to_parse() {
    let err = load_from_str("[task.x]\nkind = \"babel\"\ndest = \"build\"\n").unwrap_err();
    assert!(matches!(err, SitepipeError::TomlError(_)));
}
