// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod project;
pub mod server;
pub mod tasks;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::default_config_path;
use crate::config::model::ConfigFile;
use crate::config::{load_and_validate, load_builtin};
use crate::dag::{Pipeline, Scheduler};
use crate::engine::{
    CoreRuntime, RunSummary, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
};
use crate::errors::SitepipeError;
use crate::exec::{ExecutorBackend, RealExecutorBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::project::Project;
use crate::tasks::TaskContext;
use crate::tasks::plan::{check_isolation, planned_outputs};
use crate::types::ReloadKind;
use crate::watch::{ChangeDetector, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and target resolution
/// - output planning
/// - the initial pipeline run (scheduler / queue / runtime / executor)
/// - (optional) dev server and file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let (root, cfg) = resolve_config(args.config.as_deref())?;
    let project = Project::new(root, cfg)?;
    let pipeline = project.pipeline_for(&args.target)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let ctx = project.task_context(fs);
    check_isolation(&pipeline, project.specs(), &ctx)?;

    if args.dry_run {
        print_dry_run(&project, &pipeline, &ctx)?;
        return Ok(());
    }

    info!(pipeline = %pipeline, root = %project.root().display(), "starting");
    let summary = run_pipeline(&project, &pipeline, ctx.clone()).await?;

    if let Err(err) = check_summary(&pipeline, &summary) {
        let resident = pipeline.serve || pipeline.watch;
        if !resident || matches!(err, SitepipeError::Interrupted(_)) {
            return Err(err.into());
        }
        error!(error = %err, "initial run failed; continuing with stale outputs");
    } else {
        info!(pipeline = %pipeline.name, tasks = summary.succeeded.len(), "pipeline finished");
    }

    if !pipeline.serve && !pipeline.watch {
        return Ok(());
    }

    let (reload_tx, _) = broadcast::channel::<ReloadKind>(16);
    let server = if pipeline.serve {
        Some(server::start(project.root(), project.config().server(), reload_tx.clone()).await?)
    } else {
        None
    };

    if pipeline.watch {
        watch_forever(&project, ctx, Some(reload_tx)).await?;
    } else {
        tokio::signal::ctrl_c()
            .await
            .context("listening for Ctrl+C")?;
    }

    if let Some(server) = server {
        server.shutdown();
    }
    info!("bye");
    Ok(())
}

/// Run `pipeline` once with the production executor.
pub async fn run_pipeline(
    project: &Project,
    pipeline: &Pipeline,
    ctx: TaskContext,
) -> errors::Result<RunSummary> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(rt_tx.clone(), ctx);
    let ctrl_c = spawn_ctrl_c(rt_tx.clone());

    let summary = run_pipeline_with(project, pipeline, executor, rt_tx, rt_rx).await;
    ctrl_c.abort();
    summary
}

/// Run `pipeline` once with any executor backend. `rt_tx` must be the
/// sender half of `rt_rx`, as handed to the executor.
pub async fn run_pipeline_with<E: ExecutorBackend>(
    project: &Project,
    pipeline: &Pipeline,
    executor: E,
    rt_tx: mpsc::Sender<RuntimeEvent>,
    rt_rx: mpsc::Receiver<RuntimeEvent>,
) -> errors::Result<RunSummary> {
    let scheduler = Scheduler::for_pipeline(pipeline, project.specs());
    let section = project.config().config_section();
    let options = RuntimeOptions {
        exit_when_idle: true,
        keep_going: pipeline.keep_going,
    };
    let core = CoreRuntime::new(
        scheduler,
        section.triggered_while_running_behaviour,
        options,
    );

    info!(roots = ?pipeline.roots(), "seeding pipeline roots");
    for task in pipeline.roots() {
        rt_tx
            .send(RuntimeEvent::TaskTriggered {
                task: task.clone(),
                reason: TriggerReason::Manual,
            })
            .await
            .map_err(anyhow::Error::from)?;
    }
    drop(rt_tx);

    Runtime::new(core, rt_rx, executor).run().await
}

/// Map a finished pipeline run to the process result.
pub fn check_summary(pipeline: &Pipeline, summary: &RunSummary) -> errors::Result<()> {
    if summary.interrupted {
        return Err(SitepipeError::Interrupted(pipeline.name.clone()));
    }
    if !summary.failed.is_empty() {
        return Err(SitepipeError::PipelineFailed {
            pipeline: pipeline.name.clone(),
            failed: summary.failed.clone(),
        });
    }
    if !summary.partial.is_empty() {
        warn!(tasks = ?summary.partial, "some files failed to transform");
    }
    Ok(())
}

/// Watch mode: re-run subscribed tasks on change until Ctrl-C.
pub async fn watch_forever(
    project: &Project,
    ctx: TaskContext,
    reload_tx: Option<broadcast::Sender<ReloadKind>>,
) -> errors::Result<RunSummary> {
    let watched = project.watched_tasks();
    if watched.is_empty() {
        warn!("no [[watch]] subscriptions; waiting for Ctrl+C");
    }

    let core = watch_core(project);

    let detector = Arc::new(ChangeDetector::new(
        project.root(),
        Arc::clone(&ctx.fs),
        project.watch_profiles()?,
    ));
    {
        let detector = Arc::clone(&detector);
        tokio::task::spawn_blocking(move || detector.prime())
            .await
            .map_err(anyhow::Error::from)?;
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let watcher = spawn_watcher(detector, rt_tx.clone())?;
    let executor = RealExecutorBackend::new(rt_tx.clone(), ctx);
    let ctrl_c = spawn_ctrl_c(rt_tx);

    let mut runtime = Runtime::new(core, rt_rx, executor);
    if let Some(tx) = reload_tx {
        runtime = runtime.with_reload_sender(tx);
    }
    info!(tasks = ?watched, dirs = watcher.dirs().len(), "watching for changes");
    let summary = runtime.run().await;
    ctrl_c.abort();
    summary
}

/// Core runtime for watch mode: every watched task on its own, per-file
/// errors reported but not fatal, reloads posted after successful re-runs.
pub fn watch_core(project: &Project) -> CoreRuntime {
    let scheduler = Scheduler::for_watch(project.watched_tasks(), project.specs());
    let section = project.config().config_section();
    let options = RuntimeOptions {
        exit_when_idle: false,
        keep_going: true,
    };
    CoreRuntime::new(
        scheduler,
        section.triggered_while_running_behaviour,
        options,
    )
    .with_reloads(project.reload_map())
}

/// Ctrl-C → graceful shutdown of the runtime fed by `tx`.
fn spawn_ctrl_c(tx: mpsc::Sender<RuntimeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    })
}

/// Pick the project file and root directory.
///
/// - `--config PATH`: that file; root is its directory.
/// - `Sitepipe.toml` in the working directory, if present.
/// - Otherwise the built-in `source/` → `build/` layout, rooted at the
///   working directory.
fn resolve_config(explicit: Option<&str>) -> Result<(PathBuf, ConfigFile)> {
    if let Some(path) = explicit {
        let path = PathBuf::from(path);
        let cfg = load_and_validate(&path)
            .with_context(|| format!("loading project file {}", path.display()))?;
        return Ok((config_root_dir(&path), cfg));
    }

    let cwd = std::env::current_dir().context("resolving working directory")?;
    let candidate = cwd.join(default_config_path());
    if candidate.is_file() {
        debug!(path = %candidate.display(), "using project file");
        let cfg = load_and_validate(&candidate)
            .with_context(|| format!("loading project file {}", candidate.display()))?;
        return Ok((cwd, cfg));
    }

    info!("no Sitepipe.toml found; using the built-in project layout");
    Ok((cwd, load_builtin()?))
}

/// Directory containing the project file; the working directory for a
/// bare file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the resolved pipeline, its tasks and the files they would write.
fn print_dry_run(project: &Project, pipeline: &Pipeline, ctx: &TaskContext) -> Result<()> {
    println!("sitepipe dry-run");
    println!("  root = {}", project.root().display());
    println!("  {pipeline}");
    println!();

    let mut names: Vec<&str> = pipeline.task_names().collect();
    names.sort_unstable();
    names.dedup();

    println!("tasks ({}):", names.len());
    for name in names {
        let Some(spec) = project.specs().get(name) else {
            continue;
        };
        println!("  - {name} ({})", spec.kind);
        if !spec.src.is_empty() {
            println!("      src: {:?}", spec.src);
        }
        if !spec.exclude.is_empty() {
            println!("      exclude: {:?}", spec.exclude);
        }
        println!("      dest: {}", spec.dest.display());
        if let Some(ref rename) = spec.rename {
            println!("      rename: {rename}");
        }
        for out in planned_outputs(spec, ctx)? {
            println!("      -> {}", out.display());
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
