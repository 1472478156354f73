// src/tasks/mod.rs

//! Task kinds and their execution.
//!
//! A task is a declarative [`TaskSpec`]: match inputs, apply one
//! transformation per file, write outputs below `dest`. Execution is
//! synchronous; the executor runs it on a blocking worker thread.
//!
//! Two classes of errors are distinguished:
//! - per-file [`TransformError`]s are collected into the [`TaskReport`], the
//!   file's output is not written and the remaining files proceed;
//! - filesystem errors abort the task (`Err` from [`execute`]).

pub mod error;
pub mod html;
pub mod images;
pub mod matcher;
pub mod plan;
pub mod sass;
pub mod scripts;
pub mod spec;
pub mod sprite;
pub mod styles;
pub mod svg;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use lightningcss::targets::Browsers;
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::types::TaskKind;

pub use error::{FileFailure, TransformError};
pub use matcher::{FileMatcher, MatchedFile};
pub use spec::TaskSpec;

/// Everything a task needs besides its own spec.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Project root; all spec paths are relative to it.
    pub root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    /// CSS targets from `[targets]`.
    pub browsers: Browsers,
}

impl TaskContext {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, browsers: Browsers) -> Self {
        Self {
            root: root.into(),
            fs,
            browsers,
        }
    }

    pub fn abs(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }
}

/// Result of one task invocation that was not aborted.
#[derive(Debug, Default)]
pub struct TaskReport {
    /// Root-relative paths written.
    pub written: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl TaskReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: &Path, error: TransformError) {
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            error,
        });
    }
}

/// Run `spec` once.
pub fn execute(spec: &TaskSpec, ctx: &TaskContext) -> Result<TaskReport> {
    match spec.kind {
        TaskKind::Clean => clean(spec, ctx),
        TaskKind::Copy => copy(spec, ctx),
        TaskKind::Sprite => sprite(spec, ctx),
        TaskKind::Styles => transform_each(spec, ctx, |file, bytes| {
            styles::compile_entry(ctx.fs.as_ref(), &file.path, &bytes, ctx.browsers)
        }),
        TaskKind::Html => transform_each(spec, ctx, |_, bytes| Ok(html::minify_html(&bytes))),
        TaskKind::Scripts => transform_each(spec, ctx, |_, bytes| scripts::minify_script(&bytes)),
        TaskKind::OptimizeImages => transform_each(spec, ctx, |_, bytes| images::optimize(&bytes)),
        TaskKind::Webp => transform_each(spec, ctx, |_, bytes| images::to_webp(&bytes)),
        TaskKind::Svg => transform_each(spec, ctx, |_, bytes| {
            let text = String::from_utf8(bytes)?;
            svg::optimize(&text).map(String::into_bytes)
        }),
    }
}

/// Inputs the task reads this invocation.
pub fn inputs(spec: &TaskSpec, ctx: &TaskContext) -> Result<Vec<MatchedFile>> {
    let files = spec.matcher().collect(ctx.fs.as_ref(), &ctx.root)?;
    Ok(match spec.kind {
        TaskKind::Styles => files
            .into_iter()
            .filter(|f| !styles::is_partial(&f.path))
            .collect(),
        _ => files,
    })
}

fn transform_each<F>(spec: &TaskSpec, ctx: &TaskContext, transform: F) -> Result<TaskReport>
where
    F: Fn(&MatchedFile, Vec<u8>) -> std::result::Result<Vec<u8>, TransformError>,
{
    let files = inputs(spec, ctx)?;
    if files.is_empty() {
        warn!(task = %spec.name, "no input files matched");
    }

    let mut report = TaskReport::default();
    for file in &files {
        let bytes = ctx.fs.read(&file.path)?;
        match transform(file, bytes) {
            Ok(output) => {
                let out = spec.output_path(&file.relative);
                ctx.fs.write(&ctx.abs(&out), &output)?;
                debug!(task = %spec.name, path = %out.display(), "wrote output");
                report.written.push(out);
            }
            Err(error) => report.fail(&file.path, error),
        }
    }
    Ok(report)
}

fn copy(spec: &TaskSpec, ctx: &TaskContext) -> Result<TaskReport> {
    let mut report = TaskReport::default();
    for file in inputs(spec, ctx)? {
        let out = spec.output_path(&file.relative);
        ctx.fs.copy(&file.path, &ctx.abs(&out))?;
        report.written.push(out);
    }
    Ok(report)
}

fn clean(spec: &TaskSpec, ctx: &TaskContext) -> Result<TaskReport> {
    let target = ctx.abs(&spec.dest);
    if ctx.fs.remove_dir_all(&target)? {
        info!(task = %spec.name, path = %spec.dest.display(), "removed output directory");
    } else {
        debug!(task = %spec.name, path = %spec.dest.display(), "nothing to clean");
    }
    Ok(TaskReport::default())
}

fn sprite(spec: &TaskSpec, ctx: &TaskContext) -> Result<TaskReport> {
    let files = inputs(spec, ctx)?;
    let mut report = TaskReport::default();
    if files.is_empty() {
        warn!(task = %spec.name, "no icons matched; sprite not written");
        return Ok(report);
    }

    let mut symbols = Vec::with_capacity(files.len());
    let mut ids: Vec<(String, PathBuf)> = Vec::new();
    for file in &files {
        let id = file
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some((_, first)) = ids.iter().find(|(seen, _)| *seen == id) {
            report.fail(
                &file.path,
                TransformError::Sprite(format!(
                    "symbol id '{id}' already used by {}",
                    first.display()
                )),
            );
            continue;
        }
        ids.push((id.clone(), file.path.clone()));

        let bytes = ctx.fs.read(&file.path)?;
        let parsed = String::from_utf8(bytes)
            .map_err(TransformError::from)
            .and_then(|text| sprite::symbol_from_svg(&id, &text));
        match parsed {
            Ok(symbol) => symbols.push(symbol),
            Err(error) => report.fail(&file.path, error),
        }
    }

    if !report.is_clean() {
        warn!(
            task = %spec.name,
            failed = report.failures.len(),
            "sprite not written because some icons failed"
        );
        return Ok(report);
    }

    let out = spec.sprite_path();
    match sprite::assemble(&symbols) {
        Ok(bytes) => {
            ctx.fs.write(&ctx.abs(&out), &bytes)?;
            debug!(task = %spec.name, path = %out.display(), symbols = symbols.len(), "wrote sprite");
            report.written.push(out);
        }
        Err(error) => report.fail(&spec.dest, error),
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::TaskConfig;
    use crate::fs::mock::MockFileSystem;

    fn ctx(fs: &MockFileSystem) -> TaskContext {
        TaskContext::new("/proj", Arc::new(fs.clone()), Browsers::default())
    }

    fn spec(name: &str, kind: TaskKind, src: &[&str], dest: &str, rename: Option<&str>) -> TaskSpec {
        TaskSpec::from_config(
            name,
            &TaskConfig {
                kind,
                src: src.iter().map(|s| s.to_string()).collect(),
                exclude: Vec::new(),
                base: None,
                dest: dest.to_string(),
                rename: rename.map(str::to_string),
            },
        )
        .unwrap()
    }

    #[test]
    fn clean_of_missing_directory_succeeds() {
        let fs = MockFileSystem::new();
        let report = execute(&spec("clean", TaskKind::Clean, &[], "build", None), &ctx(&fs)).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn copy_preserves_structure_below_glob_parent() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/img/a.png", "A");
        fs.add_file("/proj/source/img/deep/b.jpg", "B");

        let report = execute(
            &spec("copy_images", TaskKind::Copy, &["source/img/**/*.{jpg,png}"], "build/img", None),
            &ctx(&fs),
        )
        .unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(fs.read(Path::new("/proj/build/img/deep/b.jpg")).unwrap(), b"B");
    }

    #[test]
    fn failing_script_leaves_stale_output_and_others_proceed() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/js/bad.js", "function (");
        fs.add_file("/proj/source/js/good.js", "let answer = 40 + 2;\nconsole.log(answer);\n");
        fs.add_file("/proj/build/js/bad.js", "stale");

        let report = execute(
            &spec("scripts", TaskKind::Scripts, &["source/js/*.js"], "build/js", None),
            &ctx(&fs),
        )
        .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, PathBuf::from("/proj/source/js/bad.js"));
        assert_eq!(report.written, vec![PathBuf::from("build/js/good.js")]);
        assert_eq!(fs.read(Path::new("/proj/build/js/bad.js")).unwrap(), b"stale");
    }

    #[test]
    fn styles_skip_partials_and_apply_rename() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/sass/_vars.sass", "$c: #000\n");
        fs.add_file("/proj/source/sass/style.sass", "@import vars\nbody\n  color: $c\n");

        let report = execute(
            &spec("styles", TaskKind::Styles, &["source/sass/*.sass"], "build/css", Some("style.min.css")),
            &ctx(&fs),
        )
        .unwrap();

        assert!(report.is_clean(), "{:?}", report.failures);
        assert_eq!(report.written, vec![PathBuf::from("build/css/style.min.css")]);
        let css = fs.read_to_string(Path::new("/proj/build/css/style.min.css")).unwrap();
        assert_eq!(css, "body{color:#000}");
    }

    #[test]
    fn sprite_collects_icons_in_sorted_order() {
        let fs = MockFileSystem::new();
        let icon = |d: &str| format!(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="{d}"/></svg>"#);
        fs.add_file("/proj/source/img/svg/icons/plus.svg", icon("M0 0L1 1"));
        fs.add_file("/proj/source/img/svg/icons/minus.svg", icon("M0 0L2 2"));

        let report = execute(
            &spec("sprite", TaskKind::Sprite, &["source/img/svg/icons/*.svg"], "build/img/svg", None),
            &ctx(&fs),
        )
        .unwrap();
        assert!(report.is_clean());

        let sprite = fs.read_to_string(Path::new("/proj/build/img/svg/sprite.svg")).unwrap();
        let minus = sprite.find(r#"id="minus""#).unwrap();
        let plus = sprite.find(r#"id="plus""#).unwrap();
        assert!(minus < plus);
        assert_eq!(sprite.matches("<symbol").count(), 2);
    }

    #[test]
    fn broken_icon_prevents_sprite_write() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/icons/ok.svg", "<svg viewBox=\"0 0 1 1\"/>");
        fs.add_file("/proj/source/icons/broken.svg", "<svg><g></svg>");

        let report = execute(
            &spec("sprite", TaskKind::Sprite, &["source/icons/*.svg"], "build", None),
            &ctx(&fs),
        )
        .unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(!fs.exists(Path::new("/proj/build/sprite.svg")));
    }
}
