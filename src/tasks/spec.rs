// src/tasks/spec.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::model::TaskConfig;
use crate::tasks::matcher::FileMatcher;
use crate::types::TaskKind;

/// File name written by a `sprite` task without `rename`.
pub const DEFAULT_SPRITE_NAME: &str = "sprite.svg";

/// Declarative description of one task, compiled from `[task.<name>]`.
///
/// Holds no state between invocations; the same spec is executed for the
/// initial pipeline run and every watch-triggered re-run.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: String,
    pub kind: TaskKind,
    /// Include patterns (without `!` entries).
    pub src: Vec<String>,
    /// Exclusions, including `!`-prefixed `src` entries.
    pub exclude: Vec<String>,
    pub base: Option<String>,
    pub dest: PathBuf,
    pub rename: Option<String>,
    matcher: FileMatcher,
}

impl TaskSpec {
    pub fn from_config(name: &str, cfg: &TaskConfig) -> Result<Self> {
        let (exclude_from_src, src): (Vec<String>, Vec<String>) =
            cfg.src.iter().cloned().partition(|p| p.starts_with('!'));

        let mut exclude: Vec<String> = exclude_from_src
            .into_iter()
            .map(|p| p.trim_start_matches('!').to_string())
            .collect();
        exclude.extend(cfg.exclude.iter().map(|p| p.trim_start_matches('!').to_string()));

        let matcher = FileMatcher::new(&src, &exclude, cfg.base.as_deref())
            .with_context(|| format!("compiling patterns of task '{name}'"))?;

        Ok(Self {
            name: name.to_string(),
            kind: cfg.kind,
            src,
            exclude,
            base: cfg.base.clone(),
            dest: PathBuf::from(&cfg.dest),
            rename: cfg.rename.clone(),
            matcher,
        })
    }

    pub fn matcher(&self) -> &FileMatcher {
        &self.matcher
    }

    /// Root-relative output path for an input located at `relative` below
    /// the base directory.
    pub fn output_path(&self, relative: &Path) -> PathBuf {
        let mut out = self.dest.join(relative);
        if let Some(ext) = self.kind.output_extension() {
            out.set_extension(ext);
        }
        if let Some(name) = &self.rename {
            out.set_file_name(name);
        }
        out
    }

    /// Root-relative path of the combined sprite file.
    pub fn sprite_path(&self) -> PathBuf {
        self.dest
            .join(self.rename.as_deref().unwrap_or(DEFAULT_SPRITE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(kind: TaskKind, src: &[&str], dest: &str, rename: Option<&str>) -> TaskConfig {
        TaskConfig {
            kind,
            src: src.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            base: None,
            dest: dest.to_string(),
            rename: rename.map(str::to_string),
        }
    }

    #[test]
    fn styles_output_gets_css_extension_then_rename() {
        let plain = TaskSpec::from_config(
            "styles",
            &task(TaskKind::Styles, &["source/sass/*.sass"], "build/css", None),
        )
        .unwrap();
        assert_eq!(
            plain.output_path(Path::new("style.sass")),
            PathBuf::from("build/css/style.css")
        );

        let renamed = TaskSpec::from_config(
            "styles",
            &task(
                TaskKind::Styles,
                &["source/sass/style.sass"],
                "build/css",
                Some("style.min.css"),
            ),
        )
        .unwrap();
        assert_eq!(
            renamed.output_path(Path::new("style.sass")),
            PathBuf::from("build/css/style.min.css")
        );
    }

    #[test]
    fn negated_src_entries_move_to_exclude() {
        let spec = TaskSpec::from_config(
            "svg",
            &task(
                TaskKind::Svg,
                &["source/img/svg/*.svg", "!source/img/svg/icons/*.svg"],
                "build",
                None,
            ),
        )
        .unwrap();
        assert_eq!(spec.src, vec!["source/img/svg/*.svg".to_string()]);
        assert_eq!(spec.exclude, vec!["source/img/svg/icons/*.svg".to_string()]);
    }

    #[test]
    fn sprite_defaults_to_sprite_svg() {
        let spec = TaskSpec::from_config(
            "sprite",
            &task(TaskKind::Sprite, &["source/img/svg/icons/*.svg"], "build/img/svg", None),
        )
        .unwrap();
        assert_eq!(spec.sprite_path(), PathBuf::from("build/img/svg/sprite.svg"));
    }
}
