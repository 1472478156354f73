// src/config/validate.rs

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use globset::Glob;

use crate::config::model::{ConfigFile, PipelineConfig, RawConfigFile, TaskConfig};
use crate::errors::{Result, SitepipeError};
use crate::tasks::styles::parse_browser_version;
use crate::types::TaskKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    for (name, task) in cfg.task.iter() {
        validate_task(name, task)?;
    }
    for (name, pipeline) in cfg.pipeline.iter() {
        validate_pipeline_steps(cfg, name, pipeline)?;
        validate_clean_ordering(cfg, name, pipeline)?;
    }
    validate_watches(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> SitepipeError {
    SitepipeError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "config must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    validate_relative_path("[server].base_dir", &cfg.server.base_dir)?;

    for (browser, version) in cfg.targets.entries() {
        if parse_browser_version(version).is_none() {
            return Err(config_error(format!(
                "[targets].{browser} has invalid version '{version}' (expected \"major\" or \"major.minor\")"
            )));
        }
    }

    Ok(())
}

fn validate_task(name: &str, task: &TaskConfig) -> Result<()> {
    let label = format!("task '{name}'");

    validate_relative_path(&format!("{label} dest"), &task.dest)?;
    if let Some(base) = &task.base {
        validate_relative_path(&format!("{label} base"), base)?;
    }

    if task.kind == TaskKind::Clean {
        if normalized(&task.dest).as_os_str().is_empty() {
            return Err(config_error(format!(
                "{label} would clean the project root; point dest at an output directory"
            )));
        }
        return Ok(());
    }

    if !task.src.iter().any(|p| !p.starts_with('!')) {
        return Err(config_error(format!(
            "{label} ({}) needs at least one `src` pattern",
            task.kind
        )));
    }

    for pattern in task.src.iter().chain(task.exclude.iter()) {
        validate_glob(&label, pattern.trim_start_matches('!'))?;
    }

    if let Some(rename) = &task.rename {
        if rename.is_empty() || rename.contains('/') || rename.contains('\\') {
            return Err(config_error(format!(
                "{label} rename must be a plain file name (got '{rename}')"
            )));
        }
    }

    Ok(())
}

fn validate_glob(label: &str, pattern: &str) -> Result<()> {
    Glob::new(pattern)
        .map(|_| ())
        .map_err(|e| config_error(format!("{label} has invalid glob '{pattern}': {e}")))
}

/// Paths in the config are relative to the project root and may not escape it.
fn validate_relative_path(label: &str, path: &str) -> Result<()> {
    let p = Path::new(path);
    if path.trim().is_empty() {
        return Err(config_error(format!("{label} must not be empty")));
    }
    if p.is_absolute() || p.has_root() {
        return Err(config_error(format!(
            "{label} must be relative to the project root (got '{path}')"
        )));
    }
    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(config_error(format!(
            "{label} must not contain '..' (got '{path}')"
        )));
    }
    Ok(())
}

fn validate_pipeline_steps(cfg: &RawConfigFile, name: &str, pipeline: &PipelineConfig) -> Result<()> {
    if pipeline.steps.is_empty() {
        return Err(config_error(format!("pipeline '{name}' has no steps")));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for step in pipeline.steps.iter() {
        if step.tasks().is_empty() {
            return Err(config_error(format!(
                "pipeline '{name}' contains an empty parallel group"
            )));
        }
        for task in step.tasks() {
            if !cfg.task.contains_key(task) {
                return Err(config_error(format!(
                    "pipeline '{name}' references unknown task '{task}'"
                )));
            }
            if !seen.insert(task.as_str()) {
                return Err(config_error(format!(
                    "pipeline '{name}' lists task '{task}' more than once"
                )));
            }
        }
    }
    Ok(())
}

/// A `clean` task must run before every task of the same pipeline that
/// writes into the directory it removes.
fn validate_clean_ordering(cfg: &RawConfigFile, name: &str, pipeline: &PipelineConfig) -> Result<()> {
    for (clean_idx, step) in pipeline.steps.iter().enumerate() {
        for clean_name in step.tasks() {
            let clean = &cfg.task[clean_name];
            if clean.kind != TaskKind::Clean {
                continue;
            }

            for (writer_idx, other_step) in pipeline.steps.iter().enumerate().take(clean_idx + 1) {
                for writer_name in other_step.tasks() {
                    let writer = &cfg.task[writer_name];
                    if !writer.kind.writes_output() || !paths_overlap(&writer.dest, &clean.dest) {
                        continue;
                    }
                    let relation = if writer_idx == clean_idx {
                        "in parallel with"
                    } else {
                        "before"
                    };
                    return Err(config_error(format!(
                        "pipeline '{name}': task '{writer_name}' writes into '{}' {relation} '{clean_name}' cleans '{}'",
                        writer.dest, clean.dest
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_watches(cfg: &RawConfigFile) -> Result<()> {
    for (idx, watch) in cfg.watch.iter().enumerate() {
        let label = format!("[[watch]] #{} (task '{}')", idx + 1, watch.task);
        let Some(task) = cfg.task.get(&watch.task) else {
            return Err(config_error(format!("{label} references an unknown task")));
        };
        if task.kind == TaskKind::Clean {
            return Err(config_error(format!("{label} cannot re-run a clean task")));
        }
        if watch.src.is_empty() {
            return Err(config_error(format!("{label} needs at least one `src` pattern")));
        }
        for pattern in watch.src.iter() {
            validate_glob(&label, pattern.trim_start_matches('!'))?;
        }
    }
    Ok(())
}

/// `a` and `b` overlap when one is an ancestor of (or equal to) the other.
pub(crate) fn paths_overlap(a: &str, b: &str) -> bool {
    let a = normalized(a);
    let b = normalized(b);
    a.starts_with(&b) || b.starts_with(&a)
}

fn normalized(path: &str) -> PathBuf {
    Path::new(path)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
