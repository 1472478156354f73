// src/project.rs

//! A loaded project: validated config compiled into task specs and
//! pipelines, anchored at a root directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::model::ConfigFile;
use crate::dag::Pipeline;
use crate::engine::TaskName;
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::tasks::styles::browsers_from_targets;
use crate::tasks::{TaskContext, TaskSpec};
use crate::types::ReloadKind;
use crate::watch::{WatchProfile, build_watch_profiles};

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    cfg: ConfigFile,
    specs: BTreeMap<TaskName, Arc<TaskSpec>>,
    pipelines: BTreeMap<String, Pipeline>,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, cfg: ConfigFile) -> Result<Self> {
        let mut specs = BTreeMap::new();
        for (name, task) in cfg.tasks() {
            specs.insert(name.clone(), Arc::new(TaskSpec::from_config(name, task)?));
        }

        let pipelines = cfg
            .pipelines()
            .iter()
            .map(|(name, p)| (name.clone(), Pipeline::from_config(name, p)))
            .collect();

        Ok(Self {
            root: root.into(),
            cfg,
            specs,
            pipelines,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConfigFile {
        &self.cfg
    }

    pub fn specs(&self) -> &BTreeMap<TaskName, Arc<TaskSpec>> {
        &self.specs
    }

    pub fn pipelines(&self) -> &BTreeMap<String, Pipeline> {
        &self.pipelines
    }

    /// Resolve a CLI target: a pipeline name first, then a task name.
    pub fn pipeline_for(&self, target: &str) -> Result<Pipeline> {
        if let Some(p) = self.pipelines.get(target) {
            return Ok(p.clone());
        }
        if self.specs.contains_key(target) {
            return Ok(Pipeline::single_task(target));
        }
        Err(SitepipeError::UnknownTarget(target.to_string()))
    }

    pub fn task_context(&self, fs: Arc<dyn FileSystem>) -> TaskContext {
        TaskContext::new(&self.root, fs, browsers_from_targets(self.cfg.targets()))
    }

    pub fn watch_profiles(&self) -> Result<Vec<WatchProfile>> {
        Ok(build_watch_profiles(&self.cfg)?)
    }

    /// Tasks bound by at least one subscription, sorted.
    pub fn watched_tasks(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cfg.watches().iter().map(|w| w.task.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Reload posted after each watched task succeeds. A task bound by
    /// several subscriptions posts the strongest of their kinds.
    pub fn reload_map(&self) -> BTreeMap<TaskName, ReloadKind> {
        let mut map: BTreeMap<TaskName, ReloadKind> = BTreeMap::new();
        for w in self.cfg.watches() {
            map.entry(w.task.clone())
                .and_modify(|k| *k = (*k).max(w.reload))
                .or_insert(w.reload);
        }
        map
    }
}
