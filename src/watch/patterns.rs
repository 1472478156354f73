// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::model::ConfigFile;
use crate::engine::TaskName;
use crate::fs::FileSystem;
use crate::tasks::FileMatcher;
use crate::types::ReloadKind;

/// One compiled `[[watch]]` subscription.
#[derive(Clone)]
pub struct WatchProfile {
    /// Position of the subscription in the project file.
    id: usize,
    task: TaskName,
    reload: ReloadKind,
    use_hash: bool,
    matcher: FileMatcher,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("id", &self.id)
            .field("task", &self.task)
            .field("reload", &self.reload)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    pub fn new(
        id: usize,
        task: impl Into<TaskName>,
        src: &[String],
        reload: ReloadKind,
        use_hash: bool,
    ) -> Result<Self> {
        let task = task.into();
        let matcher = FileMatcher::new(src, &[], None)
            .with_context(|| format!("compiling watch patterns for task '{task}'"))?;
        Ok(Self {
            id,
            task,
            reload,
            use_hash,
            matcher,
        })
    }

    /// Task re-run when this subscription fires.
    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn reload(&self) -> ReloadKind {
        self.reload
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    /// Key under which the subscription's aggregate hash is stored.
    pub fn hash_key(&self) -> String {
        format!("{}#{}", self.task, self.id)
    }

    /// Whether a root-relative path (forward slashes) is watched.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.matches(rel_path)
    }

    /// Root-relative directories holding watched files.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        self.matcher.watch_roots()
    }

    /// All currently existing files of this subscription, sorted.
    pub fn watched_files(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .matcher
            .collect(fs, root)?
            .into_iter()
            .map(|f| f.path)
            .collect())
    }
}

/// Compile every `[[watch]]` entry of the project.
pub fn build_watch_profiles(cfg: &ConfigFile) -> Result<Vec<WatchProfile>> {
    cfg.watches()
        .iter()
        .enumerate()
        .map(|(id, w)| WatchProfile::new(id, w.task.clone(), &w.src, w.reload, w.use_hash))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_builtin;

    #[test]
    fn builtin_subscriptions_bind_styles_and_html() {
        let cfg = load_builtin().unwrap();
        let profiles = build_watch_profiles(&cfg).unwrap();

        let styles = &profiles[0];
        assert_eq!(styles.task(), "styles");
        assert_eq!(styles.reload(), ReloadKind::Css);
        assert!(styles.matches("source/sass/blocks/header.sass"));
        assert!(!styles.matches("source/index.html"));
        assert_eq!(styles.watch_roots(), vec![PathBuf::from("source/sass")]);

        let html = &profiles[1];
        assert_eq!(html.task(), "html");
        assert_eq!(html.hash_key(), "html#1");
        assert!(html.matches("source/index.html"));
        assert!(!html.matches("source/pages/about.html"));
    }
}
