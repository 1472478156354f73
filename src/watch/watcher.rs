// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::RuntimeEvent;
use crate::watch::event_handler::{ChangeDetector, process_file_change};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    dirs: Vec<PathBuf>,
}

impl WatcherHandle {
    /// Directories watched recursively.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("dirs", &self.dirs)
            .finish_non_exhaustive()
    }
}

/// Start watching the glob-parent directories of every subscription and
/// forward resulting triggers to the runtime.
pub fn spawn_watcher(
    detector: Arc<ChangeDetector>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let dirs = watch_dirs(detector.as_ref());

    // Bridge from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watch event loop gone; dropping notify event");
                }
            }
            Err(err) => error!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    for (dir, mode) in &dirs {
        watcher
            .watch(dir, *mode)
            .with_context(|| format!("watching {:?}", dir))?;
    }
    info!(dirs = ?dirs, "file watcher started");
    let dirs = dirs.into_iter().map(|(dir, _)| dir).collect();

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in event.paths {
                if !process_file_change(&detector, path, &runtime_tx).await {
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        dirs,
    })
}

/// Absolute directories to watch: each subscription's glob parents, lifted
/// to the nearest existing ancestor below the root, without directories
/// already covered by another entry.
///
/// The project root itself is only ever watched non-recursively: it holds
/// the output directory, and a recursive watch would report every file the
/// build writes.
fn watch_dirs(detector: &ChangeDetector) -> Vec<(PathBuf, RecursiveMode)> {
    let root = detector.root();
    let mut dirs: Vec<PathBuf> = Vec::new();
    let mut top_level = false;

    for rel in detector.profiles().iter().flat_map(|p| p.watch_roots()) {
        let wanted = root.join(&rel);
        match existing_ancestor(root, &wanted) {
            Some(dir) => dirs.push(dir),
            None => {
                if wanted != root {
                    warn!(
                        path = %wanted.display(),
                        "watch directory does not exist; only top-level changes in the project root are seen"
                    );
                }
                top_level = true;
            }
        }
    }
    dirs.sort();
    dirs.dedup();

    let mut kept: Vec<(PathBuf, RecursiveMode)> = Vec::with_capacity(dirs.len() + 1);
    for dir in dirs {
        if !kept.iter().any(|(k, _)| dir.starts_with(k)) {
            kept.push((dir, RecursiveMode::Recursive));
        }
    }
    if top_level {
        kept.push((root.to_path_buf(), RecursiveMode::NonRecursive));
    }
    kept
}

/// Nearest existing directory at or above `dir`, strictly below `root`.
fn existing_ancestor(root: &Path, dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .take_while(|d| d.starts_with(root) && *d != root)
        .find(|d| d.is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RealFileSystem;
    use crate::types::ReloadKind;
    use crate::watch::patterns::WatchProfile;

    #[test]
    fn nested_and_missing_dirs_collapse() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("source/sass/blocks")).unwrap();

        let profiles = vec![
            WatchProfile::new(0, "styles", &["source/sass/**/*.sass".into()], ReloadKind::Css, true)
                .unwrap(),
            WatchProfile::new(1, "html", &["source/*.html".into()], ReloadKind::Full, true).unwrap(),
            WatchProfile::new(2, "scripts", &["source/js/*.js".into()], ReloadKind::Full, true)
                .unwrap(),
        ];
        let detector = ChangeDetector::new(root, Arc::new(RealFileSystem), profiles);

        assert_eq!(
            watch_dirs(&detector),
            vec![(root.join("source"), RecursiveMode::Recursive)]
        );
    }

    #[test]
    fn missing_source_tree_never_watches_the_root_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("build/css")).unwrap();

        let profiles = vec![
            WatchProfile::new(0, "styles", &["source/sass/**/*.sass".into()], ReloadKind::Css, true)
                .unwrap(),
            WatchProfile::new(1, "html", &["*.html".into()], ReloadKind::Full, true).unwrap(),
        ];
        let detector = ChangeDetector::new(root, Arc::new(RealFileSystem), profiles);

        let dirs = watch_dirs(&detector);
        assert_eq!(dirs, vec![(root.to_path_buf(), RecursiveMode::NonRecursive)]);
        assert!(dirs.iter().all(|(d, _)| !d.starts_with(root.join("build"))));
    }

    #[test]
    fn partially_missing_root_lifts_to_existing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("source")).unwrap();

        let profiles = vec![
            WatchProfile::new(0, "scripts", &["source/js/**/*.js".into()], ReloadKind::Full, true)
                .unwrap(),
        ];
        let detector = ChangeDetector::new(root, Arc::new(RealFileSystem), profiles);

        assert_eq!(
            watch_dirs(&detector),
            vec![(root.join("source"), RecursiveMode::Recursive)]
        );
    }
}
