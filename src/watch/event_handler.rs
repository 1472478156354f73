// src/watch/event_handler.rs

//! Turning filesystem change events into task triggers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};
use crate::fs::FileSystem;
use crate::watch::cache::FileCache;
use crate::watch::hash::{HashStore, MemoryHashStore, compute_aggregate_hash};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchProfile;

/// Maps changed paths to the tasks that have to re-run.
///
/// Subscriptions with `use_hash` only fire when the aggregated content of
/// their files differs from the last time they fired (or from the state
/// recorded by [`ChangeDetector::prime`]).
#[derive(Debug)]
pub struct ChangeDetector {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    profiles: Vec<WatchProfile>,
    hashes: Mutex<MemoryHashStore>,
    cache: Mutex<FileCache>,
}

impl ChangeDetector {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, profiles: Vec<WatchProfile>) -> Self {
        Self {
            root: root.into(),
            fs,
            profiles,
            hashes: Mutex::new(MemoryHashStore::new()),
            cache: Mutex::new(FileCache::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profiles(&self) -> &[WatchProfile] {
        &self.profiles
    }

    /// Record the current content of every hashed subscription, so that the
    /// first event after startup only fires on a real change.
    pub fn prime(&self) {
        for profile in self.profiles.iter().filter(|p| p.use_hash()) {
            match self.aggregate(profile) {
                Ok(hash) => self.store().save(&profile.hash_key(), &hash),
                Err(err) => warn!(
                    task = %profile.task(),
                    error = %format!("{err:#}"),
                    "failed to hash watched files"
                ),
            }
        }
    }

    /// Tasks to trigger for a change of the absolute `path`, deduplicated,
    /// in subscription order.
    pub fn tasks_for_change(&self, path: &Path) -> Vec<TaskName> {
        let Some(rel) = relative_str(&self.root, path) else {
            debug!(path = %path.display(), "change outside project root");
            return Vec::new();
        };

        let matching: Vec<&WatchProfile> =
            self.profiles.iter().filter(|p| p.matches(&rel)).collect();
        if matching.is_empty() {
            return Vec::new();
        }

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .invalidate(path);

        let mut tasks: Vec<TaskName> = Vec::new();
        for profile in matching {
            // Evaluated for every subscription so each stored hash stays current.
            let fire = self.content_changed(profile, &rel);
            if fire && !tasks.iter().any(|t| t == profile.task()) {
                tasks.push(profile.task().to_string());
            }
        }
        tasks
    }

    fn content_changed(&self, profile: &WatchProfile, rel: &str) -> bool {
        if !profile.use_hash() {
            return true;
        }

        let new_hash = match self.aggregate(profile) {
            Ok(h) => h,
            Err(err) => {
                warn!(
                    task = %profile.task(),
                    error = %format!("{err:#}"),
                    "failed to hash watched files; triggering anyway"
                );
                return true;
            }
        };

        let key = profile.hash_key();
        let mut store = self.store();
        if store.load(&key).as_deref() == Some(new_hash.as_str()) {
            info!(
                task = %profile.task(),
                path = %rel,
                "watched content unchanged; skipping trigger"
            );
            return false;
        }
        store.save(&key, &new_hash);
        true
    }

    fn aggregate(&self, profile: &WatchProfile) -> Result<String> {
        let files = profile.watched_files(self.fs.as_ref(), &self.root)?;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let hash = cache.get_or_compute(self.fs.as_ref(), &file)?;
            let rel = relative_str(&self.root, &file).unwrap_or_else(|| file.display().to_string());
            entries.push((rel, hash));
        }
        Ok(compute_aggregate_hash(&entries))
    }

    fn store(&self) -> std::sync::MutexGuard<'_, MemoryHashStore> {
        self.hashes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process one changed path and send `TaskTriggered` events for it.
///
/// Returns `false` once the runtime channel is closed.
pub async fn process_file_change(
    detector: &Arc<ChangeDetector>,
    path: PathBuf,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    let worker = Arc::clone(detector);
    let changed = path.clone();
    let tasks = match tokio::task::spawn_blocking(move || worker.tasks_for_change(&changed)).await {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "change detection panicked");
            return true;
        }
    };

    for task in tasks {
        info!(task = %task, path = %path.display(), "watch match; triggering task");
        let event = RuntimeEvent::TaskTriggered {
            task,
            reason: TriggerReason::FileWatch,
        };
        if runtime_tx.send(event).await.is_err() {
            warn!("runtime channel closed; stopping watch dispatch");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::types::ReloadKind;

    fn detector(fs: &MockFileSystem) -> ChangeDetector {
        let html = WatchProfile::new(0, "html", &["source/*.html".to_string()], ReloadKind::Full, true)
            .unwrap();
        let styles = WatchProfile::new(
            1,
            "styles",
            &["source/sass/**/*.sass".to_string()],
            ReloadKind::Css,
            false,
        )
        .unwrap();
        ChangeDetector::new("/proj", Arc::new(fs.clone()), vec![html, styles])
    }

    #[test]
    fn unchanged_content_is_skipped_after_prime() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/index.html", "<p>hi</p>");
        let d = detector(&fs);
        d.prime();

        let path = Path::new("/proj/source/index.html");
        assert!(d.tasks_for_change(path).is_empty());

        fs.add_file("/proj/source/index.html", "<p>changed</p>");
        assert_eq!(d.tasks_for_change(path), vec!["html".to_string()]);
        // Same content again: nothing to do.
        assert!(d.tasks_for_change(path).is_empty());
    }

    #[test]
    fn unhashed_subscription_always_fires_and_others_ignore_path() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/sass/style.sass", "body\n  margin: 0\n");
        let d = detector(&fs);
        d.prime();

        let tasks = d.tasks_for_change(Path::new("/proj/source/sass/style.sass"));
        assert_eq!(tasks, vec!["styles".to_string()]);
        assert!(d.tasks_for_change(Path::new("/proj/build/index.html")).is_empty());
    }

    #[test]
    fn deleting_a_watched_file_counts_as_change() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/index.html", "<p>a</p>");
        fs.add_file("/proj/source/about.html", "<p>b</p>");
        let d = detector(&fs);
        d.prime();

        fs.remove_dir_all(Path::new("/proj/source")).unwrap();
        fs.add_file("/proj/source/index.html", "<p>a</p>");
        assert_eq!(
            d.tasks_for_change(Path::new("/proj/source/about.html")),
            vec!["html".to_string()]
        );
    }

    #[tokio::test]
    async fn process_file_change_sends_file_watch_triggers() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/sass/style.sass", "body\n  margin: 0\n");
        let d = Arc::new(detector(&fs));
        let (tx, mut rx) = mpsc::channel(4);

        assert!(process_file_change(&d, PathBuf::from("/proj/source/sass/style.sass"), &tx).await);
        match rx.recv().await {
            Some(RuntimeEvent::TaskTriggered { task, reason }) => {
                assert_eq!(task, "styles");
                assert_eq!(reason, TriggerReason::FileWatch);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
