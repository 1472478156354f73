// src/tasks/matcher.rs

//! Glob-based input selection.
//!
//! Patterns are relative to the project root and use `/` as separator. `*`
//! does not cross directory boundaries; `**` does. Output paths are computed
//! relative to a base directory: either the task's explicit `base`, or the
//! glob parent of the pattern that matched.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// One input file selected by a [`FileMatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    /// Absolute path.
    pub path: PathBuf,
    /// Path below the base directory; output paths are built from this.
    pub relative: PathBuf,
}

#[derive(Clone)]
struct IncludePattern {
    source: String,
    parent: String,
    recursive: bool,
    matcher: GlobMatcher,
}

/// Compiled include/exclude patterns of a task or watch subscription.
#[derive(Clone)]
pub struct FileMatcher {
    include: Vec<IncludePattern>,
    exclude: Option<GlobSet>,
    base: Option<PathBuf>,
}

impl fmt::Debug for FileMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileMatcher")
            .field(
                "include",
                &self.include.iter().map(|p| &p.source).collect::<Vec<_>>(),
            )
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

fn compile(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))
}

impl FileMatcher {
    /// Build a matcher. Entries of `src` starting with `!` are treated as
    /// exclusions, in addition to `exclude`.
    pub fn new(src: &[String], exclude: &[String], base: Option<&str>) -> Result<Self> {
        let mut include = Vec::new();
        let mut excludes = GlobSetBuilder::new();
        let mut has_excludes = false;

        for pattern in src {
            if let Some(negated) = pattern.strip_prefix('!') {
                excludes.add(compile(negated)?);
                has_excludes = true;
                continue;
            }
            let parent = glob_parent(pattern);
            let rest = pattern
                .strip_prefix(parent.as_str())
                .unwrap_or(pattern)
                .trim_start_matches('/');
            include.push(IncludePattern {
                source: pattern.clone(),
                recursive: rest.contains('/') || rest.contains("**"),
                matcher: compile(pattern)?.compile_matcher(),
                parent,
            });
        }

        for pattern in exclude {
            excludes.add(compile(pattern.trim_start_matches('!'))?);
            has_excludes = true;
        }

        let exclude = if has_excludes {
            Some(excludes.build().context("building exclude globset")?)
        } else {
            None
        };

        Ok(Self {
            include,
            exclude,
            base: base.map(PathBuf::from),
        })
    }

    /// Whether a root-relative path (forward slashes) is selected.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matching_pattern(rel_path).is_some()
    }

    fn matching_pattern(&self, rel_path: &str) -> Option<&IncludePattern> {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return None;
            }
        }
        self.include.iter().find(|p| p.matcher.is_match(rel_path))
    }

    /// Root-relative directories that have to be watched to see every
    /// matching file. Deduplicated, sorted.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = self
            .include
            .iter()
            .map(|p| PathBuf::from(&p.parent))
            .collect();
        roots.sort();
        roots.dedup();
        roots
    }

    /// Enumerate matching files below `root`, sorted by path.
    pub fn collect(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<MatchedFile>> {
        let mut found: BTreeMap<PathBuf, MatchedFile> = BTreeMap::new();

        for pattern in &self.include {
            let start = root.join(&pattern.parent);
            if fs.is_file(&start) {
                self.consider(root, &start, &mut found);
                continue;
            }
            if !fs.is_dir(&start) {
                continue;
            }

            let mut stack = vec![start];
            while let Some(dir) = stack.pop() {
                for path in fs.read_dir(&dir)? {
                    if fs.is_dir(&path) {
                        if pattern.recursive {
                            stack.push(path);
                        }
                    } else if fs.is_file(&path) {
                        self.consider(root, &path, &mut found);
                    }
                }
            }
        }

        Ok(found.into_values().collect())
    }

    fn consider(&self, root: &Path, path: &Path, found: &mut BTreeMap<PathBuf, MatchedFile>) {
        if found.contains_key(path) {
            return;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            return;
        };
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        let Some(pattern) = self.matching_pattern(&rel_str) else {
            return;
        };

        let base = self
            .base
            .as_deref()
            .filter(|b| rel.starts_with(b))
            .unwrap_or_else(|| Path::new(&pattern.parent));
        let relative = rel.strip_prefix(base).unwrap_or(rel).to_path_buf();

        found.insert(
            path.to_path_buf(),
            MatchedFile {
                path: path.to_path_buf(),
                relative,
            },
        );
    }
}

/// Leading components of `pattern` that contain no glob syntax.
///
/// A pattern without any glob syntax names a single file, so its parent
/// directory is returned.
pub fn glob_parent(pattern: &str) -> String {
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components
        .iter()
        .take_while(|c| !c.contains(GLOB_META))
        .count();

    let keep = if literal == components.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };
    components[..keep].join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn glob_parent_stops_at_first_glob_component() {
        assert_eq!(glob_parent("source/img/**/*.{jpg,png}"), "source/img");
        assert_eq!(glob_parent("source/*.html"), "source");
        assert_eq!(glob_parent("source/sass/style.sass"), "source/sass");
        assert_eq!(glob_parent("*.ico"), "");
    }

    #[test]
    fn star_does_not_cross_directories() {
        let m = FileMatcher::new(&strings(&["source/*.html"]), &[], None).unwrap();
        assert!(m.matches("source/index.html"));
        assert!(!m.matches("source/partials/nav.html"));
    }

    #[test]
    fn bang_patterns_exclude() {
        let m = FileMatcher::new(
            &strings(&["source/img/svg/*.svg", "!source/img/svg/logo-*.svg"]),
            &strings(&["source/img/svg/skip.svg"]),
            None,
        )
        .unwrap();
        assert!(m.matches("source/img/svg/arrow.svg"));
        assert!(!m.matches("source/img/svg/logo-dark.svg"));
        assert!(!m.matches("source/img/svg/skip.svg"));
    }

    #[test]
    fn collect_is_sorted_and_relative_to_glob_parent() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/img/b.png", "b");
        fs.add_file("/proj/source/img/nested/a.jpg", "a");
        fs.add_file("/proj/source/img/notes.txt", "x");

        let m = FileMatcher::new(&strings(&["source/img/**/*.{jpg,png}"]), &[], None).unwrap();
        let files = m.collect(&fs, Path::new("/proj")).unwrap();

        let rel: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(rel, vec![PathBuf::from("b.png"), PathBuf::from("nested/a.jpg")]);
    }

    #[test]
    fn explicit_base_keeps_structure() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/fonts/a.woff2", "f");
        fs.add_file("/proj/source/favicon.ico", "i");

        let m = FileMatcher::new(
            &strings(&["source/fonts/*.woff2", "source/*.ico"]),
            &[],
            Some("source"),
        )
        .unwrap();
        let files = m.collect(&fs, Path::new("/proj")).unwrap();
        let rel: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            rel,
            vec![PathBuf::from("favicon.ico"), PathBuf::from("fonts/a.woff2")]
        );
    }

    #[test]
    fn missing_parent_directory_yields_nothing() {
        let fs = MockFileSystem::new();
        let m = FileMatcher::new(&strings(&["source/js/*.js"]), &[], None).unwrap();
        assert!(m.collect(&fs, Path::new("/proj")).unwrap().is_empty());
    }
}
