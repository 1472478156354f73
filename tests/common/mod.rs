#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use sitepipe::config::load_builtin;
use sitepipe::fs::RealFileSystem;
use sitepipe::project::Project;
use sitepipe::tasks::TaskContext;

pub use sitepipe_test_utils::{init_tracing, with_timeout};

/// The built-in project rooted at `root`.
pub fn builtin_project(root: &Path) -> Project {
    Project::new(root, load_builtin().expect("built-in project")).expect("compile project")
}

pub fn real_ctx(project: &Project) -> TaskContext {
    project.task_context(Arc::new(RealFileSystem))
}
