// src/tasks/plan.rs

//! Output planning: which files a task would write, and whether tasks that
//! run concurrently would write the same file.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::dag::Pipeline;
use crate::errors::{Result, SitepipeError};
use crate::tasks::{TaskContext, TaskSpec, inputs};
use crate::types::TaskKind;

/// Root-relative paths `spec` would write given the current inputs.
pub fn planned_outputs(spec: &TaskSpec, ctx: &TaskContext) -> anyhow::Result<Vec<PathBuf>> {
    match spec.kind {
        TaskKind::Clean => Ok(Vec::new()),
        TaskKind::Sprite => {
            let any = !inputs(spec, ctx)?.is_empty();
            Ok(if any { vec![spec.sprite_path()] } else { Vec::new() })
        }
        _ => Ok(inputs(spec, ctx)?
            .iter()
            .map(|f| spec.output_path(&f.relative))
            .collect()),
    }
}

/// Reject a pipeline in which two tasks of the same step would write the same
/// path. A task mapping several of its own inputs onto one output (`a.jpg`
/// and `a.png` both becoming `a.webp`) is only warned about; its inputs are
/// processed in sorted order, so the last one wins deterministically.
pub fn check_isolation(
    pipeline: &Pipeline,
    specs: &BTreeMap<String, Arc<TaskSpec>>,
    ctx: &TaskContext,
) -> Result<()> {
    for step in &pipeline.steps {
        let mut owners: BTreeMap<PathBuf, &str> = BTreeMap::new();
        for name in step.tasks() {
            let Some(spec) = specs.get(name) else {
                return Err(SitepipeError::UnknownTarget(name.clone()));
            };
            for out in planned_outputs(spec, ctx)? {
                match owners.get(&out) {
                    Some(first) if *first == name.as_str() => {
                        warn!(task = %name, path = %out.display(), "several inputs write the same output; the last one wins");
                    }
                    Some(first) => {
                        return Err(SitepipeError::OutputConflict(format!(
                            "tasks '{first}' and '{name}' both write '{}'",
                            out.display()
                        )));
                    }
                    None => {
                        owners.insert(out, name.as_str());
                    }
                }
            }
        }
    }
    Ok(())
}
