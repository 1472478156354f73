// src/dag/pipeline.rs

use std::fmt;

use crate::config::model::{PipelineConfig, StepConfig};
use crate::engine::TaskName;

/// One stage of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Task(TaskName),
    /// Tasks that run concurrently; the step completes when all of them did.
    Parallel(Vec<TaskName>),
}

impl Step {
    pub fn tasks(&self) -> &[TaskName] {
        match self {
            Step::Task(name) => std::slice::from_ref(name),
            Step::Parallel(names) => names,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Task(name) => f.write_str(name),
            Step::Parallel(names) => write!(f, "parallel{{{}}}", names.join(", ")),
        }
    }
}

/// A named, validated composition of tasks plus what happens after the
/// steps completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub name: String,
    pub steps: Vec<Step>,
    pub serve: bool,
    pub watch: bool,
    /// Per-file transformation errors do not fail the task.
    pub keep_going: bool,
}

impl Pipeline {
    pub fn from_config(name: &str, cfg: &PipelineConfig) -> Self {
        let steps = cfg
            .steps
            .iter()
            .map(|s| match s {
                StepConfig::Task(t) => Step::Task(t.clone()),
                StepConfig::Parallel(ts) if ts.len() == 1 => Step::Task(ts[0].clone()),
                StepConfig::Parallel(ts) => Step::Parallel(ts.clone()),
            })
            .collect();

        Self {
            name: name.to_string(),
            steps,
            serve: cfg.serve,
            watch: cfg.watch,
            keep_going: cfg.keep_going,
        }
    }

    /// Ad-hoc pipeline running one task alone, as for `sitepipe styles`.
    pub fn single_task(task: &str) -> Self {
        Self {
            name: task.to_string(),
            steps: vec![Step::Task(task.to_string())],
            serve: false,
            watch: false,
            keep_going: false,
        }
    }

    /// Tasks of the first step; triggering them starts the pipeline.
    pub fn roots(&self) -> &[TaskName] {
        self.steps.first().map(Step::tasks).unwrap_or(&[])
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().flat_map(|s| s.tasks()).map(String::as_str)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.steps.iter().map(ToString::to_string).collect();
        write!(f, "{}: {}", self.name, steps.join(" -> "))?;
        if self.serve {
            f.write_str(" -> serve")?;
        }
        if self.watch {
            f.write_str(" -> watch")?;
        }
        Ok(())
    }
}
