use sitepipe::config::{
    ConfigFile, PipelineConfig, RawConfigFile, StepConfig, TaskConfig, WatchConfig, load_from_str,
};
use sitepipe::types::{ReloadKind, TaskKind};

/// Builder for project configs, starting from an empty project.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: load_from_str("").expect("empty project parses"),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_pipeline(mut self, name: &str, steps: Vec<StepConfig>) -> Self {
        self.config.pipeline.insert(
            name.to_string(),
            PipelineConfig {
                steps,
                serve: false,
                watch: false,
                keep_going: false,
            },
        );
        self
    }

    pub fn keep_going(mut self, pipeline: &str) -> Self {
        if let Some(p) = self.config.pipeline.get_mut(pipeline) {
            p.keep_going = true;
        }
        self
    }

    pub fn with_watch(mut self, task: &str, src: &[&str], reload: ReloadKind) -> Self {
        self.config.watch.push(WatchConfig {
            src: src.iter().map(|s| s.to_string()).collect(),
            task: task.to_string(),
            reload,
            use_hash: true,
        });
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Task writing below `dest` from `src` patterns.
pub fn task(kind: TaskKind, src: &[&str], dest: &str) -> TaskConfig {
    TaskConfig {
        kind,
        src: src.iter().map(|s| s.to_string()).collect(),
        exclude: Vec::new(),
        base: None,
        dest: dest.to_string(),
        rename: None,
    }
}

pub fn clean(dest: &str) -> TaskConfig {
    task(TaskKind::Clean, &[], dest)
}

pub fn step(name: &str) -> StepConfig {
    StepConfig::Task(name.to_string())
}

pub fn parallel(names: &[&str]) -> StepConfig {
    StepConfig::Parallel(names.iter().map(|s| s.to_string()).collect())
}
