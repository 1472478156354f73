// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{ReloadKind, TaskKind, TriggerWhileRunningBehaviour};

/// Top-level project description as read from a TOML file.
///
/// ```toml
/// [config]
/// triggered_while_running_behaviour = "queue"
///
/// [server]
/// base_dir = "build"
/// port = 3000
///
/// [task.styles]
/// kind = "styles"
/// src = ["source/sass/style.sass"]
/// dest = "build/css"
/// rename = "style.min.css"
///
/// [pipeline.build]
/// steps = ["clean", "copy", ["styles", "html"]]
///
/// [[watch]]
/// src = ["source/sass/**/*.sass"]
/// task = "styles"
/// reload = "css"
/// ```
///
/// This is the unvalidated form; convert it into a [`ConfigFile`] with
/// `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Watch-runtime behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Dev server settings from `[server]`.
    #[serde(default)]
    pub server: ServerSection,

    /// Browser targets for CSS prefixing from `[targets]`.
    #[serde(default)]
    pub targets: TargetsSection,

    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// All pipelines from `[pipeline.<name>]`.
    #[serde(default)]
    pub pipeline: BTreeMap<String, PipelineConfig>,

    /// Watch subscriptions from `[[watch]]`.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// Validated project description.
///
/// Only constructed through `TryFrom<RawConfigFile>`, so holders can rely on
/// every pipeline step and watch subscription referencing a known task.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    server: ServerSection,
    targets: TargetsSection,
    task: BTreeMap<String, TaskConfig>,
    pipeline: BTreeMap<String, PipelineConfig>,
    watch: Vec<WatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            server: raw.server,
            targets: raw.targets,
            task: raw.task,
            pipeline: raw.pipeline,
            watch: raw.watch,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn targets(&self) -> &TargetsSection {
        &self.targets
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn pipelines(&self) -> &BTreeMap<String, PipelineConfig> {
        &self.pipeline
    }

    pub fn watches(&self) -> &[WatchConfig] {
        &self.watch
    }
}

/// `[config]` section.
///
/// Controls what happens when a watch trigger arrives for a task that is
/// already running.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// `"queue"` (default) or `"cancel"`.
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Directory served as the site root, relative to the project root.
    pub base_dir: String,
    pub host: String,
    /// Preferred port. `0` asks the OS for an ephemeral port.
    pub port: u16,
    /// How many consecutive ports to try when the preferred one is taken.
    pub port_attempts: u16,
    pub cors: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_dir: "build".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            port_attempts: 10,
            cors: true,
        }
    }
}

/// `[targets]` section: minimum browser versions, as `"major"` or
/// `"major.minor"`. Unset browsers are not targeted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetsSection {
    pub android: Option<String>,
    pub chrome: Option<String>,
    pub edge: Option<String>,
    pub firefox: Option<String>,
    pub ios_saf: Option<String>,
    pub opera: Option<String>,
    pub safari: Option<String>,
    pub samsung: Option<String>,
}

impl Default for TargetsSection {
    fn default() -> Self {
        Self {
            android: None,
            chrome: Some("109".to_string()),
            edge: Some("109".to_string()),
            firefox: Some("115".to_string()),
            ios_saf: Some("15".to_string()),
            opera: None,
            safari: Some("15".to_string()),
            samsung: None,
        }
    }
}

impl TargetsSection {
    /// `(browser, version)` pairs for every configured browser.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("android", &self.android),
            ("chrome", &self.chrome),
            ("edge", &self.edge),
            ("firefox", &self.firefox),
            ("ios_saf", &self.ios_saf),
            ("opera", &self.opera),
            ("safari", &self.safari),
            ("samsung", &self.samsung),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.as_deref().map(|v| (name, v)))
        .collect()
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Which transformation to apply.
    pub kind: TaskKind,

    /// Input glob patterns, relative to the project root. Entries starting
    /// with `!` are exclusions.
    #[serde(default)]
    pub src: Vec<String>,

    /// Additional exclusion patterns.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Base directory that output paths are made relative to. Defaults to
    /// each pattern's static prefix.
    #[serde(default)]
    pub base: Option<String>,

    /// Output directory (or, for `clean`, the directory to remove).
    pub dest: String,

    /// Fixed output file name.
    #[serde(default)]
    pub rename: Option<String>,
}

/// `[pipeline.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Sequential steps; an array entry is a parallel group.
    pub steps: Vec<StepConfig>,

    /// Start the dev server once the steps completed.
    #[serde(default)]
    pub serve: bool,

    /// Enter watch mode once the steps completed.
    #[serde(default)]
    pub watch: bool,

    /// Treat per-file transformation errors as warnings instead of failing
    /// the task.
    #[serde(default)]
    pub keep_going: bool,
}

/// One entry of `steps = [...]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StepConfig {
    Task(String),
    Parallel(Vec<String>),
}

impl StepConfig {
    /// Task names in this step.
    pub fn tasks(&self) -> &[String] {
        match self {
            StepConfig::Task(name) => std::slice::from_ref(name),
            StepConfig::Parallel(names) => names,
        }
    }
}

/// `[[watch]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Globs whose changes trigger the task.
    pub src: Vec<String>,

    /// Task re-run on change.
    pub task: String,

    /// What connected browsers do after the task succeeded.
    #[serde(default)]
    pub reload: ReloadKind,

    /// Skip triggers when the watched files' content is unchanged.
    #[serde(default = "default_use_hash")]
    pub use_hash: bool,
}

fn default_use_hash() -> bool {
    true
}
