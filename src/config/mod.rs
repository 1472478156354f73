// src/config/mod.rs

//! Project configuration for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Provide the built-in project layout (`defaults.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate invariants like step references and clean ordering
//!   (`validate.rs`).

pub mod defaults;
pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_builtin, load_from_path, load_from_str};
pub use model::{
    ConfigFile, ConfigSection, PipelineConfig, RawConfigFile, ServerSection, StepConfig,
    TargetsSection, TaskConfig, WatchConfig,
};
