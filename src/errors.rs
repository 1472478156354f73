// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown pipeline or task: {0}")]
    UnknownTarget(String),

    #[error("Output conflict: {0}")]
    OutputConflict(String),

    #[error("Pipeline '{pipeline}' failed; failed tasks: {}", failed.join(", "))]
    PipelineFailed {
        pipeline: String,
        failed: Vec<String>,
    },

    #[error("Interrupted before pipeline '{0}' finished")]
    Interrupted(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
