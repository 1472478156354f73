// src/tasks/error.rs

use std::path::PathBuf;

use thiserror::Error;

use crate::tasks::sass::SassSyntaxError;

/// Why a single input file could not be transformed.
///
/// These never abort a task: the file is reported, its output is left
/// untouched and the remaining files proceed.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("sass syntax error at {0}")]
    SassSyntax(#[from] SassSyntaxError),

    #[error("sass compilation failed: {0}")]
    Sass(String),

    #[error("css processing failed: {0}")]
    Css(String),

    #[error("script minification failed: {0}")]
    Script(String),

    #[error("invalid svg: {0}")]
    Svg(String),

    #[error("sprite: {0}")]
    Sprite(String),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("file is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("unsupported input: {0}")]
    Unsupported(String),
}

/// A per-file failure recorded in a [`TaskReport`](super::TaskReport).
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: TransformError,
}
