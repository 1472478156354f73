// src/tasks/scripts.rs

use minify_js::{minify, Session, TopLevelMode};

use crate::tasks::error::TransformError;

/// Minify a classic (non-module) script.
pub fn minify_script(source: &[u8]) -> Result<Vec<u8>, TransformError> {
    let session = Session::new();
    let mut out = Vec::with_capacity(source.len());
    minify(&session, TopLevelMode::Global, source, &mut out)
        .map_err(|e| TransformError::Script(format!("{e:?}")))?;
    Ok(out)
}
