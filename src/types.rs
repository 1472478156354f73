use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when a watch trigger arrives for a task that is already running.
///
/// - `Queue`: remember the trigger and run the task again once the current
///   run finishes (default behaviour).
/// - `Cancel`: drop any previously queued run and only keep the latest
///   trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}

/// The transformation a task applies to its matched files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Sass/SCSS → prefixed, minified CSS.
    Styles,
    /// HTML minification.
    Html,
    /// JavaScript minification.
    Scripts,
    /// Lossless-ish JPEG/PNG recompression.
    OptimizeImages,
    /// JPEG/PNG → WebP.
    Webp,
    /// Per-file SVG optimization.
    Svg,
    /// Many SVG icons → one `<symbol>` sprite.
    Sprite,
    /// Byte-for-byte copy.
    Copy,
    /// Recursive removal of `dest`.
    Clean,
}

impl TaskKind {
    /// Whether this kind writes files into `dest` (everything except `clean`).
    pub fn writes_output(self) -> bool {
        !matches!(self, TaskKind::Clean)
    }

    /// Extension forced onto output files, if the transformation changes it.
    pub fn output_extension(self) -> Option<&'static str> {
        match self {
            TaskKind::Styles => Some("css"),
            TaskKind::Webp => Some("webp"),
            _ => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Styles => "styles",
            TaskKind::Html => "html",
            TaskKind::Scripts => "scripts",
            TaskKind::OptimizeImages => "optimize_images",
            TaskKind::Webp => "webp",
            TaskKind::Svg => "svg",
            TaskKind::Sprite => "sprite",
            TaskKind::Copy => "copy",
            TaskKind::Clean => "clean",
        };
        f.write_str(s)
    }
}

/// What connected browsers should do after a watched task re-ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReloadKind {
    /// Re-fetch stylesheets in place.
    Css,
    /// Full page reload.
    #[default]
    Full,
}

impl ReloadKind {
    /// Payload of the `reload` server-sent event.
    pub fn as_event_data(self) -> &'static str {
        match self {
            ReloadKind::Css => "css",
            ReloadKind::Full => "full",
        }
    }
}
