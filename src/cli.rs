// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build static-site assets through declarative task pipelines.",
    long_about = None
)]
pub struct CliArgs {
    /// Pipeline to run (`build`, `default`, ...) or the name of a single task.
    #[arg(value_name = "TARGET", default_value = "default")]
    pub target: String,

    /// Path to the project file (TOML).
    ///
    /// When omitted and `Sitepipe.toml` does not exist in the current
    /// directory, the built-in project layout (`source/` → `build/`) is used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the pipeline and planned outputs, but don't
    /// touch the output directory.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_defaults_to_dev_pipeline() {
        let args = CliArgs::try_parse_from(["sitepipe"]).unwrap();
        assert_eq!(args.target, "default");
        assert!(args.config.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn accepts_target_and_flags() {
        let args = CliArgs::try_parse_from([
            "sitepipe",
            "build",
            "--config",
            "site/Sitepipe.toml",
            "--log-level",
            "debug",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.target, "build");
        assert_eq!(args.config.as_deref(), Some("site/Sitepipe.toml"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run);
    }
}
