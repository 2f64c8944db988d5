// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `stylepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stylepipe",
    version,
    about = "Compile, clean and minify a stylesheet project, or watch it.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run: watch, sass, clean, live-sass, minify-css, live, or any
    /// sequence defined in the config.
    #[arg(value_name = "TASK", default_value = "watch")]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Stylepipe.toml` in the current working directory. When the
    /// default file does not exist, built-in defaults are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STYLEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate the config and print the task table, but run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the registered task names and exit.
    #[arg(long)]
    pub list: bool,
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
    fn defaults_to_watch() {
        let args = CliArgs::try_parse_from(["stylepipe"]).unwrap();
        assert_eq!(args.task, "watch");
        assert!(args.config.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn accepts_task_and_flags() {
        let args = CliArgs::try_parse_from([
            "stylepipe",
            "live",
            "--config",
            "site/Stylepipe.toml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.task, "live");
        assert_eq!(args.config.as_deref(), Some("site/Stylepipe.toml"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
