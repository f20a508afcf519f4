// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::UnresolvedPolicy;

/// Command-line arguments for `taskdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskdag",
    version,
    about = "Run shell commands as a dependency graph, independent ones concurrently.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task file (TOML).
    ///
    /// Default: `Taskdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Taskdag.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// What to do about `after` entries naming tasks that do not exist
    /// (`fail` or `skip`). Overrides `[config].on_unresolved`.
    #[arg(long, value_name = "POLICY")]
    pub on_unresolved: Option<UnresolvedPolicy>,

    /// Parse + validate, print the task graph, but don't run any commands.
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
    fn defaults() {
        let args = CliArgs::try_parse_from(["taskdag"]).unwrap();
        assert_eq!(args.config, "Taskdag.toml");
        assert!(args.on_unresolved.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn parses_policy_override() {
        let args = CliArgs::try_parse_from([
            "taskdag",
            "--config",
            "ci/Taskdag.toml",
            "--on-unresolved",
            "skip",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.config, "ci/Taskdag.toml");
        assert_eq!(args.on_unresolved, Some(UnresolvedPolicy::Skip));
        assert!(args.dry_run);
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(CliArgs::try_parse_from(["taskdag", "--on-unresolved", "maybe"]).is_err());
    }
}
