// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::Verbosity;

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Run a command and restart it whenever one of the project's files changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Project file, or a directory containing exactly one.
    ///
    /// Default: search the current working directory for `Watchrun.toml`
    /// or `*.watchrun.toml`.
    #[arg(long, short = 'p', value_name = "PATH")]
    pub project: Option<PathBuf>,

    /// Only show warnings and errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show verbose status messages.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` or `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Use the polling file watcher instead of OS notifications.
    #[arg(long)]
    pub poll: bool,

    /// Keep running when the file list cannot be computed, and retry once
    /// the project file changes.
    #[arg(long)]
    pub wait_on_error: bool,

    /// Quiet period (milliseconds) that ends a burst of file changes.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Print the files that would be watched and exit.
    #[arg(long)]
    pub list: bool,

    /// Command to run, overriding `[run].cmd` in the project file.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl CliArgs {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
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
