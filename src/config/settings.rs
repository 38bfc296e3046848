// src/config/settings.rs

//! Effective settings: CLI flags, then environment, then the project file,
//! then built-in defaults.

use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::{ProjectFile, DEFAULT_DEBOUNCE_MS, DEFAULT_POLL_INTERVAL_MS};
use crate::config::validate::MAX_DEBOUNCE_MS;
use crate::errors::{Result, WatchrunError};
use crate::exec::ProcessSpec;
use crate::types::{parse_bool_flag, Verbosity, WatchBackendKind};
use crate::watch::WatcherOptions;

/// Environment toggle selecting the polling watcher.
pub const USE_POLLING_ENV: &str = "WATCHRUN_USE_POLLING";

/// Environment values read once at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvOverrides {
    pub use_polling: Option<bool>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            use_polling: std::env::var(USE_POLLING_ENV)
                .ok()
                .and_then(|s| parse_bool_flag(&s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub watcher: WatcherOptions,
    pub wait_on_error: bool,
    pub verbosity: Verbosity,
    /// Full command line of the watched process.
    pub command: Vec<String>,
}

impl Settings {
    pub fn resolve(args: &CliArgs, env: &EnvOverrides, project: &ProjectFile) -> Result<Self> {
        let use_polling = args.poll
            || env
                .use_polling
                .or(project.watch.use_polling)
                .unwrap_or(false);

        // The project file value was bounded at load time.
        if let Some(ms) = args.debounce_ms {
            if ms > MAX_DEBOUNCE_MS {
                return Err(WatchrunError::ConfigError(format!(
                    "--debounce-ms must be <= {MAX_DEBOUNCE_MS} (got {ms})"
                )));
            }
        }

        let debounce_ms = args
            .debounce_ms
            .or(project.watch.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        let poll_interval_ms = project
            .watch
            .poll_interval_ms
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        let watcher = WatcherOptions {
            backend: WatchBackendKind::from_use_polling(use_polling),
            debounce: Duration::from_millis(debounce_ms),
            poll_interval: Duration::from_millis(poll_interval_ms),
            ..WatcherOptions::default()
        };

        let command = if !args.command.is_empty() {
            args.command.clone()
        } else if let Some(cmd) = &project.run.cmd {
            cmd.clone()
        } else {
            return Err(WatchrunError::ConfigError(
                "no command to run: pass one after `--` or set [run].cmd in the project file"
                    .to_string(),
            ));
        };

        Ok(Self {
            watcher,
            wait_on_error: args.wait_on_error || project.watch.wait_on_error.unwrap_or(false),
            verbosity: args.verbosity(),
            command,
        })
    }

    /// The process handed to the watch loop.
    pub fn process_spec(&self, project: &ProjectFile) -> Result<ProcessSpec> {
        let spec = ProcessSpec::from_command_line(&self.command, project.working_directory())
            .ok_or_else(|| WatchrunError::ConfigError("empty command line".to_string()))?;

        Ok(project
            .run
            .env
            .iter()
            .fold(spec, |spec, (k, v)| spec.with_env(k.clone(), v.clone())))
    }
}
