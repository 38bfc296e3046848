// src/config/validate.rs

use std::path::PathBuf;

use regex::Regex;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::{Result, WatchrunError};
use crate::fileset::PathPatterns;

/// Upper bound for `debounce_ms`; anything larger makes the tool feel dead.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Lower bound for `poll_interval_ms`.
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

impl TryFrom<(PathBuf, RawProjectFile)> for ProjectFile {
    type Error = WatchrunError;

    fn try_from((path, raw): (PathBuf, RawProjectFile)) -> std::result::Result<Self, Self::Error> {
        validate_raw_project(&raw)?;
        Ok(ProjectFile::new_unchecked(path, raw))
    }
}

/// Check the semantic rules serde cannot express.
pub fn validate_raw_project(raw: &RawProjectFile) -> Result<()> {
    validate_run_section(raw)?;
    validate_file_selection(raw)?;
    validate_timing(raw)?;
    Ok(())
}

fn validate_run_section(raw: &RawProjectFile) -> Result<()> {
    if let Some(cmd) = &raw.run.cmd {
        if cmd.is_empty() || cmd[0].trim().is_empty() {
            return Err(WatchrunError::ConfigError(
                "[run].cmd must name an executable when present".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_file_selection(raw: &RawProjectFile) -> Result<()> {
    let watch = &raw.watch;

    match &watch.list_cmd {
        Some(cmd) if cmd.is_empty() || cmd[0].trim().is_empty() => {
            return Err(WatchrunError::ConfigError(
                "[watch].list_cmd must name an executable when present".to_string(),
            ));
        }
        Some(_) => {}
        None if watch.include.is_empty() => {
            return Err(WatchrunError::ConfigError(
                "[watch] needs either `include` patterns or a `list_cmd`".to_string(),
            ));
        }
        None => {}
    }

    PathPatterns::new(&watch.include, &watch.exclude)
        .map_err(|e| WatchrunError::ConfigError(format!("[watch] patterns: {e:#}")))?;

    if let Some(pattern) = &watch.diagnostic_pattern {
        Regex::new(pattern).map_err(|e| {
            WatchrunError::ConfigError(format!("[watch].diagnostic_pattern is not a valid regex: {e}"))
        })?;
    }

    Ok(())
}

fn validate_timing(raw: &RawProjectFile) -> Result<()> {
    if let Some(ms) = raw.watch.debounce_ms {
        if ms > MAX_DEBOUNCE_MS {
            return Err(WatchrunError::ConfigError(format!(
                "[watch].debounce_ms must be <= {MAX_DEBOUNCE_MS} (got {ms})"
            )));
        }
    }

    if let Some(ms) = raw.watch.poll_interval_ms {
        if ms < MIN_POLL_INTERVAL_MS {
            return Err(WatchrunError::ConfigError(format!(
                "[watch].poll_interval_ms must be >= {MIN_POLL_INTERVAL_MS} (got {ms})"
            )));
        }
    }

    Ok(())
}
