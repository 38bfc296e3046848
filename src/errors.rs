// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Could not find a watchrun project file in '{}'", .0.display())]
    NoProjectFound(PathBuf),

    #[error(
        "Multiple watchrun project files found in '{}'; pass --project to pick one",
        .0.display()
    )]
    MultipleProjectsFound(PathBuf),

    #[error("The project file '{}' does not exist", .0.display())]
    ProjectPathNotFound(PathBuf),

    /// The file-set query command failed; `output` holds what it printed.
    #[error("Error(s) finding watch items for project '{}' (exit code {code})", project.display())]
    FileSetQuery {
        project: PathBuf,
        code: i32,
        output: Vec<String>,
    },

    #[error("Failed to start '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// A polling scan could not stat the watched files.
    #[error("Polling scan failed: {0:#}")]
    PollScan(anyhow::Error),

    #[error("File watcher stopped delivering events")]
    WatcherClosed,

    /// The operation was cancelled; never reported to the user as a failure.
    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatchrunError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WatchrunError::Cancelled)
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchrunError>;
