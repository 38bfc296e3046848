// src/fileset/project.rs

//! Locating the project file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{Result, WatchrunError};
use crate::fs::{FileSystem, RealFileSystem};

/// Canonical project file name.
pub const PROJECT_FILE_NAME: &str = "Watchrun.toml";

/// Suffix for named project files (`api.watchrun.toml`).
pub const PROJECT_FILE_SUFFIX: &str = ".watchrun.toml";

/// Resolves `--project` into exactly one project file.
#[derive(Debug, Clone)]
pub struct ProjectFinder {
    directory: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl ProjectFinder {
    /// `directory` is what relative `--project` values resolve against
    /// (normally the current working directory).
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_fs(directory, Arc::new(RealFileSystem))
    }

    pub fn with_fs(directory: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            directory: directory.into(),
            fs,
        }
    }

    /// Find the project file.
    ///
    /// - `None` searches `directory` itself.
    /// - A directory is searched (non-recursively) for `Watchrun.toml` or
    ///   `*.watchrun.toml`; it must contain exactly one.
    /// - A file path must exist.
    pub fn find(&self, project: Option<&Path>) -> Result<PathBuf> {
        let path = match project {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => self.directory.join(p),
            None => self.directory.clone(),
        };

        if self.fs.is_dir(&path) {
            let mut candidates: Vec<PathBuf> = self
                .fs
                .read_dir(&path)?
                .into_iter()
                .filter(|p| self.fs.is_file(p) && is_project_file_name(p))
                .collect();

            return match candidates.len() {
                0 => Err(WatchrunError::NoProjectFound(path)),
                1 => Ok(candidates.remove(0)),
                _ => Err(WatchrunError::MultipleProjectsFound(path)),
            };
        }

        if !self.fs.is_file(&path) {
            return Err(WatchrunError::ProjectPathNotFound(path));
        }

        Ok(path)
    }
}

fn is_project_file_name(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => {
            name == PROJECT_FILE_NAME
                || (name.len() > PROJECT_FILE_SUFFIX.len()
                    && name.to_ascii_lowercase().ends_with(PROJECT_FILE_SUFFIX))
        }
        None => false,
    }
}
