// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::Result;

/// Load a project file and return the raw, unvalidated model.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProjectFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawProjectFile = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a project file and validate it.
///
/// This is the entry point the rest of the crate uses. It runs on every
/// watch cycle, so edits to `[watch]` take effect on the next restart.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ProjectFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    ProjectFile::try_from((path.to_path_buf(), raw))
}
