// src/fs/mod.rs

//! The few filesystem queries the project walker and the polling watcher
//! need, behind a trait so tests can swap in [`mock::MockFileSystem`].

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

pub mod mock;

/// What the polling watcher compares between two scans of a file.
///
/// Two stamps are equal when neither the modification time nor the size
/// changed. A missing file has no stamp at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

pub trait FileSystem: Send + Sync + Debug {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Full paths of the direct entries of `dir`.
    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Modification time and size of a file, or `None` if it does not exist.
    /// Fails only when the file may exist but cannot be inspected.
    fn stamp(&self, path: &Path) -> Result<Option<FileStamp>>;
}

/// The real disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(dir)
            .with_context(|| format!("listing directory {}", dir.display()))?
            .map(|entry| {
                entry
                    .map(|e| e.path())
                    .with_context(|| format!("reading an entry of {}", dir.display()))
            })
            .collect()
    }

    fn stamp(&self, path: &Path) -> Result<Option<FileStamp>> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading metadata of {}", path.display()));
            }
        };

        Ok(meta.is_file().then(|| FileStamp {
            modified: meta.modified().ok(),
            len: meta.len(),
        }))
    }
}
