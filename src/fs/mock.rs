// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use anyhow::{bail, Result};

use super::{FileStamp, FileSystem};

#[derive(Debug, Clone, Copy)]
struct MockFile {
    len: u64,
    /// Logical clock value of the last write.
    written_at: u64,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, MockFile>,
    clock: u64,
}

/// In-memory filesystem for the project walker and the polling watcher.
///
/// Only files are stored; a directory exists while some file lives below
/// it. Every write advances a logical clock, exposed as the modification
/// time in seconds since the Unix epoch, so two writes never share a stamp.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<State>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a file.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        let mut state = self.lock();
        state.clock += 1;
        let file = MockFile {
            len: content.as_ref().len() as u64,
            written_at: state.clock,
        };
        state.files.insert(path.as_ref().to_path_buf(), file);
    }

    /// Bump the modification time of an existing file.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        state.clock += 1;
        let now = state.clock;
        if let Some(file) = state.files.get_mut(path.as_ref()) {
            file.written_at = now;
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.lock().files.remove(path.as_ref());
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FileSystem for MockFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock()
            .files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        let children: BTreeSet<PathBuf> = state
            .files
            .keys()
            .filter_map(|file| file.strip_prefix(dir).ok())
            .filter_map(|rel| rel.components().next())
            .map(|first| dir.join(first))
            .collect();

        if children.is_empty() {
            bail!("not a directory: {}", dir.display());
        }
        Ok(children.into_iter().collect())
    }

    fn stamp(&self, path: &Path) -> Result<Option<FileStamp>> {
        Ok(self.lock().files.get(path).map(|file| FileStamp {
            modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(file.written_at)),
            len: file.len,
        }))
    }
}
