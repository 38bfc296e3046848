use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use watchrun::fs::mock::MockFileSystem;
use watchrun::fs::{FileStamp, FileSystem};

/// A [`MockFileSystem`] whose `stamp` can be told to fail a number of times,
/// like a network share that briefly refuses `stat`.
///
/// Clones share the failure budget, so a test can keep one handle and give
/// another to a watcher.
#[derive(Debug, Clone, Default)]
pub struct FlakyFileSystem {
    inner: MockFileSystem,
    failures: Arc<AtomicUsize>,
}

impl FlakyFileSystem {
    pub fn new(inner: MockFileSystem) -> Self {
        Self {
            inner,
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the next `n` calls to `stamp` fail.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Failures not consumed yet.
    pub fn failures_left(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

impl FileSystem for FlakyFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.inner.read_dir(dir)
    }

    fn stamp(&self, path: &Path) -> Result<Option<FileStamp>> {
        let consumed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            bail!("stat {}: permission denied", path.display());
        }
        self.inner.stamp(path)
    }
}
