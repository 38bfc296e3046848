// src/fileset/mod.rs

//! The set of files a watch cycle cares about, and where it comes from.
//!
//! - [`FileSet`] is the immutable set handed to the watcher.
//! - [`FileSetProvider`] is the seam the watch loop consumes; tests provide
//!   scripted implementations.
//! - [`project`] finds the project file on disk.
//! - [`patterns`] compiles include/exclude globs and walks a directory.
//! - [`provider`] is the production provider driven by the project file.
//! - [`wait_on_error`] wraps any provider with the "fix it and I'll retry"
//!   behaviour.

pub mod patterns;
pub mod project;
pub mod provider;
pub mod wait_on_error;

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::errors::Result;

pub use patterns::{collect_matching_files, PathPatterns};
pub use project::ProjectFinder;
pub use provider::ProjectFileSetProvider;
pub use wait_on_error::WaitOnError;

/// Immutable set of absolute file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: HashSet<PathBuf>,
}

impl FileSet {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Paths in a stable order, for listing and logging.
    pub fn sorted(&self) -> Vec<&PathBuf> {
        let mut paths: Vec<_> = self.files.iter().collect();
        paths.sort();
        paths
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for FileSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        FileSet::new(iter)
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::collections::hash_set::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Produces the current [`FileSet`] for a project.
///
/// Called once at the start of every watch cycle. Implementations may shell
/// out and take seconds; they should return [`WatchrunError::Cancelled`]
/// promptly once `cancel` fires.
///
/// [`WatchrunError::Cancelled`]: crate::errors::WatchrunError::Cancelled
pub trait FileSetProvider: Send {
    fn create<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<FileSet>> + Send + 'a>>;
}
