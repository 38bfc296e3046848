// src/watch/path_utils.rs

//! Mapping raw backend event paths back onto the watched file set.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use notify::RecursiveMode;
use tracing::warn;

use crate::fileset::FileSet;

/// Resolves event paths to members of a [`FileSet`].
///
/// Backends may report a path with a different absolute prefix than the one
/// in the set (symlinked temp dirs, `/private/var` on macOS). The index
/// therefore also keys every file by its canonicalized parent directory plus
/// file name. Parents are canonicalized rather than files so deleted files
/// still resolve.
#[derive(Debug)]
pub struct PathIndex {
    files: FileSet,
    canonical: HashMap<PathBuf, PathBuf>,
}

impl PathIndex {
    pub fn new(files: FileSet) -> Self {
        let canonical = files
            .iter()
            .filter_map(|path| {
                let alias = canonical_alias(path)?;
                (alias != *path).then(|| (alias, path.clone()))
            })
            .collect();

        Self { files, canonical }
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// The watched path `event_path` refers to, if any.
    pub fn resolve(&self, event_path: &Path) -> Option<PathBuf> {
        // Fast path: event path is already a member.
        if self.files.contains(event_path) {
            return Some(event_path.to_path_buf());
        }

        if self.canonical.is_empty() {
            return None;
        }

        let alias = canonical_alias(event_path)?;
        if self.files.contains(&alias) {
            return Some(alias);
        }
        self.canonical.get(&alias).cloned()
    }
}

/// Canonical parent directory joined with the file name.
fn canonical_alias(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    let name = path.file_name()?;
    let parent = parent.canonicalize().ok()?;
    Some(parent.join(name))
}

/// Directories to register with the native backend for `files`.
///
/// Each file's parent is watched non-recursively. A file whose parent does
/// not exist yet is covered by a recursive watch on its nearest existing
/// ancestor, so the file is still seen once it is created.
pub fn watch_roots(files: &FileSet) -> BTreeMap<PathBuf, RecursiveMode> {
    let mut roots: BTreeMap<PathBuf, RecursiveMode> = BTreeMap::new();

    for file in files {
        let Some(parent) = file.parent() else {
            continue;
        };

        if parent.is_dir() {
            roots
                .entry(parent.to_path_buf())
                .or_insert(RecursiveMode::NonRecursive);
            continue;
        }

        match parent.ancestors().find(|a| a.is_dir()) {
            Some(existing) => {
                roots.insert(existing.to_path_buf(), RecursiveMode::Recursive);
            }
            None => warn!(path = ?file, "no existing ancestor directory to watch"),
        }
    }

    roots
}
