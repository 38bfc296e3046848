// src/fileset/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Compiled include/exclude globs from a project's `[watch]` section.
///
/// Patterns are relative to the project directory and matched against
/// forward-slash relative paths such as `"src/main.rs"`.
#[derive(Clone)]
pub struct PathPatterns {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for PathPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPatterns")
            .field("include", &self.include.len())
            .field("exclude", &self.exclude.as_ref().map(GlobSet::len))
            .finish()
    }
}

impl PathPatterns {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = build_globset(include).context("building include globset")?;
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };
        Ok(Self { include, exclude })
    }

    /// Returns true if `rel_path` is included and not excluded.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Whether a whole directory is excluded, so the walker can skip it.
    fn excludes_dir(&self, rel_dir: &str) -> bool {
        match &self.exclude {
            Some(exclude) => exclude.is_match(rel_dir) || exclude.is_match(format!("{rel_dir}/")),
            None => false,
        }
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect all files under `root` that match `patterns`.
///
/// Returned paths are `root` joined with the relative path, so they are
/// absolute whenever `root` is. A directory matched by an exclude pattern is
/// pruned along with everything below it.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &PathPatterns,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            let Ok(rel) = path.strip_prefix(root) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().replace('\\', "/");

            if fs.is_dir(&path) {
                if !patterns.excludes_dir(&rel_str) {
                    stack.push(path);
                }
            } else if fs.is_file(&path) && patterns.matches(&rel_str) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
