// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_DEBOUNCE_MS: u64 = 100;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_DIAGNOSTIC_PATTERN: &str = r"(?i)\berror\b";

/// Project file as read from TOML, before validation.
///
/// ```toml
/// [run]
/// cmd = ["cargo", "run"]
///
/// [watch]
/// include = ["src/**/*.rs", "Cargo.toml"]
/// exclude = ["target/**"]
/// ```
///
/// Both sections are optional in the file; validation decides whether the
/// combination is usable.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawProjectFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// `[run]` section: the command restarted on every change.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunSection {
    /// Command line to run; trailing CLI arguments take precedence.
    #[serde(default)]
    pub cmd: Option<Vec<String>>,

    /// Working directory, relative to the project directory.
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Extra environment variables for the child.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[watch]` section: which files matter and how to watch them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Globs (relative to the project directory) of files to watch.
    #[serde(default)]
    pub include: Vec<String>,

    /// Globs removed from `include`; a matching directory is not descended.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Command whose stdout lists the files to watch, one per line.
    ///
    /// When set, `include` / `exclude` are not used.
    #[serde(default)]
    pub list_cmd: Option<Vec<String>>,

    /// Regex; `list_cmd` output lines matching it are shown as warnings as
    /// soon as they are printed.
    #[serde(default)]
    pub diagnostic_pattern: Option<String>,

    #[serde(default)]
    pub debounce_ms: Option<u64>,

    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    #[serde(default)]
    pub use_polling: Option<bool>,

    /// Keep running after a failed file-list query, retrying once the
    /// project file changes.
    #[serde(default)]
    pub wait_on_error: Option<bool>,
}

/// A validated project file together with its location.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub run: RunSection,
    pub watch: WatchSection,
}

impl ProjectFile {
    /// Construct without validation; use [`crate::config::load_and_validate`].
    pub(crate) fn new_unchecked(path: PathBuf, raw: RawProjectFile) -> Self {
        Self {
            path,
            run: raw.run,
            watch: raw.watch,
        }
    }

    /// Directory containing the project file; relative paths resolve here.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Absolute working directory for the user's command.
    pub fn working_directory(&self) -> PathBuf {
        match &self.run.workdir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.directory().join(dir),
            None => self.directory().to_path_buf(),
        }
    }

    pub fn diagnostic_pattern(&self) -> &str {
        self.watch
            .diagnostic_pattern
            .as_deref()
            .unwrap_or(DEFAULT_DIAGNOSTIC_PATTERN)
    }
}
