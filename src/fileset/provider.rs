// src/fileset/provider.rs

//! File sets computed from the project file.
//!
//! The project file is re-read on every call, so edits to `[watch]` apply
//! from the next cycle on. Two sources are supported:
//!
//! - `list_cmd`: run a command in the project directory; every non-empty
//!   stdout line is a path relative to that directory.
//! - `include` / `exclude`: walk the project directory with globs.
//!
//! Either way, the project file itself is always part of the set.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{load_and_validate, ProjectFile};
use crate::engine::reporter::{Reporter, StatusEvent};
use crate::errors::{Result, WatchrunError};
use crate::exec::{OutputLine, OutputSink, OutputStream, ProcessRunner, ProcessSpec};
use crate::fileset::patterns::{collect_matching_files, PathPatterns};
use crate::fileset::{FileSet, FileSetProvider};
use crate::fs::{FileSystem, RealFileSystem};

/// Captures `list_cmd` output and surfaces diagnostic-looking lines as they
/// arrive.
struct QueryOutput {
    lines: Mutex<Vec<OutputLine>>,
    diagnostic: Regex,
    reporter: Arc<dyn Reporter>,
}

impl QueryOutput {
    fn lines(&self) -> Vec<OutputLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl OutputSink for QueryOutput {
    fn write_line(&self, line: OutputLine) {
        if self.diagnostic.is_match(&line.text) {
            self.reporter.report(StatusEvent::Diagnostic {
                line: line.text.clone(),
            });
        }
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

/// The production [`FileSetProvider`].
pub struct ProjectFileSetProvider {
    project_path: PathBuf,
    reporter: Arc<dyn Reporter>,
    fs: Arc<dyn FileSystem>,
    runner: ProcessRunner,
}

impl ProjectFileSetProvider {
    pub fn new(project_path: impl Into<PathBuf>, reporter: Arc<dyn Reporter>) -> Self {
        Self::with_fs(project_path, reporter, Arc::new(RealFileSystem))
    }

    /// `fs` is used for the glob walk; the project file is always read from
    /// disk.
    pub fn with_fs(
        project_path: impl Into<PathBuf>,
        reporter: Arc<dyn Reporter>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            project_path: project_path.into(),
            reporter,
            fs,
            runner: ProcessRunner::new(),
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Compute the current file set.
    pub async fn query(&mut self, cancel: &CancellationToken) -> Result<FileSet> {
        let project = load_and_validate(&self.project_path)?;

        let mut files = match &project.watch.list_cmd {
            Some(list_cmd) => self.run_list_command(&project, list_cmd, cancel).await?,
            None => self.walk_globs(&project).await?,
        };
        files.push(project.path.clone());

        let files = FileSet::new(files);
        info!(
            project = %self.project_path.display(),
            files = files.len(),
            "computed file set"
        );
        Ok(files)
    }

    async fn run_list_command(
        &mut self,
        project: &ProjectFile,
        list_cmd: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        let diagnostic = Regex::new(project.diagnostic_pattern())
            .map_err(|e| anyhow!("invalid diagnostic_pattern: {e}"))?;
        let sink = Arc::new(QueryOutput {
            lines: Mutex::new(Vec::new()),
            diagnostic,
            reporter: Arc::clone(&self.reporter),
        });

        let spec = ProcessSpec::from_command_line(list_cmd, project.directory())
            .ok_or_else(|| WatchrunError::ConfigError("[watch].list_cmd is empty".to_string()))?
            .with_output(sink.clone());

        debug!(cmd = ?list_cmd, "running file list command");
        let code = self.runner.run(&spec, cancel).await?;
        let lines = sink.lines();

        if code != 0 {
            return Err(WatchrunError::FileSetQuery {
                project: project.path.clone(),
                code,
                output: lines.into_iter().map(|l| l.text).collect(),
            });
        }

        Ok(lines
            .into_iter()
            .filter(|l| l.stream == OutputStream::Stdout)
            .map(|l| l.text.trim().to_string())
            .filter(|l| !l.is_empty())
            .map(|l| resolve_listed_path(project.directory(), &l))
            .collect())
    }

    async fn walk_globs(&self, project: &ProjectFile) -> Result<Vec<PathBuf>> {
        let patterns = PathPatterns::new(&project.watch.include, &project.watch.exclude)?;
        let root = project.directory().to_path_buf();
        let fs = Arc::clone(&self.fs);

        let files = tokio::task::spawn_blocking(move || {
            collect_matching_files(fs.as_ref(), &root, &patterns)
        })
        .await
        .context("file walk task failed")??;

        Ok(files)
    }
}

impl FileSetProvider for ProjectFileSetProvider {
    fn create<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<FileSet>> + Send + 'a>> {
        Box::pin(self.query(cancel))
    }
}

fn resolve_listed_path(directory: &Path, line: &str) -> PathBuf {
    let path = Path::new(line);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        directory.join(path)
    }
}
