// src/fileset/wait_on_error.rs

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::engine::reporter::{error_events, Reporter, StatusEvent};
use crate::errors::Result;
use crate::fileset::{FileSet, FileSetProvider};
use crate::watch::{FileSetWatcher, WatcherOptions};

/// Keeps the loop alive across a broken project.
///
/// When the inner provider fails, the error is reported, then the project
/// file is watched and the query retried after every change to it, until
/// it succeeds or the token is cancelled.
pub struct WaitOnError<P> {
    inner: P,
    project_path: PathBuf,
    reporter: Arc<dyn Reporter>,
    options: WatcherOptions,
}

impl<P: FileSetProvider> WaitOnError<P> {
    pub fn new(
        inner: P,
        project_path: impl Into<PathBuf>,
        reporter: Arc<dyn Reporter>,
        options: WatcherOptions,
    ) -> Self {
        Self {
            inner,
            project_path: project_path.into(),
            reporter,
            options,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    async fn create_or_wait(&mut self, cancel: &CancellationToken) -> Result<FileSet> {
        loop {
            let err = match self.inner.create(cancel).await {
                Ok(files) => return Ok(files),
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => err,
            };

            warn!(error = %err, "file set query failed; waiting for the project to change");
            for event in error_events(&err, false) {
                self.reporter.report(event);
            }
            self.reporter.report(StatusEvent::WaitingForFix);

            let mut watcher =
                FileSetWatcher::new(FileSet::new([self.project_path.clone()]), &self.options)?;
            let path = watcher.changed_file(cancel).await?;
            self.reporter.report(StatusEvent::FileChanged { path });
        }
    }
}

impl<P: FileSetProvider> FileSetProvider for WaitOnError<P> {
    fn create<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<FileSet>> + Send + 'a>> {
        Box::pin(self.create_or_wait(cancel))
    }
}
