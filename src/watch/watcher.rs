// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::{Result, WatchrunError};
use crate::fileset::FileSet;
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::WatchBackendKind;
use crate::watch::native::{self, NativeBackend};
use crate::watch::path_utils::PathIndex;
use crate::watch::polling::{self, PollingBackend};
use crate::watch::WatchEvent;

/// Knobs for a [`FileSetWatcher`].
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    pub backend: WatchBackendKind,
    /// Quiet period that ends a burst of changes.
    pub debounce: Duration,
    /// Upper bound on how long one burst may keep extending the quiet period.
    pub max_coalesce: Duration,
    /// Scan interval of the polling backend.
    pub poll_interval: Duration,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            backend: WatchBackendKind::Native,
            debounce: Duration::from_millis(100),
            max_coalesce: Duration::from_secs(2),
            poll_interval: Duration::from_millis(500),
        }
    }
}

enum Backend {
    Native(NativeBackend),
    Polling(PollingBackend),
}

/// Watches a fixed [`FileSet`] and hands out one changed path at a time.
///
/// Watching starts in the constructor. Dropping the watcher releases every
/// OS handle (native) or stops the scan task (polling).
pub struct FileSetWatcher {
    files: Arc<FileSet>,
    events: mpsc::UnboundedReceiver<WatchEvent>,
    /// First path of a burst that has not been handed out yet.
    pending: Option<PathBuf>,
    options: WatcherOptions,
    backend: Backend,
}

impl std::fmt::Debug for FileSetWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSetWatcher")
            .field("files", &self.files.len())
            .field("backend", &self.backend_kind())
            .field("pending", &self.pending)
            .finish()
    }
}

impl FileSetWatcher {
    pub fn new(files: FileSet, options: &WatcherOptions) -> Result<Self> {
        Self::with_fs(files, options, Arc::new(RealFileSystem))
    }

    /// Like [`FileSetWatcher::new`]; `fs` is what the polling backend stats.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn with_fs(
        files: FileSet,
        options: &WatcherOptions,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();
        let files = Arc::new(files);

        let backend = match options.backend {
            WatchBackendKind::Native => {
                let index = Arc::new(PathIndex::new(files.as_ref().clone()));
                Backend::Native(native::start(index, tx)?)
            }
            WatchBackendKind::Polling => Backend::Polling(polling::start(
                Arc::clone(&files),
                fs,
                options.poll_interval,
                tx,
            )?),
        };

        Ok(Self {
            files,
            events,
            pending: None,
            options: options.clone(),
            backend,
        })
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    pub fn backend_kind(&self) -> WatchBackendKind {
        match self.backend {
            Backend::Native(_) => WatchBackendKind::Native,
            Backend::Polling(_) => WatchBackendKind::Polling,
        }
    }

    /// Wait for the next change to a watched file and return its path.
    ///
    /// Further events arriving within the debounce window are folded into
    /// the same change. Returns [`WatchrunError::Cancelled`] once `cancel`
    /// fires; a change already observed at that point is kept and returned
    /// by the next call.
    ///
    /// A backend failure that arrives before any change is returned as is
    /// ([`WatchrunError::Watch`] or [`WatchrunError::PollScan`]); one that
    /// arrives during a burst is folded into the pending change.
    pub async fn changed_file(&mut self, cancel: &CancellationToken) -> Result<PathBuf> {
        let first = match self.pending.take() {
            Some(path) => path,
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WatchrunError::Cancelled),
                next = self.events.recv() => match next {
                    Some(Ok(path)) => path,
                    Some(Err(err)) => return Err(err),
                    None => return Err(WatchrunError::WatcherClosed),
                },
            },
        };
        self.pending = Some(first.clone());

        let deadline = Instant::now() + self.options.max_coalesce;
        let mut coalesced = 0usize;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WatchrunError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => break,
                next = self.events.recv() => match next {
                    Some(Ok(_)) => coalesced += 1,
                    Some(Err(err)) => {
                        debug!(error = %err, "backend error during a burst");
                        coalesced += 1;
                    }
                    None => break,
                },
                _ = tokio::time::sleep(self.options.debounce) => break,
            }
        }

        debug!(path = ?first, coalesced, "file change settled");
        self.pending = None;
        Ok(first)
    }
}
