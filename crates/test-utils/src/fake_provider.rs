use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use watchrun::errors::{Result, WatchrunError};
use watchrun::fileset::{FileSet, FileSetProvider};

/// A file-set provider that:
/// - hands out scripted results in order
/// - then repeats `fallback` forever, or blocks until cancelled if there is
///   none
/// - counts how often it was asked.
pub struct ScriptedFileSetProvider {
    script: VecDeque<Result<FileSet>>,
    fallback: Option<FileSet>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFileSetProvider {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            fallback: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always return `files`.
    pub fn always(files: FileSet) -> Self {
        Self::new().then_always(files)
    }

    pub fn then_ok(mut self, files: FileSet) -> Self {
        self.script.push_back(Ok(files));
        self
    }

    pub fn then_err(mut self, err: WatchrunError) -> Self {
        self.script.push_back(Err(err));
        self
    }

    pub fn then_always(mut self, files: FileSet) -> Self {
        self.fallback = Some(files);
        self
    }

    /// Shared call counter; stays valid after the provider moved into a task.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Default for ScriptedFileSetProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSetProvider for ScriptedFileSetProvider {
    fn create<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<FileSet>> + Send + 'a>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(call, scripted = self.script.len(), "fake file-set query");
        let next = self.script.pop_front();
        let fallback = self.fallback.clone();

        Box::pin(async move {
            if let Some(result) = next {
                return result;
            }
            match fallback {
                Some(files) => Ok(files),
                None => {
                    cancel.cancelled().await;
                    Err(WatchrunError::Cancelled)
                }
            }
        })
    }
}
