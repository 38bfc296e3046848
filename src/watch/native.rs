// src/watch/native.rs

use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{Result, WatchrunError};
use crate::watch::path_utils::{watch_roots, PathIndex};
use crate::watch::WatchEvent;

/// Keeps the OS watcher alive. Dropping it unregisters every watch.
pub(crate) struct NativeBackend {
    _inner: RecommendedWatcher,
}

/// Register native watches for the files in `index` and forward every
/// relevant changed path, and every backend error, into `tx`.
pub(crate) fn start(
    index: Arc<PathIndex>,
    tx: mpsc::UnboundedSender<WatchEvent>,
) -> Result<NativeBackend> {
    let callback_index = Arc::clone(&index);

    // Called synchronously on notify's own thread.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => forward_event(&callback_index, &tx, event),
            Err(err) => {
                warn!(error = %err, "file watch error");
                let _ = tx.send(Err(WatchrunError::Watch(err)));
            }
        },
        Config::default(),
    )?;

    let roots = watch_roots(index.files());
    for (dir, mode) in &roots {
        watcher.watch(dir, *mode)?;
    }

    info!(
        files = index.files().len(),
        directories = roots.len(),
        "native file watcher started"
    );

    Ok(NativeBackend { _inner: watcher })
}

fn forward_event(index: &PathIndex, tx: &mpsc::UnboundedSender<WatchEvent>, event: Event) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }

    if event.need_rescan() {
        // Events were dropped by the OS; we cannot tell which file changed.
        if let Some(any) = index.files().sorted().first() {
            debug!("watcher asked for a rescan; reporting a change");
            let _ = tx.send(Ok((*any).clone()));
        }
        return;
    }

    for path in &event.paths {
        if let Some(watched) = index.resolve(path) {
            debug!(path = ?watched, kind = ?event.kind, "relevant file event");
            // The receiver is gone once the FileSetWatcher was dropped.
            let _ = tx.send(Ok(watched));
        }
    }
}
