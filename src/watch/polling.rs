// src/watch/polling.rs

//! Stat-based polling backend.
//!
//! Used where native notification is unreliable (network shares, some
//! containers and VMs). Every `interval` it stats each watched file and
//! reports those whose modification time, size or existence changed. A scan
//! that cannot stat the files is sent to the watcher as an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{Result, WatchrunError};
use crate::fileset::FileSet;
use crate::fs::{FileStamp, FileSystem};
use crate::watch::WatchEvent;

/// Last observed state of every watched file; `None` means "missing".
pub type Snapshot = HashMap<PathBuf, Option<FileStamp>>;

pub fn take_snapshot(fs: &dyn FileSystem, files: &FileSet) -> anyhow::Result<Snapshot> {
    files
        .iter()
        .map(|path| Ok((path.clone(), fs.stamp(path)?)))
        .collect()
}

/// Paths whose stamp differs between `old` and `new`, sorted.
///
/// Paths present in only one snapshot count as changed.
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> Vec<PathBuf> {
    let mut changed: Vec<PathBuf> = new
        .iter()
        .filter(|(path, stamp)| old.get(*path) != Some(*stamp))
        .map(|(path, _)| path.clone())
        .collect();

    changed.extend(
        old.keys()
            .filter(|path| !new.contains_key(*path))
            .cloned(),
    );

    changed.sort();
    changed
}

/// Stops the polling task when dropped.
pub(crate) struct PollingBackend {
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl Drop for PollingBackend {
    fn drop(&mut self) {
        self.stop.cancel();
        self.task.abort();
    }
}

/// Start polling `files`.
///
/// The baseline snapshot is taken before this returns, so anything that
/// changes after construction is reported. A failing baseline scan fails
/// construction.
pub(crate) fn start(
    files: Arc<FileSet>,
    fs: Arc<dyn FileSystem>,
    interval: Duration,
    tx: mpsc::UnboundedSender<WatchEvent>,
) -> Result<PollingBackend> {
    let baseline = take_snapshot(fs.as_ref(), &files)
        .context("taking the baseline snapshot")
        .map_err(WatchrunError::PollScan)?;
    let stop = CancellationToken::new();
    let task_stop = stop.clone();

    info!(
        files = files.len(),
        interval_ms = interval.as_millis() as u64,
        "polling file watcher started"
    );

    let task = tokio::spawn(async move {
        let mut previous = baseline;

        loop {
            tokio::select! {
                _ = task_stop.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let scan_fs = Arc::clone(&fs);
            let scan_files = Arc::clone(&files);
            let scan = tokio::task::spawn_blocking(move || {
                take_snapshot(scan_fs.as_ref(), &scan_files)
            })
            .await
            .unwrap_or_else(|join| Err(anyhow!("scan task failed: {join}")));

            let current = match scan {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "polling scan failed");
                    // Keep the previous snapshot; the next good scan diffs against it.
                    if tx.send(Err(WatchrunError::PollScan(err))).is_err() {
                        return;
                    }
                    continue;
                }
            };

            for path in diff_snapshots(&previous, &current) {
                debug!(path = ?path, "polling detected change");
                if tx.send(Ok(path)).is_err() {
                    return;
                }
            }
            previous = current;
        }

        debug!("polling watcher stopped");
    });

    Ok(PollingBackend { stop, task })
}
