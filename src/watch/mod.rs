// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Turning a [`FileSet`](crate::fileset::FileSet) into backend watches
//!   (`notify` natively, or a stat poller).
//! - Filtering raw events down to members of the set.
//! - Debouncing bursts into a single reported change.
//! - Passing backend failures up to the caller instead of handling them.
//!
//! It does **not** know about processes or restarts; the watch loop decides
//! what a change means.

use std::path::PathBuf;

/// What a backend sends to its [`FileSetWatcher`]: a changed member of the
/// set, or a backend failure.
pub(crate) type WatchEvent = crate::errors::Result<PathBuf>;

mod native;
pub mod path_utils;
pub mod polling;
pub mod watcher;

pub use path_utils::{watch_roots, PathIndex};
pub use polling::{diff_snapshots, take_snapshot, Snapshot};
pub use watcher::{FileSetWatcher, WatcherOptions};
